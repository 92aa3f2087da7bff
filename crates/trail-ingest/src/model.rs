//! Raw and canonical route records

use chrono::NaiveDate;
use serde_json::json;
use std::collections::BTreeMap;
use trail_common::types::{Difficulty, Provider, RouteCategory, SourceKind};

/// A (longitude, latitude) pair; `x` is always longitude
pub type Coordinate = geo::Coord<f64>;

/// Well-known keys of [`RawTrailRecord::attributes`]
pub mod attr {
    pub const NAME: &str = "name";
    pub const CODE: &str = "code";
    pub const EDIT_DATE: &str = "edit_date";
    pub const HOMOLOGATED: &str = "homologated";
    pub const PROVINCE: &str = "province";
    pub const LENGTH: &str = "length";
    pub const DURATION: &str = "duration";
    pub const SOURCE_FILE: &str = "source_file";
}

/// Where a raw record came from, for logs and error reports
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordContext {
    pub source_name: String,
    /// Park or regional network subdirectory
    pub area: String,
    pub file: String,
    /// Track index within the file, or feature index within the shapefile
    pub index: usize,
}

impl std::fmt::Display for RecordContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}#{}", self.source_name, self.area, self.file, self.index)
    }
}

/// One track or one vector feature before canonicalization
#[derive(Debug, Clone, PartialEq)]
pub struct RawTrailRecord {
    pub external_id: String,
    pub coordinates: Vec<Coordinate>,
    /// Only samples that were actually present; `None` when the source had none
    pub elevations: Option<Vec<f64>>,
    pub attributes: BTreeMap<String, String>,
    pub kind: SourceKind,
    pub provider: Provider,
    /// Category of the source; federation codes may refine it
    pub category: RouteCategory,
    pub declared_length_km: Option<f64>,
    pub declared_duration_min: Option<i32>,
    pub context: RecordContext,
}

impl RawTrailRecord {
    /// Non-empty attribute value
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .get(key)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
    }
}

/// The persisted hiking route
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalRoute {
    pub external_id: String,
    pub code: String,
    pub name: String,
    pub category: RouteCategory,
    pub provider: Provider,
    pub distance_km: f64,
    pub duration_min: i32,
    pub geometry: Vec<Coordinate>,
    pub elevation_samples: Option<Vec<f64>>,
    pub elevation_gain_m: Option<f64>,
    pub elevation_loss_m: Option<f64>,
    pub region: String,
    pub province: Option<String>,
    pub edit_date: Option<NaiveDate>,
    pub extra_info: serde_json::Value,
    pub difficulty: Difficulty,
    pub cover_image_ref: String,
}

impl CanonicalRoute {
    /// Geometry as a GeoJSON `LineString`
    pub fn geometry_geojson(&self) -> serde_json::Value {
        linestring_geojson(&self.geometry)
    }
}

pub fn linestring_geojson(coords: &[Coordinate]) -> serde_json::Value {
    let coordinates: Vec<[f64; 2]> = coords.iter().map(|c| [c.x, c.y]).collect();
    json!({ "type": "LineString", "coordinates": coordinates })
}

/// Inverse of [`linestring_geojson`]; `None` for anything but a LineString
pub fn coordinates_from_geojson(value: &serde_json::Value) -> Option<Vec<Coordinate>> {
    if value.get("type")?.as_str()? != "LineString" {
        return None;
    }

    value
        .get("coordinates")?
        .as_array()?
        .iter()
        .map(|pair| {
            let pair = pair.as_array()?;
            Some(Coordinate {
                x: pair.first()?.as_f64()?,
                y: pair.get(1)?.as_f64()?,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geojson_keeps_lon_lat_order() {
        let coords = vec![
            Coordinate { x: -3.7, y: 40.4 },
            Coordinate { x: -3.6, y: 40.5 },
        ];
        let value = linestring_geojson(&coords);
        assert_eq!(value["coordinates"][0][0], -3.7);
        assert_eq!(value["coordinates"][0][1], 40.4);
        assert_eq!(coordinates_from_geojson(&value), Some(coords));
    }

    #[test]
    fn test_geojson_rejects_other_geometries() {
        let point = json!({ "type": "Point", "coordinates": [1.0, 2.0] });
        assert_eq!(coordinates_from_geojson(&point), None);

        let broken = json!({ "type": "LineString", "coordinates": [[1.0]] });
        assert_eq!(coordinates_from_geojson(&broken), None);
    }

    #[test]
    fn test_record_context_display() {
        let context = RecordContext {
            source_name: "parques_nacionales".into(),
            area: "Teide".into(),
            file: "sendero_4.gpx".into(),
            index: 2,
        };
        assert_eq!(context.to_string(), "parques_nacionales/Teide/sendero_4.gpx#2");
    }
}
