//! Shapefile vector-feature reader
//!
//! Layout: `<source dir>/<region>/<name>.shp` plus its `.dbf`/`.shx`
//! sidecars. Only the first `.shp` of a region (by name) is read, one feature
//! at a time; the `.shx` index is required.

use super::{children, file_name, has_extension, require_dir, walk_error, SourceOrigin};
use crate::error::{IngestError, Result};
use crate::extract::{parse_duration_min, parse_length_km, vector_feature_id};
use crate::model::{attr, Coordinate, RawTrailRecord, RecordContext};
use serde::{Deserialize, Serialize};
use shapefile::dbase::{self, FieldValue, Record};
use shapefile::{Shape, ShapeReader};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use trail_common::types::SourceKind;

/// DBF field names holding each known attribute
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldMapping {
    pub code: String,
    pub name: String,
    pub length: String,
    pub duration: String,
    pub edit_date: String,
    pub homologated: String,
    pub province: String,
}

impl Default for FieldMapping {
    fn default() -> Self {
        Self {
            code: "CODIGO".to_string(),
            name: "NOMBRE".to_string(),
            length: "LONGITUD".to_string(),
            duration: "DURACION".to_string(),
            edit_date: "FEC_EDIC".to_string(),
            homologated: "HOMOLOGADO".to_string(),
            province: "PROVINCIA".to_string(),
        }
    }
}

impl FieldMapping {
    /// (attribute key, DBF field name)
    fn pairs(&self) -> [(&'static str, &str); 7] {
        [
            (attr::CODE, self.code.as_str()),
            (attr::NAME, self.name.as_str()),
            (attr::LENGTH, self.length.as_str()),
            (attr::DURATION, self.duration.as_str()),
            (attr::EDIT_DATE, self.edit_date.as_str()),
            (attr::HOMOLOGATED, self.homologated.as_str()),
            (attr::PROVINCE, self.province.as_str()),
        ]
    }
}

pub struct VectorFeatureReader {
    origin: SourceOrigin,
    dir: PathBuf,
    mapping: FieldMapping,
}

impl VectorFeatureReader {
    pub fn new(origin: SourceOrigin, dir: impl Into<PathBuf>, mapping: FieldMapping) -> Self {
        Self {
            origin,
            dir: dir.into(),
            mapping,
        }
    }

    /// Start a fresh pass over the source directory
    pub fn records(&self) -> Result<VectorFeatureRecords> {
        require_dir(&self.origin.source_name, &self.dir)?;

        Ok(VectorFeatureRecords {
            origin: self.origin.clone(),
            mapping: self.mapping.clone(),
            regions: children(&self.dir),
            current: None,
            pending: None,
        })
    }
}

/// Lazy iterator over the features of every regional network
pub struct VectorFeatureRecords {
    origin: SourceOrigin,
    mapping: FieldMapping,
    regions: walkdir::IntoIter,
    current: Option<OpenShapefile>,
    /// Open failure of the region just entered
    pending: Option<IngestError>,
}

impl Iterator for VectorFeatureRecords {
    type Item = Result<RawTrailRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(error) = self.pending.take() {
                return Some(Err(error));
            }

            if let Some(open) = self.current.as_mut() {
                match open.next_feature(&self.origin, &self.mapping) {
                    Some(item) => return Some(item),
                    None => {
                        debug!(file = %open.file, features = open.count, "Read shapefile");
                        self.current = None;
                    }
                }
                continue;
            }

            match self.regions.next()? {
                Ok(entry) if entry.file_type().is_dir() => {
                    let region = file_name(entry.path());
                    match primary_file(entry.path()) {
                        Some(shp) => match OpenShapefile::open(&self.origin, &region, &shp) {
                            Ok(open) => self.current = Some(open),
                            Err(e) => self.pending = Some(e),
                        },
                        None => warn!(
                            source = %self.origin.source_name,
                            region = %region,
                            "No .shp file found, skipping region"
                        ),
                    }
                }
                Ok(entry) => {
                    debug!(path = %entry.path().display(), "Ignoring non-directory entry");
                }
                Err(e) => return Some(Err(walk_error(&self.origin, "", e))),
            }
        }
    }
}

/// First `.shp` of a directory in name order
fn primary_file(dir: &Path) -> Option<PathBuf> {
    children(dir)
        .filter_map(|entry| {
            entry
                .map_err(|e| warn!(dir = %dir.display(), error = %e, "Error accessing entry"))
                .ok()
        })
        .find(|entry| entry.file_type().is_file() && has_extension(entry.path(), "shp"))
        .map(|entry| entry.into_path())
}

/// One shapefile being read feature by feature
///
/// Shapes are located through the `.shx` index and attribute rows by seeking
/// the `.dbf`, so only the current feature is held in memory.
struct OpenShapefile {
    region: String,
    file: String,
    shapes: ShapeReader<BufReader<File>>,
    table: dbase::Reader<BufReader<File>>,
    count: usize,
    next: usize,
}

impl OpenShapefile {
    fn open(origin: &SourceOrigin, region: &str, path: &Path) -> Result<Self> {
        let file = file_name(path);
        let fail = |message: String| IngestError::record(origin.context(region, &file, 0), message);

        let shapes = ShapeReader::from_path(path)
            .map_err(|e| fail(format!("failed to open shapefile: {}", e)))?;
        let count = shapes
            .shape_count()
            .map_err(|e| fail(format!("cannot index shapes: {}", e)))?;
        let table = dbase::Reader::from_path(path.with_extension("dbf"))
            .map_err(|e| fail(format!("failed to open attribute table: {}", e)))?;

        debug!(file = %file, features = count, "Opened shapefile");
        Ok(Self {
            region: region.to_string(),
            file,
            shapes,
            table,
            count,
            next: 0,
        })
    }

    /// Decode the next feature; `None` once every indexed shape was visited
    fn next_feature(
        &mut self,
        origin: &SourceOrigin,
        mapping: &FieldMapping,
    ) -> Option<Result<RawTrailRecord>> {
        if self.next >= self.count {
            return None;
        }
        let index = self.next;
        self.next += 1;

        let context = origin.context(&self.region, &self.file, index);
        Some(
            self.read_feature(index)
                .and_then(|(shape, record)| {
                    let geometry = FeatureGeometry::from_shape(&shape)?;
                    if geometry.part_count > 1 {
                        debug!(%context, parts = geometry.part_count, "Using first part only");
                    }
                    Ok(to_raw_record(
                        origin,
                        context.clone(),
                        geometry,
                        feature_attributes(&record, mapping),
                    ))
                })
                .map_err(|message| IngestError::record(context, message)),
        )
    }

    fn read_feature(&mut self, index: usize) -> std::result::Result<(Shape, Record), String> {
        let shape = match self.shapes.read_nth_shape(index) {
            Some(Ok(shape)) => shape,
            Some(Err(e)) => return Err(format!("feature decode error: {}", e)),
            None => return Err("feature missing from shape index".to_string()),
        };

        self.table
            .seek(index)
            .map_err(|e| format!("attribute seek error: {}", e))?;
        match self.table.iter_records().next() {
            Some(Ok(record)) => Ok((shape, record)),
            Some(Err(e)) => Err(format!("attribute decode error: {}", e)),
            None => Err("feature has no attribute row".to_string()),
        }
    }
}

/// Line geometry of one feature
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureGeometry {
    /// Points of the first part
    pub coordinates: Vec<Coordinate>,
    /// Z values of the first part, when any is non-zero
    pub elevations: Option<Vec<f64>>,
    pub part_count: usize,
}

impl FeatureGeometry {
    pub fn from_shape(shape: &Shape) -> std::result::Result<Self, String> {
        match shape {
            Shape::Polyline(line) => {
                let part = first_part(line.parts())?;
                Ok(Self {
                    coordinates: part.iter().map(|p| Coordinate { x: p.x, y: p.y }).collect(),
                    elevations: None,
                    part_count: line.parts().len(),
                })
            }
            Shape::PolylineM(line) => {
                let part = first_part(line.parts())?;
                Ok(Self {
                    coordinates: part.iter().map(|p| Coordinate { x: p.x, y: p.y }).collect(),
                    elevations: None,
                    part_count: line.parts().len(),
                })
            }
            Shape::PolylineZ(line) => {
                let part = first_part(line.parts())?;
                let z: Vec<f64> = part.iter().map(|p| p.z).collect();
                Ok(Self {
                    coordinates: part.iter().map(|p| Coordinate { x: p.x, y: p.y }).collect(),
                    elevations: z.iter().any(|v| *v != 0.0).then_some(z),
                    part_count: line.parts().len(),
                })
            }
            Shape::NullShape => Err("feature has no geometry".to_string()),
            other => Err(format!("unsupported shape type {:?}", other.shapetype())),
        }
    }
}

fn first_part<P>(parts: &[Vec<P>]) -> std::result::Result<&[P], String> {
    parts
        .first()
        .map(Vec::as_slice)
        .ok_or_else(|| "polyline has no parts".to_string())
}

/// Stringify the mapped DBF fields; missing and null fields are left out
pub fn feature_attributes(record: &Record, mapping: &FieldMapping) -> BTreeMap<String, String> {
    mapping
        .pairs()
        .into_iter()
        .filter_map(|(key, field)| {
            record
                .get(field)
                .and_then(field_to_string)
                .map(|value| (key.to_string(), value))
        })
        .collect()
}

pub fn field_to_string(value: &FieldValue) -> Option<String> {
    let text = match value {
        FieldValue::Character(text) => text.clone()?,
        FieldValue::Numeric(number) => (*number)?.to_string(),
        FieldValue::Float(number) => (*number)?.to_string(),
        FieldValue::Integer(number) => number.to_string(),
        FieldValue::Double(number) => number.to_string(),
        FieldValue::Logical(flag) => (*flag)?.to_string(),
        FieldValue::Date(date) => {
            let date = date.as_ref()?;
            format!("{:04}{:02}{:02}", date.year(), date.month(), date.day())
        }
        _ => return None,
    };

    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

/// Assemble a raw record from decoded geometry and attributes
pub fn to_raw_record(
    origin: &SourceOrigin,
    context: RecordContext,
    geometry: FeatureGeometry,
    mut attributes: BTreeMap<String, String>,
) -> RawTrailRecord {
    attributes.insert(attr::SOURCE_FILE.to_string(), context.file.clone());

    RawTrailRecord {
        external_id: vector_feature_id(
            origin.provider,
            attributes.get(attr::CODE).map(String::as_str),
        ),
        declared_length_km: attributes.get(attr::LENGTH).and_then(|v| parse_length_km(v)),
        declared_duration_min: attributes.get(attr::DURATION).and_then(|v| parse_duration_min(v)),
        coordinates: geometry.coordinates,
        elevations: geometry.elevations,
        attributes,
        kind: SourceKind::VectorFeature,
        provider: origin.provider,
        category: origin.category,
        context,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shapefile::{Point, PointZ, Polyline, PolylineZ};
    use std::collections::HashMap;
    use std::fs;
    use tempfile::TempDir;
    use trail_common::types::{Provider, RouteCategory};

    fn origin() -> SourceOrigin {
        SourceOrigin {
            source_name: "senderos_pr".into(),
            provider: Provider::Fedme,
            category: RouteCategory::ShortDistance,
        }
    }

    fn context() -> RecordContext {
        origin().context("avila", "pr_avila.shp", 4)
    }

    #[test]
    fn test_multi_part_uses_first_part() {
        let shape = Shape::Polyline(Polyline::with_parts(vec![
            vec![Point::new(0.0, 0.0), Point::new(0.0, 0.01)],
            vec![Point::new(1.0, 1.0), Point::new(1.0, 2.0)],
        ]));
        let geometry = FeatureGeometry::from_shape(&shape).unwrap();

        assert_eq!(geometry.part_count, 2);
        assert_eq!(
            geometry.coordinates,
            vec![Coordinate { x: 0.0, y: 0.0 }, Coordinate { x: 0.0, y: 0.01 }]
        );
        assert_eq!(geometry.elevations, None);
    }

    #[test]
    fn test_polyline_z_elevations() {
        let with_z = Shape::PolylineZ(PolylineZ::new(vec![
            PointZ::new(-4.7, 40.6, 1100.0, 0.0),
            PointZ::new(-4.6, 40.7, 1250.0, 0.0),
        ]));
        let geometry = FeatureGeometry::from_shape(&with_z).unwrap();
        assert_eq!(geometry.elevations, Some(vec![1100.0, 1250.0]));

        let flat = Shape::PolylineZ(PolylineZ::new(vec![
            PointZ::new(-4.7, 40.6, 0.0, 0.0),
            PointZ::new(-4.6, 40.7, 0.0, 0.0),
        ]));
        assert_eq!(FeatureGeometry::from_shape(&flat).unwrap().elevations, None);
    }

    #[test]
    fn test_non_line_shapes_are_rejected() {
        assert!(FeatureGeometry::from_shape(&Shape::NullShape).is_err());
        assert!(FeatureGeometry::from_shape(&Shape::Point(Point::new(1.0, 2.0))).is_err());
    }

    #[test]
    fn test_field_to_string() {
        assert_eq!(
            field_to_string(&FieldValue::Character(Some(" PR-AV 12 ".into()))),
            Some("PR-AV 12".to_string())
        );
        assert_eq!(field_to_string(&FieldValue::Character(Some("  ".into()))), None);
        assert_eq!(field_to_string(&FieldValue::Character(None)), None);
        assert_eq!(field_to_string(&FieldValue::Numeric(Some(12.5))), Some("12.5".to_string()));
        assert_eq!(field_to_string(&FieldValue::Numeric(None)), None);
        assert_eq!(field_to_string(&FieldValue::Integer(7)), Some("7".to_string()));
        assert_eq!(field_to_string(&FieldValue::Logical(Some(true))), Some("true".to_string()));
    }

    #[test]
    fn test_to_raw_record_uses_declared_values() {
        let geometry = FeatureGeometry {
            coordinates: vec![Coordinate { x: -4.7, y: 40.6 }, Coordinate { x: -4.6, y: 40.7 }],
            elevations: None,
            part_count: 1,
        };
        let attributes = BTreeMap::from([
            (attr::CODE.to_string(), "PR-AV 12".to_string()),
            (attr::LENGTH.to_string(), "12,5".to_string()),
            (attr::DURATION.to_string(), "4:30".to_string()),
        ]);

        let raw = to_raw_record(&origin(), context(), geometry, attributes);
        assert_eq!(raw.external_id, "PR-AV 12");
        assert_eq!(raw.declared_length_km, Some(12.5));
        assert_eq!(raw.declared_duration_min, Some(270));
        assert_eq!(raw.attribute(attr::SOURCE_FILE), Some("pr_avila.shp"));
        assert_eq!(raw.kind, SourceKind::VectorFeature);
        assert_eq!(raw.context.index, 4);
    }

    #[test]
    fn test_to_raw_record_without_code_gets_fallback_id() {
        let geometry = FeatureGeometry {
            coordinates: vec![Coordinate { x: -4.7, y: 40.6 }, Coordinate { x: -4.6, y: 40.7 }],
            elevations: None,
            part_count: 1,
        };
        let raw = to_raw_record(&origin(), context(), geometry, BTreeMap::new());
        assert!(raw.external_id.starts_with("fedme-"));
        assert_eq!(raw.declared_length_km, None);
    }

    /// (code, name, length) rows of the attribute table
    type Row<'a> = (&'a str, &'a str, &'a str);

    fn write_network(path: &Path, features: &[(Polyline, Row)]) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        let table = dbase::TableWriterBuilder::new()
            .add_character_field("CODIGO".try_into().unwrap(), 20)
            .add_character_field("NOMBRE".try_into().unwrap(), 80)
            .add_character_field("LONGITUD".try_into().unwrap(), 10);

        let mut writer = shapefile::Writer::from_path(path, table).unwrap();
        for (line, (code, name, length)) in features {
            let record = Record::from(HashMap::from([
                ("CODIGO".to_string(), FieldValue::Character(Some(code.to_string()))),
                ("NOMBRE".to_string(), FieldValue::Character(Some(name.to_string()))),
                ("LONGITUD".to_string(), FieldValue::Character(Some(length.to_string()))),
            ]));
            writer.write_shape_and_record(line, &record).unwrap();
        }
    }

    /// Rewrite the shape type of one record to NullShape (0)
    fn null_out_shape(shp: &Path, index: usize) {
        let shx = fs::read(shp.with_extension("shx")).unwrap();
        let entry = 100 + index * 8;
        let words = i32::from_be_bytes(shx[entry..entry + 4].try_into().unwrap());
        let offset = words as usize * 2;

        let mut bytes = fs::read(shp).unwrap();
        bytes[offset + 8..offset + 12].copy_from_slice(&0i32.to_le_bytes());
        fs::write(shp, bytes).unwrap();
    }

    fn line(points: &[(f64, f64)]) -> Polyline {
        Polyline::new(points.iter().map(|(x, y)| Point::new(*x, *y)).collect())
    }

    #[test]
    fn test_reads_every_feature_with_mapped_fields() {
        let root = TempDir::new().unwrap();
        let shp = root.path().join("avila").join("a_pr_avila.shp");
        write_network(
            &shp,
            &[
                (line(&[(-4.70, 40.60), (-4.70, 40.61)]), ("PR-AV 12", "Cerro Gorria", "12,5")),
                (line(&[(-5.10, 40.30), (-5.10, 40.31)]), ("PR-AV 13", "Garganta", "")),
                (line(&[(-5.20, 40.20), (-5.20, 40.21)]), ("PR-AV 14", "Pinar", "3.4")),
            ],
        );
        // Only the first .shp of a region is read
        write_network(
            &root.path().join("avila").join("b_extra.shp"),
            &[(line(&[(-4.0, 40.0), (-4.0, 40.1)]), ("PR-AV 99", "Otra", ""))],
        );

        let reader = VectorFeatureReader::new(origin(), root.path(), FieldMapping::default());
        let records: Vec<_> = reader.records().unwrap().collect::<Result<_>>().unwrap();

        let ids: Vec<_> = records.iter().map(|r| r.external_id.as_str()).collect();
        assert_eq!(ids, ["PR-AV 12", "PR-AV 13", "PR-AV 14"]);
        assert_eq!(records[0].attribute(attr::NAME), Some("Cerro Gorria"));
        assert_eq!(records[0].declared_length_km, Some(12.5));
        assert_eq!(records[1].declared_length_km, None);
        assert_eq!(records[2].declared_length_km, Some(3.4));
        assert_eq!(records[2].context.index, 2);
        assert_eq!(records[2].attribute(attr::SOURCE_FILE), Some("a_pr_avila.shp"));
    }

    #[test]
    fn test_bad_feature_does_not_stop_the_file() {
        let root = TempDir::new().unwrap();
        let shp = root.path().join("segovia").join("pr_segovia.shp");
        write_network(
            &shp,
            &[
                (line(&[(-4.0, 41.0), (-4.0, 41.01)]), ("PR-SG 1", "Uno", "")),
                (line(&[(-4.1, 41.0), (-4.1, 41.01)]), ("PR-SG 2", "Dos", "")),
                (line(&[(-4.2, 41.0), (-4.2, 41.01)]), ("PR-SG 3", "Tres", "")),
            ],
        );
        null_out_shape(&shp, 1);

        let reader = VectorFeatureReader::new(origin(), root.path(), FieldMapping::default());
        let items: Vec<_> = reader.records().unwrap().collect();

        assert_eq!(items.len(), 3);
        assert_eq!(items[0].as_ref().unwrap().external_id, "PR-SG 1");
        match &items[1] {
            Err(IngestError::Record { context, message }) => {
                assert_eq!(context.index, 1);
                assert!(message.contains("no geometry"), "{}", message);
            }
            other => panic!("expected record error, got {:?}", other),
        }
        assert_eq!(items[2].as_ref().unwrap().external_id, "PR-SG 3");
    }

    #[test]
    fn test_custom_field_mapping() {
        let root = TempDir::new().unwrap();
        write_network(
            &root.path().join("leon").join("gr.shp"),
            &[(line(&[(-5.5, 42.6), (-5.6, 42.7)]), ("GR 1", "Sendero Historico", "8"))],
        );
        let mapping = FieldMapping {
            code: "NOMBRE".to_string(),
            name: "CODIGO".to_string(),
            length: "MISSING".to_string(),
            ..Default::default()
        };

        let reader = VectorFeatureReader::new(origin(), root.path(), mapping);
        let records: Vec<_> = reader.records().unwrap().collect::<Result<_>>().unwrap();

        assert_eq!(records[0].external_id, "Sendero Historico");
        assert_eq!(records[0].attribute(attr::NAME), Some("GR 1"));
        assert_eq!(records[0].declared_length_km, None);
    }

    #[test]
    fn test_region_without_shp_is_skipped() {
        let root = TempDir::new().unwrap();
        fs::create_dir_all(root.path().join("avila")).unwrap();
        fs::write(root.path().join("avila").join("readme.txt"), "no data").unwrap();

        let reader = VectorFeatureReader::new(origin(), root.path(), FieldMapping::default());
        assert_eq!(reader.records().unwrap().count(), 0);
    }

    #[test]
    fn test_unreadable_shapefile_is_record_error() {
        let root = TempDir::new().unwrap();
        fs::create_dir_all(root.path().join("leon")).unwrap();
        fs::write(root.path().join("leon").join("pr_leon.shp"), b"garbage").unwrap();

        let reader = VectorFeatureReader::new(origin(), root.path(), FieldMapping::default());
        let items: Vec<_> = reader.records().unwrap().collect();
        assert_eq!(items.len(), 1);
        assert!(matches!(&items[0], Err(IngestError::Record { .. })));
    }
}
