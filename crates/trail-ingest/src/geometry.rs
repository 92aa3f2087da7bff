//! Geometry utilities
//!
//! Pure functions over (longitude, latitude) sequences. Coordinates use
//! [`geo::Coord`] with `x = longitude` and `y = latitude` throughout the crate.

use crate::model::Coordinate;
use geo::{BoundingRect, Distance, HaversineMeasure, LineString, Point};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Mean Earth radius used for haversine distances
pub const EARTH_RADIUS_KM: f64 = 6371.0;

const HAVERSINE: HaversineMeasure = HaversineMeasure::new(EARTH_RADIUS_KM * 1000.0);

#[derive(Debug, Error, Clone, PartialEq)]
pub enum GeometryError {
    #[error("Insufficient geometry: {points} point(s), at least 2 required")]
    InsufficientGeometry { points: usize },
}

/// Great-circle distance between two points in kilometres
pub fn haversine_km(a: Coordinate, b: Coordinate) -> f64 {
    HAVERSINE.distance(Point::from(a), Point::from(b)) / 1000.0
}

/// Sum of haversine distances between consecutive points
///
/// Callers filter out short sequences before getting here; the error only
/// guards the invariant.
pub fn total_distance_km(coords: &[Coordinate]) -> Result<f64, GeometryError> {
    if coords.len() < 2 {
        return Err(GeometryError::InsufficientGeometry {
            points: coords.len(),
        });
    }

    Ok(coords.windows(2).map(|pair| haversine_km(pair[0], pair[1])).sum())
}

/// Cumulative elevation change along a track
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ElevationDelta {
    pub gain_m: f64,
    pub loss_m: f64,
}

/// Raw gain/loss over consecutive samples; `None` when there are no samples.
///
/// No smoothing is applied, so noisy GPS elevation over-counts both values.
pub fn elevation_delta(samples: &[f64]) -> Option<ElevationDelta> {
    if samples.is_empty() {
        return None;
    }

    let mut delta = ElevationDelta {
        gain_m: 0.0,
        loss_m: 0.0,
    };
    for pair in samples.windows(2) {
        let step = pair[1] - pair[0];
        if step > 0.0 {
            delta.gain_m += step;
        } else {
            delta.loss_m += -step;
        }
    }

    Some(delta)
}

/// Latitude/longitude envelope of the target corpus
///
/// Used to spot geometry that was stored as (lat, lon).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegionBounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl Default for RegionBounds {
    /// Spain, Balearic and Canary Islands included
    fn default() -> Self {
        Self {
            min_lat: 27.0,
            max_lat: 44.0,
            min_lon: -18.0,
            max_lon: 4.0,
        }
    }
}

impl RegionBounds {
    /// True when `first` looks like a latitude and `second` like a longitude
    pub fn looks_swapped(&self, first: f64, second: f64) -> bool {
        (self.min_lat..=self.max_lat).contains(&first)
            && (self.min_lon..=self.max_lon).contains(&second)
    }
}

/// [`RegionBounds::looks_swapped`] against the default Spanish envelope
pub fn looks_swapped(lon: f64, lat: f64) -> bool {
    RegionBounds::default().looks_swapped(lon, lat)
}

/// Only the exact (0, 0) "no GPS fix" sentinel is rejected; range is not checked.
pub fn is_valid_point(lon: f64, lat: f64) -> bool {
    !(lon == 0.0 && lat == 0.0)
}

/// Swap every coordinate when the first point looks transposed
///
/// Returns `None` when the sequence is already in (lon, lat) order.
pub fn swap_if_needed(coords: &[Coordinate], bounds: &RegionBounds) -> Option<Vec<Coordinate>> {
    let first = coords.first()?;
    if !bounds.looks_swapped(first.x, first.y) {
        return None;
    }

    Some(
        coords
            .iter()
            .map(|c| Coordinate { x: c.y, y: c.x })
            .collect(),
    )
}

/// Axis-aligned envelope of a coordinate sequence
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    /// `[min_lon, min_lat, max_lon, max_lat]`, the GeoJSON bbox order
    pub fn to_array(&self) -> [f64; 4] {
        [self.min_lon, self.min_lat, self.max_lon, self.max_lat]
    }
}

pub fn bounding_box(coords: &[Coordinate]) -> Option<BoundingBox> {
    let rect = LineString::from(coords.to_vec()).bounding_rect()?;
    Some(BoundingBox {
        min_lon: rect.min().x,
        min_lat: rect.min().y,
        max_lon: rect.max().x,
        max_lat: rect.max().y,
    })
}
