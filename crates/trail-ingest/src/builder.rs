//! Canonical route construction
//!
//! Combines geometry, derived metrics and extracted metadata into a
//! [`CanonicalRoute`], or declines the record when no usable geometry or
//! distance can be recovered.

use crate::extract::RouteMetadata;
use crate::geometry::{bounding_box, elevation_delta, is_valid_point, total_distance_km};
use crate::model::{attr, CanonicalRoute, RawTrailRecord};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use trail_common::types::{Difficulty, RouteCategory};

/// Why a raw record could not become a route
#[derive(Debug, Error, Clone, PartialEq)]
pub enum BuildDecline {
    #[error("insufficient geometry: {valid_points} valid point(s)")]
    InsufficientGeometry { valid_points: usize },

    #[error("invalid distance: {distance_km} km")]
    InvalidDistance { distance_km: f64 },
}

/// Distance/gain thresholds for the three difficulty levels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassificationPolicy {
    pub easy_max_km: f64,
    pub easy_max_gain_m: f64,
    pub hard_min_km: f64,
    pub hard_min_gain_m: f64,
}

impl Default for ClassificationPolicy {
    fn default() -> Self {
        Self {
            easy_max_km: 10.0,
            easy_max_gain_m: 400.0,
            hard_min_km: 20.0,
            hard_min_gain_m: 1000.0,
        }
    }
}

impl ClassificationPolicy {
    /// Unknown gain counts as flat
    pub fn classify(&self, distance_km: f64, gain_m: Option<f64>) -> Difficulty {
        let gain = gain_m.unwrap_or(0.0);
        if distance_km > self.hard_min_km || gain >= self.hard_min_gain_m {
            Difficulty::Hard
        } else if distance_km <= self.easy_max_km && gain < self.easy_max_gain_m {
            Difficulty::Easy
        } else {
            Difficulty::Moderate
        }
    }
}

/// Walking-time estimate used when a source declares no duration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DurationPolicy {
    pub walking_speed_kmh: f64,
    pub minutes_per_100m_gain: f64,
}

impl Default for DurationPolicy {
    fn default() -> Self {
        Self {
            walking_speed_kmh: 3.0,
            minutes_per_100m_gain: 10.0,
        }
    }
}

impl DurationPolicy {
    /// Reject speeds that would make every estimate zero or unbounded
    pub fn validate(&self) -> Result<(), String> {
        if !self.walking_speed_kmh.is_finite() || self.walking_speed_kmh <= 0.0 {
            return Err(format!(
                "walking_speed_kmh must be greater than 0, got {}",
                self.walking_speed_kmh
            ));
        }
        if !self.minutes_per_100m_gain.is_finite() || self.minutes_per_100m_gain < 0.0 {
            return Err(format!(
                "minutes_per_100m_gain cannot be negative, got {}",
                self.minutes_per_100m_gain
            ));
        }
        Ok(())
    }

    pub fn estimate_min(&self, distance_km: f64, gain_m: Option<f64>) -> i32 {
        let walking = distance_km / self.walking_speed_kmh * 60.0;
        let climbing = gain_m.unwrap_or(0.0) / 100.0 * self.minutes_per_100m_gain;
        (walking + climbing).round().clamp(0.0, f64::from(i32::MAX)) as i32
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuilderDefaults {
    pub region: String,
    pub cover_image: String,
}

impl Default for BuilderDefaults {
    fn default() -> Self {
        Self {
            region: "Spain".to_string(),
            cover_image: "default-route-cover.jpg".to_string(),
        }
    }
}

/// Immutable builder configuration
#[derive(Debug, Clone, Default)]
pub struct RouteBuilder {
    pub classification: ClassificationPolicy,
    pub duration: DurationPolicy,
    pub defaults: BuilderDefaults,
}

impl RouteBuilder {
    pub fn new(
        classification: ClassificationPolicy,
        duration: DurationPolicy,
        defaults: BuilderDefaults,
    ) -> Self {
        Self {
            classification,
            duration,
            defaults,
        }
    }

    pub fn build(
        &self,
        raw: RawTrailRecord,
        meta: RouteMetadata,
    ) -> Result<CanonicalRoute, BuildDecline> {
        let valid_points = raw
            .coordinates
            .iter()
            .filter(|c| is_valid_point(c.x, c.y))
            .count();
        if valid_points < 2 {
            return Err(BuildDecline::InsufficientGeometry { valid_points });
        }

        let source_file = raw
            .attribute(attr::SOURCE_FILE)
            .unwrap_or(&raw.context.file)
            .to_string();
        // Coordinate order is taken as given; see `correction::fix_swapped`
        let geometry = raw.coordinates;

        let distance_km = match raw.declared_length_km {
            Some(declared) => declared,
            None => total_distance_km(&geometry).map_err(|_| BuildDecline::InsufficientGeometry {
                valid_points,
            })?,
        };
        // Rounded first: the stored distance must stay positive
        let distance_km = round_to(distance_km, 2);
        if !distance_km.is_finite() || distance_km <= 0.0 {
            return Err(BuildDecline::InvalidDistance { distance_km });
        }

        let delta = raw.elevations.as_deref().and_then(elevation_delta);
        let gain_m = delta.map(|d| round_to(d.gain_m, 1));
        let loss_m = delta.map(|d| round_to(d.loss_m, 1));

        let duration_min = raw
            .declared_duration_min
            .filter(|minutes| *minutes > 0)
            .unwrap_or_else(|| self.duration.estimate_min(distance_km, gain_m));

        let extra_info = match meta.category {
            RouteCategory::NationalParkTrail => json!({
                "park": raw.context.area,
                "bbox": bounding_box(&geometry).map(|bbox| bbox.to_array()),
                "source_file": source_file,
            }),
            RouteCategory::LongDistance | RouteCategory::ShortDistance | RouteCategory::Local => {
                json!({
                    "catalog_number": meta.parsed_code.catalog_number,
                    "homologated": meta.homologated.unwrap_or(false),
                    "network": meta
                        .parsed_code
                        .network
                        .as_deref()
                        .unwrap_or_else(|| network_prefix(meta.category)),
                })
            }
            RouteCategory::Greenway => json!({ "network": raw.context.area }),
        };

        Ok(CanonicalRoute {
            external_id: raw.external_id,
            code: meta.code,
            name: meta.name,
            category: meta.category,
            provider: raw.provider,
            distance_km,
            duration_min,
            difficulty: self.classification.classify(distance_km, gain_m),
            geometry,
            elevation_samples: raw.elevations,
            elevation_gain_m: gain_m,
            elevation_loss_m: loss_m,
            region: meta.region.unwrap_or_else(|| self.defaults.region.clone()),
            province: meta.province,
            edit_date: meta.edit_date,
            extra_info,
            cover_image_ref: self.defaults.cover_image.clone(),
        })
    }
}

fn network_prefix(category: RouteCategory) -> &'static str {
    match category {
        RouteCategory::LongDistance => "GR",
        RouteCategory::ShortDistance => "PR",
        _ => "SL",
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
