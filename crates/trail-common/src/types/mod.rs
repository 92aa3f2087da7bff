//! Route taxonomy shared across the trail workspace
//!
//! These enums are persisted as their snake_case string form (`as_str`), so the
//! string values are part of the store contract and must not change.

use crate::error::TrailError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Originating dataset/organization of a route
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    /// Spanish mountain sports federation (GR / PR / SL networks)
    Fedme,
    /// Greenway network built on disused railway lines
    ViasVerdes,
    /// National parks network (track logs published per park)
    ParquesNacionales,
}

impl Provider {
    pub const ALL: [Provider; 3] = [
        Provider::Fedme,
        Provider::ViasVerdes,
        Provider::ParquesNacionales,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Fedme => "fedme",
            Provider::ViasVerdes => "vias_verdes",
            Provider::ParquesNacionales => "parques_nacionales",
        }
    }

    /// Ingestion rank; lower ranks are ingested first.
    ///
    /// Catalog providers always precede the national-park track logs.
    pub fn priority(&self) -> u8 {
        match self {
            Provider::Fedme => 0,
            Provider::ViasVerdes => 1,
            Provider::ParquesNacionales => 2,
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = TrailError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fedme" => Ok(Provider::Fedme),
            "vias_verdes" | "viasverdes" => Ok(Provider::ViasVerdes),
            "parques_nacionales" | "parquesnacionales" => Ok(Provider::ParquesNacionales),
            other => Err(TrailError::UnknownProvider(other.to_string())),
        }
    }
}

/// Route type of a canonical route
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteCategory {
    /// GR: long-distance footpath
    LongDistance,
    /// PR: short-distance footpath
    ShortDistance,
    /// SL: local footpath
    Local,
    Greenway,
    NationalParkTrail,
}

impl RouteCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            RouteCategory::LongDistance => "long_distance",
            RouteCategory::ShortDistance => "short_distance",
            RouteCategory::Local => "local",
            RouteCategory::Greenway => "greenway",
            RouteCategory::NationalParkTrail => "national_park_trail",
        }
    }

    /// Map a federation network prefix (`GR`, `PR`, `SL`) to its category
    pub fn from_network_prefix(prefix: &str) -> Option<Self> {
        match prefix.trim().to_uppercase().as_str() {
            "GR" => Some(RouteCategory::LongDistance),
            "PR" => Some(RouteCategory::ShortDistance),
            "SL" => Some(RouteCategory::Local),
            _ => None,
        }
    }
}

impl std::fmt::Display for RouteCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RouteCategory {
    type Err = TrailError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "long_distance" | "gr" => Ok(RouteCategory::LongDistance),
            "short_distance" | "pr" => Ok(RouteCategory::ShortDistance),
            "local" | "sl" => Ok(RouteCategory::Local),
            "greenway" => Ok(RouteCategory::Greenway),
            "national_park_trail" => Ok(RouteCategory::NationalParkTrail),
            other => Err(TrailError::UnknownCategory(other.to_string())),
        }
    }
}

/// Three-level difficulty label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Moderate,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Moderate => "moderate",
            Difficulty::Hard => "hard",
        }
    }
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Source format a raw record was read from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// GPX track logs, one folder per area
    TrackLog,
    /// Shapefile feature collections, one folder per regional network
    VectorFeature,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::TrackLog => "track_log",
            SourceKind::VectorFeature => "vector_feature",
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceKind {
    type Err = TrailError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "track_log" | "gpx" => Ok(SourceKind::TrackLog),
            "vector_feature" | "shapefile" | "shp" => Ok(SourceKind::VectorFeature),
            other => Err(TrailError::UnknownSourceKind(other.to_string())),
        }
    }
}
