//! Identifier and attribute extraction
//!
//! Turns the free-form attribute map of a [`RawTrailRecord`] into typed route
//! metadata: display name and code, refined category, region and province,
//! edit date and homologation flag.

pub mod code;
pub mod edit_date;
pub mod identifier;
pub mod measures;
pub mod region;

pub use code::{CodeParser, ParsedCode};
pub use edit_date::parse_edit_date;
pub use identifier::{collapse_whitespace, track_log_id, vector_feature_id};
pub use measures::{parse_decimal, parse_duration_min, parse_length_km};
pub use region::{RegionInfo, RegionTable, UNSPECIFIED_REGION};

use crate::model::{attr, RawTrailRecord};
use chrono::NaiveDate;
use trail_common::types::{RouteCategory, SourceKind};

/// Typed metadata extracted from one raw record
#[derive(Debug, Clone, PartialEq)]
pub struct RouteMetadata {
    pub name: String,
    /// Catalog code, or the display name when the record has none
    pub code: String,
    pub parsed_code: ParsedCode,
    pub category: RouteCategory,
    /// Autonomous community; `None` lets the builder apply its default
    pub region: Option<String>,
    pub province: Option<String>,
    pub edit_date: Option<NaiveDate>,
    pub homologated: Option<bool>,
}

/// Extractors bundled with their lookup tables
pub struct MetadataExtractor {
    codes: CodeParser,
    regions: RegionTable,
}

impl MetadataExtractor {
    pub fn new(regions: RegionTable) -> Result<Self, regex::Error> {
        Ok(Self {
            codes: CodeParser::new()?,
            regions,
        })
    }

    pub fn regions(&self) -> &RegionTable {
        &self.regions
    }

    pub fn extract(&self, raw: &RawTrailRecord) -> RouteMetadata {
        let code_attr = raw.attribute(attr::CODE);
        let name_attr = raw.attribute(attr::NAME);

        let name = name_attr
            .or(code_attr)
            .map(str::to_string)
            .unwrap_or_else(|| raw.external_id.clone());
        let code = code_attr.unwrap_or(&name).to_string();

        let parsed_code = self.codes.parse(&code);
        let category = match raw.category {
            // Federation datasets mix GR/PR/SL in one layer
            RouteCategory::LongDistance | RouteCategory::ShortDistance | RouteCategory::Local => {
                parsed_code.category().unwrap_or(raw.category)
            }
            other => other,
        };

        let region_info = self.resolve_region(raw, &parsed_code);
        let province = region_info
            .as_ref()
            .and_then(|info| info.province.map(str::to_string))
            .or_else(|| raw.attribute(attr::PROVINCE).map(str::to_string));

        RouteMetadata {
            name,
            code,
            parsed_code,
            category,
            region: region_info.map(|info| info.community.to_string()),
            province,
            edit_date: raw.attribute(attr::EDIT_DATE).and_then(parse_edit_date),
            homologated: raw.attribute(attr::HOMOLOGATED).and_then(parse_flag),
        }
    }

    /// Code token first, then the province attribute, then the park folder
    fn resolve_region(&self, raw: &RawTrailRecord, parsed: &ParsedCode) -> Option<RegionInfo> {
        let from_token = parsed
            .region_token
            .as_deref()
            .map(|token| self.regions.by_token(token));
        if let Some(info) = from_token.as_ref().filter(|info| !info.is_unspecified()) {
            return Some(info.clone());
        }

        let from_province = raw
            .attribute(attr::PROVINCE)
            .and_then(|name| self.regions.by_province_name(name));
        if from_province.is_some() {
            return from_province;
        }

        if raw.kind == SourceKind::TrackLog {
            if let Some(info) = self.regions.by_park_area(&raw.context.area) {
                return Some(info);
            }
        }

        // An unknown token is still reported as such
        from_token
    }
}

/// DBF homologation flags come as `S`/`N`, `SI`/`NO`, logical or 0/1
fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_uppercase().as_str() {
        "S" | "SI" | "SÍ" | "Y" | "YES" | "T" | "TRUE" | "1" => Some(true),
        "N" | "NO" | "F" | "FALSE" | "0" => Some(false),
        _ => None,
    }
}
