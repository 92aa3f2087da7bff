//! Federation catalog code parsing (`PR-AV 12`, `GR 7`, `SL-CV 45`, `GR-92.1`)

use regex::{Regex, RegexBuilder};
use serde::Serialize;
use trail_common::types::RouteCategory;

/// Components of a federation code; every field is `None` when the code does not match
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParsedCode {
    /// `GR`, `PR` or `SL`
    pub network: Option<String>,
    /// Province or community token, upper-cased
    pub region_token: Option<String>,
    pub catalog_number: Option<u32>,
    /// Variant suffix of `GR-92.1`, without the dot
    pub variant: Option<String>,
}

impl ParsedCode {
    pub fn is_empty(&self) -> bool {
        self.network.is_none()
    }

    pub fn category(&self) -> Option<RouteCategory> {
        self.network
            .as_deref()
            .and_then(RouteCategory::from_network_prefix)
    }
}

pub struct CodeParser {
    pattern: Regex,
}

impl CodeParser {
    pub fn new() -> Result<Self, regex::Error> {
        let pattern = RegexBuilder::new(r"^(GR|PR|SL)[-\s]*([A-Z]{1,3})?[-\s]*(\d+)(\.\d+)?")
            .case_insensitive(true)
            .build()?;
        Ok(Self { pattern })
    }

    pub fn parse(&self, code: &str) -> ParsedCode {
        let Some(caps) = self.pattern.captures(code.trim()) else {
            return ParsedCode::default();
        };

        ParsedCode {
            network: caps.get(1).map(|m| m.as_str().to_uppercase()),
            region_token: caps.get(2).map(|m| m.as_str().to_uppercase()),
            catalog_number: caps.get(3).and_then(|m| m.as_str().parse().ok()),
            variant: caps.get(4).map(|m| m.as_str().trim_start_matches('.').to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> CodeParser {
        CodeParser::new().unwrap()
    }

    #[test]
    fn test_parse_with_region_token() {
        let parsed = parser().parse("PR-AV 12");
        assert_eq!(parsed.network.as_deref(), Some("PR"));
        assert_eq!(parsed.region_token.as_deref(), Some("AV"));
        assert_eq!(parsed.catalog_number, Some(12));
        assert_eq!(parsed.category(), Some(RouteCategory::ShortDistance));

        let parsed = parser().parse("SL-CV 45");
        assert_eq!(parsed.region_token.as_deref(), Some("CV"));
        assert_eq!(parsed.catalog_number, Some(45));
        assert_eq!(parsed.category(), Some(RouteCategory::Local));
    }

    #[test]
    fn test_parse_without_region_token() {
        let parsed = parser().parse("GR 7");
        assert_eq!(parsed.network.as_deref(), Some("GR"));
        assert_eq!(parsed.region_token, None);
        assert_eq!(parsed.catalog_number, Some(7));

        let parsed = parser().parse("GR-92.1");
        assert_eq!(parsed.catalog_number, Some(92));
        assert_eq!(parsed.variant.as_deref(), Some("1"));
        assert_eq!(parsed.category(), Some(RouteCategory::LongDistance));
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        let parsed = parser().parse("pr-b 101");
        assert_eq!(parsed.network.as_deref(), Some("PR"));
        assert_eq!(parsed.region_token.as_deref(), Some("B"));
        assert_eq!(parsed.catalog_number, Some(101));
    }

    #[test]
    fn test_mismatch_is_empty() {
        for code in ["", "Ruta del Cares", "E-4", "12 PR"] {
            let parsed = parser().parse(code);
            assert!(parsed.is_empty(), "{:?} should not parse", code);
            assert_eq!(parsed, ParsedCode::default());
        }
    }
}
