//! Edit-date parsing for federation records

use chrono::NaiveDate;

const FORMATS: &[&str] = &["%Y%m%d", "%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y"];

/// Parse `YYYYMMDD`, `YYYY-MM-DD`, `DD/MM/YYYY` or `DD-MM-YYYY`
///
/// DBF date fields are stringified as `YYYYMMDD`. Anything else yields `None`.
pub fn parse_edit_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    // Timestamps sometimes carry a time part
    let date_part = value.split(['T', ' ']).next().unwrap_or(value);

    FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(date_part, format).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    #[test]
    fn test_supported_formats() {
        assert_eq!(parse_edit_date("20190315"), date(2019, 3, 15));
        assert_eq!(parse_edit_date("2019-03-15"), date(2019, 3, 15));
        assert_eq!(parse_edit_date("15/03/2019"), date(2019, 3, 15));
        assert_eq!(parse_edit_date("15-03-2019"), date(2019, 3, 15));
        assert_eq!(parse_edit_date(" 2021-11-02T10:00:00 "), date(2021, 11, 2));
    }

    #[test]
    fn test_invalid_dates() {
        assert_eq!(parse_edit_date(""), None);
        assert_eq!(parse_edit_date("sin fecha"), None);
        assert_eq!(parse_edit_date("2019-13-40"), None);
        assert_eq!(parse_edit_date("03/2019"), None);
    }
}
