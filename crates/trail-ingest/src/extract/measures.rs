//! Declared length and duration attributes

/// Parse a decimal that may use a comma separator (`"12,5"`)
pub fn parse_decimal(value: &str) -> Option<f64> {
    let normalized = value.trim().replace(',', ".");
    normalized.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Declared length in kilometres; only strictly positive values count
pub fn parse_length_km(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    let number = trimmed
        .strip_suffix("km")
        .or_else(|| trimmed.strip_suffix("Km"))
        .or_else(|| trimmed.strip_suffix("KM"))
        .unwrap_or(trimmed);

    parse_decimal(number).filter(|km| *km > 0.0)
}

/// Declared duration in minutes
///
/// Accepts `H:MM`, `4h30`, `4 h 30 min` and decimal hours (`4,5`).
pub fn parse_duration_min(value: &str) -> Option<i32> {
    let value = value.trim().to_lowercase();
    if value.is_empty() {
        return None;
    }

    let minutes = if let Some((hours, mins)) = value.split_once(':') {
        hours_and_minutes(hours, mins)?
    } else if let Some((hours, mins)) = value.split_once('h') {
        let mins = mins.trim().trim_end_matches("min").trim();
        hours_and_minutes(hours, if mins.is_empty() { "0" } else { mins })?
    } else {
        parse_decimal(&value)? * 60.0
    };

    let minutes = minutes.round();
    (minutes > 0.0 && minutes <= i32::MAX as f64).then_some(minutes as i32)
}

fn hours_and_minutes(hours: &str, minutes: &str) -> Option<f64> {
    let hours: u32 = hours.trim().parse().ok()?;
    let minutes: u32 = minutes.trim().parse().ok()?;
    if minutes >= 60 {
        return None;
    }
    Some(f64::from(hours) * 60.0 + f64::from(minutes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_with_decimal_comma() {
        assert_eq!(parse_length_km("12,5"), Some(12.5));
        assert_eq!(parse_length_km("8.25"), Some(8.25));
        assert_eq!(parse_length_km("14 km"), Some(14.0));
    }

    #[test]
    fn test_length_rejects_non_positive() {
        assert_eq!(parse_length_km("0"), None);
        assert_eq!(parse_length_km("-3,2"), None);
        assert_eq!(parse_length_km(""), None);
        assert_eq!(parse_length_km("desconocida"), None);
        assert_eq!(parse_length_km("NaN"), None);
    }

    #[test]
    fn test_duration_formats() {
        assert_eq!(parse_duration_min("4:30"), Some(270));
        assert_eq!(parse_duration_min("4h30"), Some(270));
        assert_eq!(parse_duration_min("4 h 30 min"), Some(270));
        assert_eq!(parse_duration_min("3h"), Some(180));
        assert_eq!(parse_duration_min("4,5"), Some(270));
        assert_eq!(parse_duration_min("1.25"), Some(75));
    }

    #[test]
    fn test_duration_rejects_garbage() {
        assert_eq!(parse_duration_min(""), None);
        assert_eq!(parse_duration_min("0"), None);
        assert_eq!(parse_duration_min("2:75"), None);
        assert_eq!(parse_duration_min("unas horas"), None);
    }
}
