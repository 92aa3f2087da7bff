//! External-id synthesis

use chrono::Utc;
use trail_common::types::Provider;
use uuid::Uuid;

/// Replace every run of whitespace with a single underscore
pub fn collapse_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join("_")
}

/// `{area}_{file_name}_{track_index}` for track-log records
pub fn track_log_id(area: &str, file_name: &str, track_index: usize) -> String {
    collapse_whitespace(&format!("{}_{}_{}", area, file_name, track_index))
}

/// Trimmed provider feature code when present, otherwise `{provider}-{timestamp_ms}-{random}`
///
/// The fallback is not stable across runs, so such records are re-inserted on
/// every run.
pub fn vector_feature_id(provider: Provider, feature_code: Option<&str>) -> String {
    match feature_code.map(str::trim).filter(|code| !code.is_empty()) {
        Some(code) => code.to_string(),
        None => fallback_id(provider),
    }
}

fn fallback_id(provider: Provider) -> String {
    let random = Uuid::new_v4().simple().to_string();
    format!(
        "{}-{}-{}",
        provider.as_str(),
        Utc::now().timestamp_millis(),
        &random[..8]
    )
}
