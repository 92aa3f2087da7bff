//! Error types shared across the trail workspace

use thiserror::Error;

/// Result type alias for shared trail operations
pub type Result<T> = std::result::Result<T, TrailError>;

/// Main error type for shared trail operations
#[derive(Error, Debug)]
pub enum TrailError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    #[error("Unknown route category: {0}")]
    UnknownCategory(String),

    #[error("Unknown source kind: {0}")]
    UnknownSourceKind(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Parse error: {0}")]
    Parse(String),
}
