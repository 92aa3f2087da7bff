//! Error types for trail ingestion
//!
//! Errors are grouped by the granularity at which the orchestrator recovers
//! from them: setup errors abort the run, source errors skip one source, and
//! record errors skip one record.

use crate::builder::BuildDecline;
use crate::model::RecordContext;
use crate::store::StoreError;
use thiserror::Error;
use trail_common::TrailError;

/// Result type alias for ingestion operations
pub type Result<T> = std::result::Result<T, IngestError>;

#[derive(Error, Debug)]
pub enum IngestError {
    /// Store unreachable, data root missing, unusable configuration
    #[error("Setup failed: {0}")]
    Setup(String),

    /// A source directory or its primary file is missing/unreadable
    #[error("Source '{source_name}' unavailable: {message}")]
    Source {
        source_name: String,
        message: String,
    },

    /// Malformed geometry or attributes in a single record or file
    #[error("{context}: {message}")]
    Record {
        context: RecordContext,
        message: String,
    },

    #[error("{context}: declined: {reason}")]
    Declined {
        context: RecordContext,
        reason: BuildDecline,
    },

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Configuration error: {0}")]
    Config(#[from] TrailError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl IngestError {
    pub fn source_unavailable(source_name: &str, message: impl Into<String>) -> Self {
        Self::Source {
            source_name: source_name.to_string(),
            message: message.into(),
        }
    }

    pub fn record(context: RecordContext, message: impl Into<String>) -> Self {
        Self::Record {
            context,
            message: message.into(),
        }
    }

    /// Whether the orchestrator may skip this error and keep going
    pub fn is_record_level(&self) -> bool {
        matches!(self, IngestError::Record { .. } | IngestError::Declined { .. })
    }
}
