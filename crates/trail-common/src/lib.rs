//! Trail Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared types, logging, and error handling for the trail ingestion workspace.
//!
//! # Overview
//!
//! - **Error Handling**: [`TrailError`] and the [`Result`] alias
//! - **Logging**: centralized `tracing` setup (see [`logging`])
//! - **Types**: route taxonomy shared by readers, builder and store
//!   (providers, categories, difficulty labels, source kinds)
//!
//! # Example
//!
//! ```no_run
//! use trail_common::types::RouteCategory;
//!
//! fn category_for(code: &str) -> trail_common::Result<RouteCategory> {
//!     let prefix = code.get(..2).unwrap_or_default();
//!     RouteCategory::from_network_prefix(prefix)
//!         .ok_or_else(|| trail_common::TrailError::UnknownCategory(code.to_string()))
//! }
//! ```

pub mod error;
pub mod logging;
pub mod types;

// Re-export commonly used types
pub use error::{Result, TrailError};
