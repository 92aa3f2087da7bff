//! Trail ingestion and normalization engine
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]
//!
//! Reads heterogeneous trail datasets (GPX track logs, shapefile networks),
//! sanitizes and measures their geometry, and stores one canonical hiking
//! route per usable track or feature.
//!
//! Data flows leaf-first through the modules:
//!
//! - [`readers`]: lazy record streams per source directory
//! - [`extract`]: codes, regions, dates and ids from raw attributes
//! - [`geometry`]: distance, elevation and coordinate-order checks
//! - [`builder`]: canonical route construction and classification
//! - [`orchestrator`]: priority-ordered, continue-on-error driver
//! - [`report`]: post-run counts from the [`store`]
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use trail_ingest::config::IngestProfile;
//! use trail_ingest::orchestrator::IngestOrchestrator;
//! use trail_ingest::store::MemoryRouteStore;
//!
//! # async fn run() -> trail_ingest::Result<()> {
//! let store = Arc::new(MemoryRouteStore::new());
//! let mut orchestrator =
//!     IngestOrchestrator::from_profile(store, "./data", &IngestProfile::default())?;
//! let stats = orchestrator.run().await?;
//! tracing::info!(imported = stats.imported(), "Run finished");
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod config;
pub mod correction;
pub mod error;
pub mod extract;
pub mod geometry;
pub mod model;
pub mod orchestrator;
pub mod readers;
pub mod report;
pub mod store;

pub use error::{IngestError, Result};
pub use model::{CanonicalRoute, Coordinate, RawTrailRecord};
