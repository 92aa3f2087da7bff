//! Route persistence
//!
//! The orchestrator, reporter and correction pass only talk to the
//! [`RouteStore`] trait. [`PgRouteStore`] is the production backend;
//! [`MemoryRouteStore`] backs dry runs and tests.

pub mod memory;
pub mod postgres;

pub use memory::MemoryRouteStore;
pub use postgres::PgRouteStore;

use crate::model::{CanonicalRoute, Coordinate};
use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use trail_common::types::{Provider, RouteCategory};
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Route '{0}' already exists")]
    DuplicateKey(String),

    #[error("Database query failed: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Invalid stored data: {0}")]
    InvalidData(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Column a count can be grouped by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupKey {
    Category,
    Provider,
}

/// One row of a grouped count; keys not grouped by are `None`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupCount {
    pub category: Option<RouteCategory>,
    pub provider: Option<Provider>,
    pub count: i64,
}

/// Geometry of a stored route, keyed by its row id
#[derive(Debug, Clone, PartialEq)]
pub struct StoredGeometry {
    pub id: Uuid,
    pub external_id: String,
    pub coordinates: Vec<Coordinate>,
}

/// Narrow persistence interface used by the engine
#[async_trait]
pub trait RouteStore: Send + Sync {
    /// Verify the backend is reachable
    async fn ping(&self) -> StoreResult<()>;

    /// Insert one route; [`StoreError::DuplicateKey`] when its external id exists
    async fn insert_one(&self, route: &CanonicalRoute) -> StoreResult<Uuid>;

    async fn exists(&self, external_id: &str) -> StoreResult<bool>;

    /// Counts grouped by the given keys, ordered by category then provider
    async fn count_by_group(&self, keys: &[GroupKey]) -> StoreResult<Vec<GroupCount>>;

    async fn count_all(&self) -> StoreResult<i64>;

    /// All stored geometries, for the coordinate-order correction pass
    async fn geometries(&self) -> StoreResult<Vec<StoredGeometry>>;

    /// Replace geometries by row id; returns the number of rows updated
    async fn update_geometries(&self, updates: &[StoredGeometry]) -> StoreResult<u64>;
}
