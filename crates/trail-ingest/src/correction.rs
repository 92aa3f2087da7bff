//! Coordinate-order correction for previously ingested routes
//!
//! Older imports stored some geometries as (lat, lon). This pass finds them by
//! their first point and rewrites them in (lon, lat) order. Only geometry is
//! rewritten; stored distances and metadata are left as they are.

use crate::geometry::{swap_if_needed, RegionBounds};
use crate::store::{RouteStore, StoreResult, StoredGeometry};
use serde::Serialize;
use tracing::{debug, info};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CorrectionStats {
    pub scanned: usize,
    pub swapped: usize,
    /// Rows written; zero on a dry run
    pub updated: u64,
}

pub async fn fix_swapped(
    store: &dyn RouteStore,
    bounds: &RegionBounds,
    dry_run: bool,
) -> StoreResult<CorrectionStats> {
    let geometries = store.geometries().await?;
    let mut stats = CorrectionStats {
        scanned: geometries.len(),
        ..Default::default()
    };

    let fixes: Vec<StoredGeometry> = geometries
        .into_iter()
        .filter_map(|stored| {
            swap_if_needed(&stored.coordinates, bounds).map(|coordinates| {
                debug!(external_id = %stored.external_id, "Swapped geometry detected");
                StoredGeometry {
                    coordinates,
                    ..stored
                }
            })
        })
        .collect();
    stats.swapped = fixes.len();

    if dry_run {
        info!(scanned = stats.scanned, swapped = stats.swapped, "Dry run, no geometry updated");
        return Ok(stats);
    }

    if !fixes.is_empty() {
        stats.updated = store.update_geometries(&fixes).await?;
    }

    info!(
        scanned = stats.scanned,
        swapped = stats.swapped,
        updated = stats.updated,
        "Coordinate-order correction complete"
    );
    Ok(stats)
}
