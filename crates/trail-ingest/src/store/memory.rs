//! In-memory route store for dry runs and tests

use super::{GroupCount, GroupKey, RouteStore, StoreError, StoreResult, StoredGeometry};
use crate::model::CanonicalRoute;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
pub struct MemoryRouteStore {
    /// Keyed by external id
    routes: RwLock<BTreeMap<String, (Uuid, CanonicalRoute)>>,
}

impl MemoryRouteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every stored route, ordered by external id
    pub async fn routes(&self) -> Vec<CanonicalRoute> {
        self.routes
            .read()
            .await
            .values()
            .map(|(_, route)| route.clone())
            .collect()
    }

    pub async fn get(&self, external_id: &str) -> Option<CanonicalRoute> {
        self.routes
            .read()
            .await
            .get(external_id)
            .map(|(_, route)| route.clone())
    }
}

#[async_trait]
impl RouteStore for MemoryRouteStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn insert_one(&self, route: &CanonicalRoute) -> StoreResult<Uuid> {
        let mut routes = self.routes.write().await;
        if routes.contains_key(&route.external_id) {
            return Err(StoreError::DuplicateKey(route.external_id.clone()));
        }

        let id = Uuid::new_v4();
        routes.insert(route.external_id.clone(), (id, route.clone()));
        Ok(id)
    }

    async fn exists(&self, external_id: &str) -> StoreResult<bool> {
        Ok(self.routes.read().await.contains_key(external_id))
    }

    async fn count_by_group(&self, keys: &[GroupKey]) -> StoreResult<Vec<GroupCount>> {
        let by_category = keys.contains(&GroupKey::Category);
        let by_provider = keys.contains(&GroupKey::Provider);

        let mut counts = HashMap::new();
        for (_, route) in self.routes.read().await.values() {
            let key = (
                by_category.then_some(route.category),
                by_provider.then_some(route.provider),
            );
            *counts.entry(key).or_insert(0i64) += 1;
        }

        let mut groups: Vec<GroupCount> = counts
            .into_iter()
            .map(|((category, provider), count)| GroupCount {
                category,
                provider,
                count,
            })
            .collect();
        // Same ordering as the SQL backend, which sorts the text columns
        groups.sort_by_key(|g| (g.category.map(|c| c.as_str()), g.provider.map(|p| p.as_str())));
        Ok(groups)
    }

    async fn count_all(&self) -> StoreResult<i64> {
        Ok(self.routes.read().await.len() as i64)
    }

    async fn geometries(&self) -> StoreResult<Vec<StoredGeometry>> {
        Ok(self
            .routes
            .read()
            .await
            .values()
            .map(|(id, route)| StoredGeometry {
                id: *id,
                external_id: route.external_id.clone(),
                coordinates: route.geometry.clone(),
            })
            .collect())
    }

    async fn update_geometries(&self, updates: &[StoredGeometry]) -> StoreResult<u64> {
        let mut routes = self.routes.write().await;
        let mut updated = 0;

        for update in updates {
            if let Some((_, route)) = routes.values_mut().find(|(id, _)| *id == update.id) {
                route.geometry = update.coordinates.clone();
                updated += 1;
            }
        }

        Ok(updated)
    }
}
