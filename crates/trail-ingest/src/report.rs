//! Post-run statistics over the stored routes

use crate::store::{GroupCount, GroupKey, RouteStore, StoreResult};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{error, info};
use trail_common::types::RouteCategory;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryTotal {
    pub category: RouteCategory,
    pub count: i64,
}

/// Stored-route counts by (category, provider), per category and overall
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatsReport {
    pub groups: Vec<GroupCount>,
    pub category_totals: Vec<CategoryTotal>,
    pub total: i64,
}

impl StatsReport {
    pub fn log(&self) {
        info!("Stored routes by category and provider:");
        for group in &self.groups {
            info!(
                category = %group.category.map(|c| c.as_str()).unwrap_or("-"),
                provider = %group.provider.map(|p| p.as_str()).unwrap_or("-"),
                count = group.count,
                "  group"
            );
        }
        for total in &self.category_totals {
            info!(category = %total.category, count = total.count, "  category total");
        }
        info!(total = self.total, "Total stored routes");
    }
}

/// Read-only reporter; failures are logged, never propagated
pub struct StatsReporter<'a> {
    store: &'a dyn RouteStore,
}

impl<'a> StatsReporter<'a> {
    pub fn new(store: &'a dyn RouteStore) -> Self {
        Self { store }
    }

    pub async fn report(&self) -> Option<StatsReport> {
        match self.collect().await {
            Ok(report) => {
                report.log();
                Some(report)
            }
            Err(e) => {
                error!("Failed to collect route statistics: {}", e);
                None
            }
        }
    }

    async fn collect(&self) -> StoreResult<StatsReport> {
        let groups = self
            .store
            .count_by_group(&[GroupKey::Category, GroupKey::Provider])
            .await?;
        let total = self.store.count_all().await?;

        let mut per_category: BTreeMap<&str, (RouteCategory, i64)> = BTreeMap::new();
        for group in &groups {
            if let Some(category) = group.category {
                per_category.entry(category.as_str()).or_insert((category, 0)).1 += group.count;
            }
        }

        Ok(StatsReport {
            category_totals: per_category
                .into_values()
                .map(|(category, count)| CategoryTotal { category, count })
                .collect(),
            groups,
            total,
        })
    }
}
