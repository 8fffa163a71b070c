//! Lineage read surface.
//!
//! Hierarchy reads come from the graph and degrade explicitly: a graph
//! failure is surfaced as "lineage unavailable", never silently served
//! from the catalog. The per-PII-type aggregation reads from the catalog,
//! which is the source of truth for counts.

use crate::store::GraphStore;
use catalog_store::{CatalogPool, FindingRepo};
use privguard_core::models::graph::{LineageFilter, LineageStatus, LineageView};
use privguard_core::{Error, PiiSummaryRow, Result, TenantContext};
use std::sync::Arc;
use tracing::warn;

/// Read-side service for the lineage endpoints
pub struct LineageService {
    store: Arc<dyn GraphStore>,
    pool: CatalogPool,
}

impl LineageService {
    pub fn new(store: Arc<dyn GraphStore>, pool: CatalogPool) -> Self {
        Self { store, pool }
    }

    /// System -> Asset -> PII_Category projection. Graph failure yields
    /// an explicit unavailable view rather than an error or a fallback.
    pub async fn hierarchy(&self, filter: &LineageFilter) -> Result<LineageView> {
        hierarchy_view(self.store.as_ref(), filter).await
    }

    /// Per-PII-type totals: findings, affected assets, affected systems,
    /// average confidence. Served from the catalog.
    pub async fn pii_summary(&self, tenant: TenantContext) -> Result<Vec<PiiSummaryRow>> {
        let mut conn = self.pool.inner().acquire().await?;
        FindingRepo::pii_summary(&mut conn, tenant).await
    }
}

/// Projection with explicit degradation, independent of the catalog pool
pub async fn hierarchy_view(
    store: &dyn GraphStore,
    filter: &LineageFilter,
) -> Result<LineageView> {
    match store.hierarchy(filter).await {
        Ok(systems) => Ok(LineageView {
            status: LineageStatus::Available,
            systems,
        }),
        Err(Error::GraphUnavailable { .. }) | Err(Error::Graph { .. }) => {
            warn!("lineage hierarchy requested while graph is unavailable");
            Ok(LineageView {
                status: LineageStatus::Unavailable,
                systems: Vec::new(),
            })
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MockGraphStore, NullStore};
    use privguard_core::models::graph::{LineageAsset, LineageSystem, SystemNode};

    #[tokio::test]
    async fn test_disabled_graph_reports_unavailable() {
        let view = hierarchy_view(&NullStore, &LineageFilter::default())
            .await
            .unwrap();
        assert_eq!(view.status, LineageStatus::Unavailable);
        assert!(view.systems.is_empty());
    }

    #[tokio::test]
    async fn test_graph_error_degrades_explicitly() {
        let mut store = MockGraphStore::new();
        store
            .expect_hierarchy()
            .returning(|_| Err(Error::graph("bolt connection reset")));

        let view = hierarchy_view(&store, &LineageFilter::default())
            .await
            .unwrap();
        assert_eq!(view.status, LineageStatus::Unavailable);
    }

    #[tokio::test]
    async fn test_available_graph_returns_hierarchy() {
        let mut store = MockGraphStore::new();
        store.expect_hierarchy().returning(|_| {
            Ok(vec![LineageSystem {
                system: SystemNode::from_host("db-01", None),
                assets: Vec::<LineageAsset>::new(),
            }])
        });

        let view = hierarchy_view(&store, &LineageFilter::default())
            .await
            .unwrap();
        assert_eq!(view.status, LineageStatus::Available);
        assert_eq!(view.systems.len(), 1);
        assert_eq!(view.systems[0].system.id, "system-db-01");
    }
}
