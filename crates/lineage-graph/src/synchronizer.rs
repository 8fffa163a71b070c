//! Lineage synchronizer.
//!
//! Reconciles catalog state into the graph store: the System node for the
//! asset's host, the Asset node, the SYSTEM_OWNS_ASSET edge, and one
//! PII_Category node plus ASSET_CONTAINS_PII edge per distinct
//! classification type observed on the asset. The catalog always wins;
//! sync failures are recorded and swept up by the periodic full resync.

use crate::store::GraphStore;
use catalog_store::{AssetRepo, CatalogPool, ClassificationRepo, FindingRepo};
use privguard_core::models::graph::{AssetNode, ContainsPiiEdge, PiiCategoryNode, SystemNode};
use privguard_core::types::{ClassificationType, Severity};
use privguard_core::utils::current_timestamp;
use privguard_core::{AssetFilter, EntityId, Error, Page, Result, TenantContext, Timestamp};
use std::sync::Arc;
use tracing::{info, warn};

/// Type-level risk attached to PII_Category nodes
fn category_risk_level(classification_type: ClassificationType) -> Severity {
    match classification_type {
        ClassificationType::SensitivePersonal => Severity::High,
        ClassificationType::Secrets => Severity::High,
        ClassificationType::Personal => Severity::Medium,
        ClassificationType::NonPii => Severity::Low,
    }
}

/// Reconciles one asset at a time; idempotent and safe to repeat
pub struct LineageSynchronizer {
    store: Arc<dyn GraphStore>,
    pool: CatalogPool,
}

impl LineageSynchronizer {
    pub fn new(store: Arc<dyn GraphStore>, pool: CatalogPool) -> Self {
        Self { store, pool }
    }

    pub fn store(&self) -> &Arc<dyn GraphStore> {
        &self.store
    }

    /// Reconcile the graph projection of one asset with the catalog
    pub async fn sync_asset(&self, asset_id: EntityId) -> Result<()> {
        let mut conn = self.pool.inner().acquire().await?;

        let Some(asset) = AssetRepo::get(&mut conn, TenantContext::legacy(), asset_id).await?
        else {
            warn!(asset_id = %asset_id, "sync requested for unknown asset");
            return Ok(());
        };
        if asset.deleted_at.is_some() {
            return Ok(());
        }

        let stats = AssetRepo::finding_stats(&mut conn, asset_id).await?;
        let global = FindingRepo::pii_summary(&mut conn, TenantContext::legacy()).await?;
        drop(conn);

        let system = SystemNode::from_host(&asset.host, asset.source_system.clone());
        self.store.upsert_system(&system).await?;

        let asset_node = AssetNode {
            id: asset.id,
            path: asset.path.clone(),
            asset_type: asset.asset_type.clone(),
            environment: asset.environment.as_str().to_string(),
            risk_score: asset.risk_score,
        };
        self.store.upsert_asset(&asset_node, asset.updated_at).await?;
        self.store.merge_owns_edge(&system.id, asset.id).await?;

        let now = current_timestamp();
        let mut keep_types = Vec::with_capacity(stats.by_type.len());
        for aggregate in &stats.by_type {
            let code = aggregate.classification_type.code().to_string();

            // Node attributes aggregate across the whole catalog; the
            // edge carries the per-asset numbers.
            let (global_count, global_conf) = global
                .iter()
                .find(|row| row.pii_type == aggregate.classification_type.as_str())
                .map(|row| (row.findings, row.avg_confidence))
                .unwrap_or((aggregate.finding_count, aggregate.avg_confidence));

            self.store
                .upsert_pii_category(&PiiCategoryNode {
                    pii_type: code.clone(),
                    risk_level: category_risk_level(aggregate.classification_type),
                    finding_count: global_count,
                    avg_confidence: global_conf,
                })
                .await?;

            self.store
                .merge_contains_edge(&ContainsPiiEdge {
                    asset_id: asset.id,
                    pii_type: code.clone(),
                    finding_count: aggregate.finding_count,
                    avg_confidence: aggregate.avg_confidence,
                    updated_at: now,
                    until: None,
                })
                .await?;

            keep_types.push(code);
        }

        self.store
            .remove_stale_contains_edges(asset.id, &keep_types)
            .await?;

        Ok(())
    }

    /// Close the exposure window for a remediated finding: refresh the
    /// asset's projection, then stamp `until` on the matching edge.
    pub async fn close_exposure(&self, finding_id: EntityId, at: Timestamp) -> Result<()> {
        let mut conn = self.pool.inner().acquire().await?;
        let Some(finding) =
            FindingRepo::get(&mut conn, TenantContext::legacy(), finding_id).await?
        else {
            return Err(Error::not_found(format!("finding {finding_id}")));
        };
        let classification = ClassificationRepo::get_for_finding(&mut conn, finding_id).await?;
        drop(conn);

        let Some(classification) = classification else {
            warn!(finding_id = %finding_id, "close-exposure for unclassified finding");
            return Ok(());
        };

        self.sync_asset(finding.asset_id).await?;
        self.store
            .close_exposure(
                finding.asset_id,
                classification.classification_type.code(),
                at,
            )
            .await
    }

    /// Sweep assets whose catalog `updated_at` exceeds the graph-side
    /// value and resync them. Returns the number of assets resynced.
    pub async fn full_resync(&self) -> Result<u64> {
        let mut resynced = 0u64;
        let mut page = Page::default();

        loop {
            let mut conn = self.pool.inner().acquire().await?;
            let batch = AssetRepo::list(
                &mut conn,
                TenantContext::legacy(),
                &AssetFilter::default(),
                page,
            )
            .await?;
            drop(conn);

            if batch.items.is_empty() {
                break;
            }

            for asset in &batch.items {
                let graph_seen = self.store.asset_updated_at(asset.id).await?;
                let stale = match graph_seen {
                    Some(graph_ts) => asset.updated_at > graph_ts,
                    None => true,
                };
                if stale {
                    self.sync_asset(asset.id).await?;
                    resynced += 1;
                }
            }

            if (i64::from(page.page) * i64::from(page.per_page)) >= batch.total {
                break;
            }
            page.page += 1;
        }

        if resynced > 0 {
            info!(resynced, "lineage full resync complete");
        }
        Ok(resynced)
    }
}
