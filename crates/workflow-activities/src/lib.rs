//! # Workflow Activities
//!
//! Activity functions the external durable-workflow coordinator invokes
//! to drive long-running scans and remediations. Every activity is safe
//! to retry: state moves are CAS-backed, terminal states are observed and
//! returned without side effects, and external effects follow the
//! connector idempotency contract (mask/encrypt/restore are idempotent,
//! delete is not).

use catalog_store::{CatalogPool, FindingRepo, ScanRunRepo};
use ingestion::{IngestBatch, IngestionPipeline};
use lineage_graph::LineageSynchronizer;
use privguard_core::types::{RemediationActionType, ScanStatus};
use privguard_core::{
    EntityId, Error, IngestSummary, RemediationAction, Result, TenantContext, Timestamp,
};
use remediation::RemediationOrchestrator;
use std::sync::Arc;
use tracing::info;

/// Activity surface over the core components
pub struct Activities {
    pool: CatalogPool,
    pipeline: Arc<IngestionPipeline>,
    synchronizer: Arc<LineageSynchronizer>,
    orchestrator: Arc<RemediationOrchestrator>,
}

impl Activities {
    pub fn new(
        pool: CatalogPool,
        pipeline: Arc<IngestionPipeline>,
        synchronizer: Arc<LineageSynchronizer>,
        orchestrator: Arc<RemediationOrchestrator>,
    ) -> Self {
        Self {
            pool,
            pipeline,
            synchronizer,
            orchestrator,
        }
    }

    /// CAS-backed scan transition. Retrying after a success is a no-op:
    /// observing the target state returns Ok instead of a lost-race error.
    pub async fn transition_scan_state(
        &self,
        tenant: TenantContext,
        scan_id: EntityId,
        from: ScanStatus,
        to: ScanStatus,
    ) -> Result<()> {
        let mut conn = self.pool.inner().acquire().await?;
        match ScanRunRepo::transition(&mut conn, scan_id, from, to, None).await {
            Ok(()) => Ok(()),
            Err(Error::State { .. }) => {
                let run = ScanRunRepo::get(&mut conn, tenant, scan_id)
                    .await?
                    .ok_or_else(|| Error::not_found(format!("scan run {scan_id}")))?;
                if run.status == to {
                    info!(scan_id = %scan_id, status = %to, "transition already applied");
                    Ok(())
                } else {
                    Err(Error::state("scan_run", run.status.as_str(), to.as_str()))
                }
            }
            Err(e) => Err(e),
        }
    }

    /// Ingest a batch into a pre-created scan. A cancelled or otherwise
    /// terminal scan is observed and returned with zero side effects.
    pub async fn ingest_scan_findings(
        &self,
        scan_id: EntityId,
        batch: IngestBatch,
    ) -> Result<IngestSummary> {
        self.pipeline.ingest_into(scan_id, batch).await
    }

    /// Reconcile the graph for every asset touched by a scan. Safe to
    /// repeat: node upserts and edge merges are idempotent.
    pub async fn sync_to_graph(&self, scan_id: EntityId) -> Result<u64> {
        let asset_ids = {
            let mut conn = self.pool.inner().acquire().await?;
            FindingRepo::assets_for_scan(&mut conn, scan_id).await?
        };

        let mut synced = 0u64;
        for asset_id in asset_ids {
            self.synchronizer.sync_asset(asset_id).await?;
            synced += 1;
        }
        Ok(synced)
    }

    /// Execute one remediation action
    pub async fn execute_remediation(
        &self,
        tenant: TenantContext,
        finding_id: EntityId,
        action_type: RemediationActionType,
        actor: &str,
    ) -> Result<RemediationAction> {
        self.orchestrator
            .execute(tenant, finding_id, action_type, actor)
            .await
    }

    /// Roll back a completed remediation action
    pub async fn rollback_remediation(
        &self,
        action_id: EntityId,
        actor: &str,
    ) -> Result<RemediationAction> {
        self.orchestrator.rollback(action_id, actor).await
    }

    /// Finalize the exposure window for a remediated finding
    pub async fn close_exposure_window(&self, finding_id: EntityId, at: Timestamp) -> Result<()> {
        self.synchronizer.close_exposure(finding_id, at).await
    }
}
