//! Asset manager: single source of truth for asset identity.
//!
//! Create-or-update is idempotent under concurrent callers: the losing
//! writer of a stable-id race retries the read and converges on the
//! existing row. Identifying an existing asset never overwrites its
//! owner, risk, or metadata.

use catalog_store::{AssetRepo, AuditRepo, InsertOutcome};
use lineage_graph::SyncHandle;
use privguard_core::{
    Asset, AssetFilter, AuditEvent, EntityId, Error, NewAsset, Page, Paged, Result, TenantContext,
};
use sqlx::PgConnection;
use tracing::debug;

/// Owns asset identity and coordinates graph sync side effects
pub struct AssetManager {
    sync: SyncHandle,
}

impl AssetManager {
    pub fn new(sync: SyncHandle) -> Self {
        Self { sync }
    }

    /// Resolve an asset by stable id, inserting it on first sight.
    /// Returns the asset id and whether this call created the row.
    ///
    /// Side effects on both paths: an audit event on the same connection
    /// and a non-blocking graph-sync enqueue whose failure never aborts
    /// the call.
    pub async fn create_or_update(
        &self,
        conn: &mut PgConnection,
        tenant: TenantContext,
        new: NewAsset,
    ) -> Result<(EntityId, bool)> {
        let stable_id = match &new.stable_id {
            Some(id) => id.clone(),
            // Callers without a precomputed id get the file rule
            None => privguard_core::utils::sha256_hex(&new.path.to_lowercase()),
        };

        if let Some(existing) = AssetRepo::get_by_stable_id(&mut *conn, tenant, &stable_id).await? {
            self.record_identified(&mut *conn, tenant, &existing).await?;
            return Ok((existing.id, false));
        }

        let asset = new.into_asset(stable_id.clone());
        match AssetRepo::insert(&mut *conn, &asset).await? {
            InsertOutcome::Inserted(id) => {
                AuditRepo::record(
                    &mut *conn,
                    &AuditEvent::new("asset.created", "asset", "create")
                        .with_tenant(tenant.tenant_id)
                        .with_resource(id)
                        .with_states(None, Some(serde_json::to_value(&asset)?))
                        .with_metadata("stable_id", stable_id),
                )
                .await?;
                self.sync.enqueue_asset(id);
                Ok((id, true))
            }
            InsertOutcome::StableIdTaken => {
                // Lost the insert race: the winner's row is authoritative
                debug!(stable_id = %stable_id, "asset insert race, converging on existing row");
                let existing = AssetRepo::get_by_stable_id(&mut *conn, tenant, &stable_id)
                    .await?
                    .ok_or_else(|| Error::internal("asset vanished after stable-id race"))?;
                self.record_identified(conn, tenant, &existing).await?;
                Ok((existing.id, false))
            }
        }
    }

    async fn record_identified(
        &self,
        conn: &mut PgConnection,
        tenant: TenantContext,
        asset: &Asset,
    ) -> Result<()> {
        AuditRepo::record(
            conn,
            &AuditEvent::new("asset.identified", "asset", "identify")
                .with_tenant(tenant.tenant_id)
                .with_resource(asset.id)
                .with_metadata("stable_id", asset.stable_id.clone()),
        )
        .await?;
        self.sync.enqueue_asset(asset.id);
        Ok(())
    }

    /// Unconditional stats overwrite, mirrored to the graph on next sync
    pub async fn update_stats(
        &self,
        conn: &mut PgConnection,
        asset_id: EntityId,
        risk_score: i32,
        total_findings: i64,
    ) -> Result<()> {
        AssetRepo::update_stats(conn, asset_id, risk_score, total_findings).await
    }

    pub async fn get(
        &self,
        conn: &mut PgConnection,
        tenant: TenantContext,
        id: EntityId,
    ) -> Result<Option<Asset>> {
        AssetRepo::get(conn, tenant, id).await
    }

    pub async fn get_by_stable_id(
        &self,
        conn: &mut PgConnection,
        tenant: TenantContext,
        stable_id: &str,
    ) -> Result<Option<Asset>> {
        AssetRepo::get_by_stable_id(conn, tenant, stable_id).await
    }

    pub async fn list(
        &self,
        conn: &mut PgConnection,
        tenant: TenantContext,
        filter: &AssetFilter,
        page: Page,
    ) -> Result<Paged<Asset>> {
        AssetRepo::list(conn, tenant, filter, page).await
    }
}
