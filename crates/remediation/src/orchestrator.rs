//! Remediation orchestrator.
//!
//! Each action is a staged, reversible state machine: PENDING ->
//! IN_PROGRESS -> COMPLETED | FAILED, with COMPLETED -> ROLLED_BACK.
//! Every move is a CAS, serializing concurrent remediation per finding.
//! The original value is captured before execution and stored in the
//! action's metadata as the rollback token.

use crate::connector::{Connector, ConnectorRegistry, RemediationTarget};
use crate::templates::mask_value;
use catalog_store::{
    AssetRepo, AuditRepo, CatalogPool, ClassificationRepo, FindingRepo, ProfileRepo,
    RemediationRepo,
};
use lineage_graph::{SyncHandle, SyncTask};
use privguard_core::types::{RemediationActionType, RemediationStatus, SourceType};
use privguard_core::utils::{current_timestamp, generate_uuid};
use privguard_core::{
    Asset, AuditEvent, EntityId, Error, Finding, RemediationAction, RemediationImpact,
    RemediationPreview, RemediationSample, Result, SourceProfile, TenantContext,
};
use sqlx::PgConnection;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{error, info};

/// Drives reversible remediation actions through source connectors
pub struct RemediationOrchestrator {
    pool: CatalogPool,
    registry: Arc<ConnectorRegistry>,
    sync: SyncHandle,
    encryption_key_ref: String,
}

impl RemediationOrchestrator {
    pub fn new(
        pool: CatalogPool,
        registry: Arc<ConnectorRegistry>,
        sync: SyncHandle,
        encryption_key_ref: String,
    ) -> Self {
        Self {
            pool,
            registry,
            sync,
            encryption_key_ref,
        }
    }

    /// Execute one remediation action against the source system
    pub async fn execute(
        &self,
        tenant: TenantContext,
        finding_id: EntityId,
        action_type: RemediationActionType,
        actor: &str,
    ) -> Result<RemediationAction> {
        let mut conn = self.pool.inner().acquire().await?;
        let (finding, asset, profile) = self.load_context(&mut conn, tenant, finding_id).await?;
        let connector = self.registry.connect(&profile).await?;

        let mut target = build_target(&asset, &finding);

        // Capture the rollback token before touching the source
        let original = match connector.get_original_value(&target).await {
            Ok(v) => v,
            Err(e) => {
                connector.close().await.ok();
                return Err(e);
            }
        };

        let applied_value = match action_type {
            RemediationActionType::Mask => Some(mask_value(&finding.pattern_name, &original)),
            _ => None,
        };

        let now = current_timestamp();
        let action = RemediationAction {
            id: generate_uuid(),
            tenant_id: tenant.tenant_id,
            finding_id,
            action_type,
            executed_by: actor.to_string(),
            executed_at: None,
            effective_from: None,
            effective_until: None,
            rollback_reference: None,
            status: RemediationStatus::Pending,
            error_detail: None,
            metadata: serde_json::json!({
                "original_value": original,
                "applied_value": applied_value,
                "target_path": target.path,
                "target_field": target.field,
                "target_record_id": target.record_id,
            }),
            created_at: now,
        };
        RemediationRepo::insert(&mut conn, &action).await?;
        RemediationRepo::cas_status(
            &mut conn,
            action.id,
            RemediationStatus::Pending,
            RemediationStatus::InProgress,
            None,
        )
        .await?;

        target.match_value = original.clone();
        let outcome = self
            .perform(&mut conn, connector.as_ref(), &finding, &target, action_type, &original)
            .await;

        match outcome {
            Ok(()) => {
                RemediationRepo::cas_status(
                    &mut conn,
                    action.id,
                    RemediationStatus::InProgress,
                    RemediationStatus::Completed,
                    None,
                )
                .await?;
                AuditRepo::record(
                    &mut conn,
                    &AuditEvent::new("remediation.executed", "remediation_action", "execute")
                        .with_tenant(tenant.tenant_id)
                        .with_user(actor)
                        .with_resource(action.id)
                        .with_metadata("action_type", action_type.as_str())
                        .with_metadata("finding_id", finding_id.to_string()),
                )
                .await?;
                connector.close().await.ok();

                // Post-effect events: lineage refresh and exposure close
                self.sync.enqueue_asset(finding.asset_id);
                self.sync.enqueue(SyncTask::CloseExposure {
                    finding_id,
                    at: current_timestamp(),
                });

                info!(action_id = %action.id, action = %action_type, "remediation completed");
                RemediationRepo::get(&mut conn, action.id)
                    .await?
                    .ok_or_else(|| Error::internal("remediation action vanished"))
            }
            Err(e) => {
                RemediationRepo::cas_status(
                    &mut conn,
                    action.id,
                    RemediationStatus::InProgress,
                    RemediationStatus::Failed,
                    Some(&e.to_string()),
                )
                .await?;
                AuditRepo::record(
                    &mut conn,
                    &AuditEvent::new("remediation.failed", "remediation_action", "execute")
                        .with_tenant(tenant.tenant_id)
                        .with_user(actor)
                        .with_resource(action.id)
                        .with_metadata("error", e.to_string()),
                )
                .await?;
                connector.close().await.ok();
                error!(action_id = %action.id, error = %e, "remediation failed");
                Err(e)
            }
        }
    }

    async fn perform(
        &self,
        conn: &mut PgConnection,
        connector: &dyn Connector,
        finding: &Finding,
        target: &RemediationTarget,
        action_type: RemediationActionType,
        original: &str,
    ) -> Result<()> {
        match action_type {
            RemediationActionType::Mask => {
                let masked = mask_value(&finding.pattern_name, original);
                connector.mask(target, &masked).await?;
                FindingRepo::set_masked_value(conn, finding.id, Some(&masked)).await?;
                Ok(())
            }
            RemediationActionType::Delete => {
                connector.delete(target).await?;
                FindingRepo::soft_delete(conn, finding.id).await?;
                Ok(())
            }
            RemediationActionType::Encrypt => {
                connector.encrypt(target, &self.encryption_key_ref).await
            }
            RemediationActionType::Quarantine => Err(Error::connector(
                connector.source_type().as_str(),
                "quarantine is not supported by this connector",
            )),
        }
    }

    /// Reverse a completed action, restoring the captured original value
    pub async fn rollback(&self, action_id: EntityId, actor: &str) -> Result<RemediationAction> {
        let mut conn = self.pool.inner().acquire().await?;
        let action = RemediationRepo::get(&mut conn, action_id)
            .await?
            .ok_or_else(|| Error::not_found(format!("remediation action {action_id}")))?;

        if action.status != RemediationStatus::Completed {
            return Err(Error::state(
                "remediation_action",
                action.status.as_str(),
                RemediationStatus::RolledBack.as_str(),
            ));
        }

        let tenant = TenantContext {
            tenant_id: action.tenant_id,
        };
        let (finding, asset, profile) =
            self.load_context(&mut conn, tenant, action.finding_id).await?;
        let connector = self.registry.connect(&profile).await?;

        if action.action_type == RemediationActionType::Delete
            && !connector.supports_restore_after_delete()
        {
            connector.close().await.ok();
            return Err(Error::connector(
                profile.source_type.as_str(),
                "rollback of DELETE is not supported by this connector",
            ));
        }

        let original = action
            .original_value()
            .ok_or_else(|| Error::internal("rollback token missing from action metadata"))?
            .to_string();

        let mut target = build_target(&asset, &finding);
        // Address the source by the value that was applied, when known
        match action.metadata.get("applied_value").and_then(|v| v.as_str()) {
            Some(applied) => target.match_value = applied.to_string(),
            // Without a record locator or the applied value there is no
            // way to address what the action wrote (e.g. ENCRYPT emits a
            // fresh ciphertext per run); refuse rather than no-op.
            None if target.record_id.is_none() => {
                connector.close().await.ok();
                return Err(Error::connector(
                    profile.source_type.as_str(),
                    "cannot address the applied value for rollback without a record locator",
                ));
            }
            None => {}
        }

        let result = connector.restore_value(&target, &original).await;
        connector.close().await.ok();
        result?;

        if action.action_type == RemediationActionType::Mask {
            FindingRepo::set_masked_value(&mut conn, finding.id, None).await?;
        }
        RemediationRepo::set_effective_until(&mut conn, action.id).await?;
        RemediationRepo::cas_status(
            &mut conn,
            action.id,
            RemediationStatus::Completed,
            RemediationStatus::RolledBack,
            None,
        )
        .await?;
        AuditRepo::record(
            &mut conn,
            &AuditEvent::new("remediation.rolled_back", "remediation_action", "rollback")
                .with_tenant(action.tenant_id)
                .with_user(actor)
                .with_resource(action.id),
        )
        .await?;

        self.sync.enqueue_asset(finding.asset_id);
        info!(action_id = %action.id, "remediation rolled back");

        RemediationRepo::get(&mut conn, action.id)
            .await?
            .ok_or_else(|| Error::internal("remediation action vanished"))
    }

    /// Read-only impact estimate with per-finding before/after samples.
    /// Never writes and requires no confirmation.
    pub async fn preview(
        &self,
        tenant: TenantContext,
        finding_ids: &[EntityId],
        action_type: RemediationActionType,
    ) -> Result<RemediationPreview> {
        let mut conn = self.pool.inner().acquire().await?;

        let mut samples = Vec::with_capacity(finding_ids.len());
        let mut assets = std::collections::BTreeSet::new();
        let mut hosts = std::collections::BTreeSet::new();
        let mut pii_types = std::collections::BTreeSet::new();
        let mut estimated_records = 0i64;

        for finding_id in finding_ids {
            let Some(finding) = FindingRepo::get(&mut conn, tenant, *finding_id).await? else {
                continue;
            };
            let before = finding.matches.first().cloned().unwrap_or_default();
            let after = match action_type {
                RemediationActionType::Mask => mask_value(&finding.pattern_name, &before),
                RemediationActionType::Delete => String::new(),
                RemediationActionType::Encrypt => "[ENCRYPTED]".to_string(),
                RemediationActionType::Quarantine => "[QUARANTINED]".to_string(),
            };
            samples.push(RemediationSample {
                finding_id: *finding_id,
                before,
                after,
            });

            assets.insert(finding.asset_id);
            if let Some(asset) = AssetRepo::get(&mut conn, tenant, finding.asset_id).await? {
                hosts.insert(asset.host);
            }
            if let Some(classification) =
                ClassificationRepo::get_for_finding(&mut conn, *finding_id).await?
            {
                pii_types.insert(classification.classification_type.as_str().to_string());
            }
            estimated_records += i64::from(finding.occurrence_count);
        }

        Ok(RemediationPreview {
            action_type,
            impact: RemediationImpact {
                affected_assets: assets.len() as i64,
                affected_systems: hosts.len() as i64,
                distinct_pii_types: pii_types.into_iter().collect(),
                estimated_records,
            },
            samples,
        })
    }

    /// Action history for an asset or a single finding
    pub async fn history(
        &self,
        tenant: TenantContext,
        asset_id: Option<EntityId>,
        finding_id: Option<EntityId>,
    ) -> Result<Vec<RemediationAction>> {
        let mut conn = self.pool.inner().acquire().await?;
        match (asset_id, finding_id) {
            (Some(asset), _) => RemediationRepo::history_for_asset(&mut conn, tenant, asset).await,
            (None, Some(finding)) => RemediationRepo::history_for_finding(&mut conn, finding).await,
            (None, None) => Err(Error::validation(
                "history requires an asset_id or a finding_id",
            )),
        }
    }

    async fn load_context(
        &self,
        conn: &mut PgConnection,
        tenant: TenantContext,
        finding_id: EntityId,
    ) -> Result<(Finding, Asset, SourceProfile)> {
        let finding = FindingRepo::get(&mut *conn, tenant, finding_id)
            .await?
            .ok_or_else(|| Error::not_found(format!("finding {finding_id}")))?;
        let asset = AssetRepo::get(&mut *conn, tenant, finding.asset_id)
            .await?
            .ok_or_else(|| Error::not_found(format!("asset {}", finding.asset_id)))?;

        let source_type = finding
            .context
            .get("source_type")
            .and_then(|v| v.as_str())
            .map(SourceType::from_str)
            .transpose()?
            .unwrap_or(if asset.asset_type == "table" {
                SourceType::Postgresql
            } else {
                SourceType::Filesystem
            });

        let profile = ProfileRepo::get_for_source(&mut *conn, tenant, source_type)
            .await?
            .ok_or_else(|| {
                Error::not_found(format!("source profile for {source_type}"))
            })?;

        Ok((finding, asset, profile))
    }
}

/// Where the finding's value lives in its source system
fn build_target(asset: &Asset, finding: &Finding) -> RemediationTarget {
    let relational = asset.asset_type == "table";
    RemediationTarget {
        // Relational assets carry `schema.table` as their display name
        path: if relational {
            asset.name.clone()
        } else {
            asset.path.clone()
        },
        field: finding
            .context
            .get("column_name")
            .and_then(|v| v.as_str())
            .map(str::to_string),
        record_id: finding
            .context
            .get("record_id")
            .and_then(|v| v.as_str())
            .map(str::to_string),
        match_value: finding.matches.first().cloned().unwrap_or_default(),
    }
}
