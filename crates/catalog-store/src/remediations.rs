//! Remediation action repository.
//!
//! Status moves only through CAS updates, serializing concurrent
//! remediation of the same finding.

use privguard_core::types::{RemediationActionType, RemediationStatus};
use privguard_core::{EntityId, Error, RemediationAction, Result, TenantContext};
use sqlx::postgres::PgRow;
use sqlx::{PgConnection, Row};
use std::str::FromStr;

/// Repository over `remediation_actions`
pub struct RemediationRepo;

impl RemediationRepo {
    pub async fn insert(conn: &mut PgConnection, action: &RemediationAction) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO remediation_actions
                (id, tenant_id, finding_id, action_type, executed_by, executed_at,
                 effective_from, effective_until, rollback_reference, status, error_detail,
                 metadata, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(action.id)
        .bind(action.tenant_id)
        .bind(action.finding_id)
        .bind(action.action_type.as_str())
        .bind(&action.executed_by)
        .bind(action.executed_at)
        .bind(action.effective_from)
        .bind(action.effective_until)
        .bind(action.rollback_reference)
        .bind(action.status.as_str())
        .bind(action.error_detail.as_deref())
        .bind(&action.metadata)
        .bind(action.created_at)
        .execute(conn)
        .await?;
        Ok(())
    }

    pub async fn get(conn: &mut PgConnection, id: EntityId) -> Result<Option<RemediationAction>> {
        let row = sqlx::query("SELECT * FROM remediation_actions WHERE id = $1")
            .bind(id)
            .fetch_optional(conn)
            .await?;
        row.map(|r| row_to_action(&r)).transpose()
    }

    /// CAS status move. Zero affected rows is a lost race or an illegal
    /// edge; both come back as a state error with nothing mutated.
    pub async fn cas_status(
        conn: &mut PgConnection,
        id: EntityId,
        from: RemediationStatus,
        to: RemediationStatus,
        error_detail: Option<&str>,
    ) -> Result<()> {
        if !from.can_transition_to(to) {
            return Err(Error::state("remediation_action", from.as_str(), to.as_str()));
        }

        let result = sqlx::query(
            r#"
            UPDATE remediation_actions
            SET status = $3,
                error_detail = COALESCE($4, error_detail),
                executed_at = CASE WHEN $3 = 'COMPLETED' THEN now() ELSE executed_at END,
                effective_from = CASE WHEN $3 = 'COMPLETED' THEN now() ELSE effective_from END
            WHERE id = $1 AND status = $2
            "#,
        )
        .bind(id)
        .bind(from.as_str())
        .bind(to.as_str())
        .bind(error_detail)
        .execute(conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::state("remediation_action", from.as_str(), to.as_str()));
        }
        Ok(())
    }

    /// Close the action's effective window on rollback
    pub async fn set_effective_until(conn: &mut PgConnection, id: EntityId) -> Result<()> {
        sqlx::query("UPDATE remediation_actions SET effective_until = now() WHERE id = $1")
            .bind(id)
            .execute(conn)
            .await?;
        Ok(())
    }

    /// Action history for a finding, newest first
    pub async fn history_for_finding(
        conn: &mut PgConnection,
        finding_id: EntityId,
    ) -> Result<Vec<RemediationAction>> {
        let rows = sqlx::query(
            "SELECT * FROM remediation_actions WHERE finding_id = $1 ORDER BY created_at DESC",
        )
        .bind(finding_id)
        .fetch_all(conn)
        .await?;
        rows.iter().map(row_to_action).collect()
    }

    /// Action history for every finding on an asset, newest first
    pub async fn history_for_asset(
        conn: &mut PgConnection,
        tenant: TenantContext,
        asset_id: EntityId,
    ) -> Result<Vec<RemediationAction>> {
        let rows = sqlx::query(
            r#"
            SELECT r.* FROM remediation_actions r
            JOIN findings f ON f.id = r.finding_id
            WHERE f.asset_id = $1
              AND ($2::uuid IS NULL OR r.tenant_id = $2 OR r.tenant_id IS NULL)
            ORDER BY r.created_at DESC
            "#,
        )
        .bind(asset_id)
        .bind(tenant.tenant_id)
        .fetch_all(conn)
        .await?;
        rows.iter().map(row_to_action).collect()
    }
}

fn row_to_action(row: &PgRow) -> Result<RemediationAction> {
    Ok(RemediationAction {
        id: row.try_get("id")?,
        tenant_id: row.try_get("tenant_id")?,
        finding_id: row.try_get("finding_id")?,
        action_type: RemediationActionType::from_str(
            row.try_get::<String, _>("action_type")?.as_str(),
        )?,
        executed_by: row.try_get("executed_by")?,
        executed_at: row.try_get("executed_at")?,
        effective_from: row.try_get("effective_from")?,
        effective_until: row.try_get("effective_until")?,
        rollback_reference: row.try_get("rollback_reference")?,
        status: RemediationStatus::from_str(row.try_get::<String, _>("status")?.as_str())?,
        error_detail: row.try_get("error_detail")?,
        metadata: row.try_get("metadata")?,
        created_at: row.try_get("created_at")?,
    })
}
