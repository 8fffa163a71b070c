//! Scan run repository and CAS state machine.
//!
//! Status moves only through compare-and-swap updates; zero affected rows
//! is a lost race returned as a state error. Every successful transition
//! writes an immutable scan_state_transitions row.

use chrono::Duration;
use privguard_core::utils::{current_timestamp, generate_uuid};
use privguard_core::{
    EntityId, Error, Page, Paged, Result, ScanFilter, ScanRun, ScanStateTransition, ScanStatus,
    TenantContext,
};
use sqlx::postgres::PgRow;
use sqlx::{PgConnection, Row};
use std::str::FromStr;
use tracing::info;

/// Repository over `scan_runs` and `scan_state_transitions`
pub struct ScanRunRepo;

impl ScanRunRepo {
    pub async fn insert(conn: &mut PgConnection, run: &ScanRun) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO scan_runs
                (id, tenant_id, profile_name, host, status, started_at, completed_at,
                 total_findings, total_assets, metadata, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(run.id)
        .bind(run.tenant_id)
        .bind(&run.profile_name)
        .bind(&run.host)
        .bind(run.status.as_str())
        .bind(run.started_at)
        .bind(run.completed_at)
        .bind(run.total_findings)
        .bind(run.total_assets)
        .bind(&run.metadata)
        .bind(run.created_at)
        .bind(run.updated_at)
        .execute(conn)
        .await?;
        Ok(())
    }

    pub async fn get(
        conn: &mut PgConnection,
        tenant: TenantContext,
        id: EntityId,
    ) -> Result<Option<ScanRun>> {
        let row = sqlx::query(
            r#"
            SELECT * FROM scan_runs
            WHERE id = $1 AND ($2::uuid IS NULL OR tenant_id = $2 OR tenant_id IS NULL)
            "#,
        )
        .bind(id)
        .bind(tenant.tenant_id)
        .fetch_optional(conn)
        .await?;
        row.map(|r| row_to_scan_run(&r)).transpose()
    }

    pub async fn list(
        conn: &mut PgConnection,
        tenant: TenantContext,
        filter: &ScanFilter,
        page: Page,
    ) -> Result<Paged<ScanRun>> {
        let status = filter.status.map(|s| s.as_str().to_string());

        let total: i64 = sqlx::query(
            r#"
            SELECT count(*) AS n FROM scan_runs
            WHERE ($1::uuid IS NULL OR tenant_id = $1 OR tenant_id IS NULL)
              AND ($2::text IS NULL OR status = $2)
              AND ($3::text IS NULL OR profile_name = $3)
              AND ($4::text IS NULL OR host = $4)
            "#,
        )
        .bind(tenant.tenant_id)
        .bind(status.as_deref())
        .bind(filter.profile_name.as_deref())
        .bind(filter.host.as_deref())
        .fetch_one(&mut *conn)
        .await?
        .try_get("n")?;

        let rows = sqlx::query(
            r#"
            SELECT * FROM scan_runs
            WHERE ($1::uuid IS NULL OR tenant_id = $1 OR tenant_id IS NULL)
              AND ($2::text IS NULL OR status = $2)
              AND ($3::text IS NULL OR profile_name = $3)
              AND ($4::text IS NULL OR host = $4)
            ORDER BY started_at DESC
            LIMIT $5 OFFSET $6
            "#,
        )
        .bind(tenant.tenant_id)
        .bind(status.as_deref())
        .bind(filter.profile_name.as_deref())
        .bind(filter.host.as_deref())
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(conn)
        .await?;

        let items = rows
            .iter()
            .map(row_to_scan_run)
            .collect::<Result<Vec<_>>>()?;
        Ok(Paged::new(items, total, page))
    }

    /// Overwrite batch totals after the ingestion loop
    pub async fn update_totals(
        conn: &mut PgConnection,
        id: EntityId,
        total_findings: i64,
        total_assets: i64,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE scan_runs SET total_findings = $2, total_assets = $3, updated_at = now() WHERE id = $1",
        )
        .bind(id)
        .bind(total_findings)
        .bind(total_assets)
        .execute(conn)
        .await?;
        Ok(())
    }

    /// Merge keys into the run's metadata map
    pub async fn merge_metadata(
        conn: &mut PgConnection,
        id: EntityId,
        patch: &serde_json::Value,
    ) -> Result<()> {
        sqlx::query("UPDATE scan_runs SET metadata = metadata || $2, updated_at = now() WHERE id = $1")
            .bind(id)
            .bind(patch)
            .execute(conn)
            .await?;
        Ok(())
    }

    /// CAS transition `(id, from -> to)`. A lost race or an illegal edge
    /// returns a state error and mutates nothing.
    pub async fn transition(
        conn: &mut PgConnection,
        id: EntityId,
        from: ScanStatus,
        to: ScanStatus,
        by: Option<&str>,
    ) -> Result<()> {
        if !from.can_transition_to(to) {
            return Err(Error::state("scan_run", from.as_str(), to.as_str()));
        }

        let result = sqlx::query(
            r#"
            UPDATE scan_runs
            SET status = $3,
                updated_at = now(),
                completed_at = CASE WHEN $3 IN ('completed', 'failed', 'timeout')
                                    THEN now() ELSE completed_at END,
                cancelled_at = CASE WHEN $3 = 'cancelled' THEN now() ELSE cancelled_at END,
                cancelled_by = CASE WHEN $3 = 'cancelled' THEN $4 ELSE cancelled_by END
            WHERE id = $1 AND status = $2
            "#,
        )
        .bind(id)
        .bind(from.as_str())
        .bind(to.as_str())
        .bind(by)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::state("scan_run", from.as_str(), to.as_str()));
        }

        Self::record_transition(conn, id, from, to, by).await?;
        Ok(())
    }

    async fn record_transition(
        conn: &mut PgConnection,
        scan_run_id: EntityId,
        from: ScanStatus,
        to: ScanStatus,
        by: Option<&str>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO scan_state_transitions
                (id, scan_run_id, from_status, to_status, transitioned_at, transitioned_by)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(generate_uuid())
        .bind(scan_run_id)
        .bind(from.as_str())
        .bind(to.as_str())
        .bind(current_timestamp())
        .bind(by)
        .execute(conn)
        .await?;
        Ok(())
    }

    /// Cancel a pending or running scan, recording the actor
    pub async fn cancel(
        conn: &mut PgConnection,
        tenant: TenantContext,
        id: EntityId,
        by: &str,
    ) -> Result<()> {
        let run = Self::get(&mut *conn, tenant, id)
            .await?
            .ok_or_else(|| Error::not_found(format!("scan run {id}")))?;
        Self::transition(conn, id, run.status, ScanStatus::Cancelled, Some(by)).await
    }

    pub async fn transitions(
        conn: &mut PgConnection,
        scan_run_id: EntityId,
    ) -> Result<Vec<ScanStateTransition>> {
        let rows = sqlx::query(
            "SELECT * FROM scan_state_transitions WHERE scan_run_id = $1 ORDER BY transitioned_at",
        )
        .bind(scan_run_id)
        .fetch_all(conn)
        .await?;

        rows.iter()
            .map(|r| {
                Ok(ScanStateTransition {
                    id: r.try_get("id")?,
                    scan_run_id: r.try_get("scan_run_id")?,
                    from_status: ScanStatus::from_str(r.try_get::<String, _>("from_status")?.as_str())?,
                    to_status: ScanStatus::from_str(r.try_get::<String, _>("to_status")?.as_str())?,
                    transitioned_at: r.try_get("transitioned_at")?,
                    transitioned_by: r.try_get("transitioned_by")?,
                })
            })
            .collect()
    }

    /// Mark over-age running scans as timed out. Each run transitions at
    /// most once: the CAS guards against concurrent sweepers. Returns the
    /// ids that were transitioned by this sweep.
    pub async fn sweep_timeouts(
        conn: &mut PgConnection,
        default_timeout_minutes: i64,
    ) -> Result<Vec<EntityId>> {
        let rows = sqlx::query("SELECT id, started_at, metadata FROM scan_runs WHERE status = 'running'")
            .fetch_all(&mut *conn)
            .await?;

        let now = current_timestamp();
        let mut timed_out = Vec::new();
        for row in rows {
            let id: EntityId = row.try_get("id")?;
            let started_at: privguard_core::Timestamp = row.try_get("started_at")?;
            let metadata: serde_json::Value = row.try_get("metadata")?;
            let timeout_minutes = metadata
                .get("timeout_minutes")
                .and_then(|v| v.as_i64())
                .unwrap_or(default_timeout_minutes);

            if now - started_at > Duration::minutes(timeout_minutes) {
                match Self::transition(
                    &mut *conn,
                    id,
                    ScanStatus::Running,
                    ScanStatus::Timeout,
                    Some("sweeper"),
                )
                .await
                {
                    Ok(()) => {
                        info!(scan_id = %id, timeout_minutes, "scan timed out");
                        timed_out.push(id);
                    }
                    // Lost the CAS to a concurrent transition: already handled
                    Err(Error::State { .. }) => {}
                    Err(e) => return Err(e),
                }
            }
        }
        Ok(timed_out)
    }
}

fn row_to_scan_run(row: &PgRow) -> Result<ScanRun> {
    Ok(ScanRun {
        id: row.try_get("id")?,
        tenant_id: row.try_get("tenant_id")?,
        profile_name: row.try_get("profile_name")?,
        host: row.try_get("host")?,
        status: ScanStatus::from_str(row.try_get::<String, _>("status")?.as_str())?,
        started_at: row.try_get("started_at")?,
        completed_at: row.try_get("completed_at")?,
        total_findings: row.try_get("total_findings")?,
        total_assets: row.try_get("total_assets")?,
        metadata: row.try_get("metadata")?,
        cancelled_at: row.try_get("cancelled_at")?,
        cancelled_by: row.try_get("cancelled_by")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
