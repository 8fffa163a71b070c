//! Finding repository.
//!
//! The dedup invariant lives in the unique index on (asset_id,
//! pattern_name, normalized_value_hash, scan_run_id); a violation is not
//! an error but a converged duplicate, surfaced as an insert outcome.

use privguard_core::types::Severity;
use privguard_core::{
    EntityId, Finding, FindingFilter, Page, Paged, PiiSummaryRow, Result, TenantContext,
};
use sqlx::postgres::PgRow;
use sqlx::{PgConnection, Row};
use std::str::FromStr;

/// Repository over `findings`
pub struct FindingRepo;

/// Outcome of a finding insert attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FindingInsert {
    Inserted,
    /// Dedup unique index hit: the candidate is silently skipped
    Duplicate,
}

impl FindingRepo {
    pub async fn insert(conn: &mut PgConnection, finding: &Finding) -> Result<FindingInsert> {
        let result = sqlx::query(
            r#"
            INSERT INTO findings
                (id, tenant_id, scan_run_id, asset_id, pattern_id, pattern_name, matches,
                 sample_text, severity, confidence_score, enrichment_score, enrichment_signals,
                 enrichment_failed, context, masked_value, normalized_value_hash,
                 occurrence_count, risk_score, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19)
            "#,
        )
        .bind(finding.id)
        .bind(finding.tenant_id)
        .bind(finding.scan_run_id)
        .bind(finding.asset_id)
        .bind(finding.pattern_id)
        .bind(&finding.pattern_name)
        .bind(&finding.matches)
        .bind(finding.sample_text.as_deref())
        .bind(finding.severity.as_str())
        .bind(finding.confidence_score)
        .bind(finding.enrichment_score)
        .bind(&finding.enrichment_signals)
        .bind(finding.enrichment_failed)
        .bind(&finding.context)
        .bind(finding.masked_value.as_deref())
        .bind(&finding.normalized_value_hash)
        .bind(finding.occurrence_count)
        .bind(finding.risk_score)
        .bind(finding.created_at)
        .execute(conn)
        .await;

        match result {
            Ok(_) => Ok(FindingInsert::Inserted),
            Err(e) if crate::pool::is_unique_violation(&e) => Ok(FindingInsert::Duplicate),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn get(
        conn: &mut PgConnection,
        tenant: TenantContext,
        id: EntityId,
    ) -> Result<Option<Finding>> {
        let row = sqlx::query(
            r#"
            SELECT * FROM findings
            WHERE id = $1 AND ($2::uuid IS NULL OR tenant_id = $2 OR tenant_id IS NULL)
            "#,
        )
        .bind(id)
        .bind(tenant.tenant_id)
        .fetch_optional(conn)
        .await?;
        row.map(|r| row_to_finding(&r)).transpose()
    }

    pub async fn list(
        conn: &mut PgConnection,
        tenant: TenantContext,
        filter: &FindingFilter,
        page: Page,
    ) -> Result<Paged<Finding>> {
        let severity = filter.severity.map(|s| s.as_str().to_string());

        let total: i64 = sqlx::query(
            r#"
            SELECT count(*) AS n FROM findings
            WHERE ($1::uuid IS NULL OR tenant_id = $1 OR tenant_id IS NULL)
              AND ($2::uuid IS NULL OR scan_run_id = $2)
              AND ($3::uuid IS NULL OR asset_id = $3)
              AND ($4::text IS NULL OR pattern_name = $4)
              AND ($5::text IS NULL OR severity = $5)
              AND ($6::bool OR deleted_at IS NULL)
            "#,
        )
        .bind(tenant.tenant_id)
        .bind(filter.scan_run_id)
        .bind(filter.asset_id)
        .bind(filter.pattern_name.as_deref())
        .bind(severity.as_deref())
        .bind(filter.include_deleted)
        .fetch_one(&mut *conn)
        .await?
        .try_get("n")?;

        let rows = sqlx::query(
            r#"
            SELECT * FROM findings
            WHERE ($1::uuid IS NULL OR tenant_id = $1 OR tenant_id IS NULL)
              AND ($2::uuid IS NULL OR scan_run_id = $2)
              AND ($3::uuid IS NULL OR asset_id = $3)
              AND ($4::text IS NULL OR pattern_name = $4)
              AND ($5::text IS NULL OR severity = $5)
              AND ($6::bool OR deleted_at IS NULL)
            ORDER BY risk_score DESC, created_at DESC
            LIMIT $7 OFFSET $8
            "#,
        )
        .bind(tenant.tenant_id)
        .bind(filter.scan_run_id)
        .bind(filter.asset_id)
        .bind(filter.pattern_name.as_deref())
        .bind(severity.as_deref())
        .bind(filter.include_deleted)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(conn)
        .await?;

        let items = rows.iter().map(row_to_finding).collect::<Result<Vec<_>>>()?;
        Ok(Paged::new(items, total, page))
    }

    /// Record (or clear, on rollback) the masked rendition of the value
    pub async fn set_masked_value(
        conn: &mut PgConnection,
        id: EntityId,
        masked: Option<&str>,
    ) -> Result<()> {
        sqlx::query("UPDATE findings SET masked_value = $2 WHERE id = $1")
            .bind(id)
            .bind(masked)
            .execute(conn)
            .await?;
        Ok(())
    }

    pub async fn soft_delete(conn: &mut PgConnection, id: EntityId) -> Result<()> {
        sqlx::query("UPDATE findings SET deleted_at = now() WHERE id = $1")
            .bind(id)
            .execute(conn)
            .await?;
        Ok(())
    }

    /// Distinct assets touched by one scan run
    pub async fn assets_for_scan(
        conn: &mut PgConnection,
        scan_run_id: EntityId,
    ) -> Result<Vec<EntityId>> {
        let rows = sqlx::query("SELECT DISTINCT asset_id FROM findings WHERE scan_run_id = $1")
            .bind(scan_run_id)
            .fetch_all(conn)
            .await?;
        rows.iter()
            .map(|r| Ok(r.try_get("asset_id")?))
            .collect()
    }

    /// Per-PII-type totals across the tenant's live findings: finding
    /// count, affected assets and systems, average confidence.
    pub async fn pii_summary(
        conn: &mut PgConnection,
        tenant: TenantContext,
    ) -> Result<Vec<PiiSummaryRow>> {
        let rows = sqlx::query(
            r#"
            SELECT c.classification_type AS pii_type,
                   count(*) AS findings,
                   count(DISTINCT f.asset_id) AS affected_assets,
                   count(DISTINCT a.host) AS affected_systems,
                   avg(f.confidence_score) AS avg_confidence
            FROM findings f
            JOIN classifications c ON c.finding_id = f.id
            JOIN assets a ON a.id = f.asset_id
            WHERE f.deleted_at IS NULL
              AND ($1::uuid IS NULL OR f.tenant_id = $1 OR f.tenant_id IS NULL)
            GROUP BY c.classification_type
            ORDER BY findings DESC
            "#,
        )
        .bind(tenant.tenant_id)
        .fetch_all(conn)
        .await?;

        rows.iter()
            .map(|r| {
                Ok(PiiSummaryRow {
                    pii_type: r.try_get("pii_type")?,
                    findings: r.try_get("findings")?,
                    affected_assets: r.try_get("affected_assets")?,
                    affected_systems: r.try_get("affected_systems")?,
                    avg_confidence: r.try_get::<Option<f64>, _>("avg_confidence")?.unwrap_or(0.0),
                })
            })
            .collect()
    }
}

fn row_to_finding(row: &PgRow) -> Result<Finding> {
    Ok(Finding {
        id: row.try_get("id")?,
        tenant_id: row.try_get("tenant_id")?,
        scan_run_id: row.try_get("scan_run_id")?,
        asset_id: row.try_get("asset_id")?,
        pattern_id: row.try_get("pattern_id")?,
        pattern_name: row.try_get("pattern_name")?,
        matches: row.try_get("matches")?,
        sample_text: row.try_get("sample_text")?,
        severity: Severity::from_str(row.try_get::<String, _>("severity")?.as_str())?,
        confidence_score: row.try_get("confidence_score")?,
        enrichment_score: row.try_get("enrichment_score")?,
        enrichment_signals: row.try_get("enrichment_signals")?,
        enrichment_failed: row.try_get("enrichment_failed")?,
        context: row.try_get("context")?,
        masked_value: row.try_get("masked_value")?,
        normalized_value_hash: row.try_get("normalized_value_hash")?,
        occurrence_count: row.try_get("occurrence_count")?,
        risk_score: row.try_get("risk_score")?,
        deleted_at: row.try_get("deleted_at")?,
        created_at: row.try_get("created_at")?,
    })
}
