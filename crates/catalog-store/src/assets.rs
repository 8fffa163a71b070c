//! Asset repository.
//!
//! Asset identity is owned by the Asset Manager; this repository exposes
//! the raw operations it builds on. Creation races resolve through the
//! unique (tenant, stable_id) index, never through application locks.

use privguard_core::types::{ClassificationType, Environment, Severity};
use privguard_core::{
    Asset, AssetFilter, AssetFindingStats, EntityId, Page, Paged, PiiTypeAggregate, Result,
    TenantContext,
};
use sqlx::postgres::PgRow;
use sqlx::{PgConnection, Row};
use std::str::FromStr;

/// Repository over `assets`
pub struct AssetRepo;

/// Outcome of an asset insert attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted(EntityId),
    /// Unique (tenant, stable_id) violation: another writer owns the row
    StableIdTaken,
}

impl AssetRepo {
    /// Insert a new asset row. A stable-id uniqueness hit is reported as
    /// `StableIdTaken` so the caller can re-read and converge.
    pub async fn insert(conn: &mut PgConnection, asset: &Asset) -> Result<InsertOutcome> {
        let result = sqlx::query(
            r#"
            INSERT INTO assets
                (id, tenant_id, stable_id, asset_type, name, path, data_source, host,
                 environment, owner, source_system, metadata, risk_score, total_findings,
                 is_masked, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            "#,
        )
        .bind(asset.id)
        .bind(asset.tenant_id)
        .bind(&asset.stable_id)
        .bind(&asset.asset_type)
        .bind(&asset.name)
        .bind(&asset.path)
        .bind(&asset.data_source)
        .bind(&asset.host)
        .bind(asset.environment.as_str())
        .bind(asset.owner.as_deref())
        .bind(asset.source_system.as_deref())
        .bind(&asset.metadata)
        .bind(asset.risk_score)
        .bind(asset.total_findings)
        .bind(asset.is_masked)
        .bind(asset.created_at)
        .bind(asset.updated_at)
        .execute(conn)
        .await;

        match result {
            Ok(_) => Ok(InsertOutcome::Inserted(asset.id)),
            Err(e) if crate::pool::is_unique_violation(&e) => Ok(InsertOutcome::StableIdTaken),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn get(
        conn: &mut PgConnection,
        tenant: TenantContext,
        id: EntityId,
    ) -> Result<Option<Asset>> {
        let row = sqlx::query(
            r#"
            SELECT * FROM assets
            WHERE id = $1 AND ($2::uuid IS NULL OR tenant_id = $2 OR tenant_id IS NULL)
            "#,
        )
        .bind(id)
        .bind(tenant.tenant_id)
        .fetch_optional(conn)
        .await?;
        row.map(|r| row_to_asset(&r)).transpose()
    }

    pub async fn get_by_stable_id(
        conn: &mut PgConnection,
        tenant: TenantContext,
        stable_id: &str,
    ) -> Result<Option<Asset>> {
        let row = sqlx::query(
            r#"
            SELECT * FROM assets
            WHERE stable_id = $1
              AND COALESCE(tenant_id::text, '') = COALESCE($2::uuid::text, '')
            "#,
        )
        .bind(stable_id)
        .bind(tenant.tenant_id)
        .fetch_optional(conn)
        .await?;
        row.map(|r| row_to_asset(&r)).transpose()
    }

    pub async fn list(
        conn: &mut PgConnection,
        tenant: TenantContext,
        filter: &AssetFilter,
        page: Page,
    ) -> Result<Paged<Asset>> {
        let total: i64 = sqlx::query(
            r#"
            SELECT count(*) AS n FROM assets
            WHERE ($1::uuid IS NULL OR tenant_id = $1 OR tenant_id IS NULL)
              AND ($2::text IS NULL OR asset_type = $2)
              AND ($3::text IS NULL OR host = $3)
              AND ($4::text IS NULL OR environment = $4)
              AND ($5::int IS NULL OR risk_score >= $5)
              AND ($6::bool OR deleted_at IS NULL)
            "#,
        )
        .bind(tenant.tenant_id)
        .bind(filter.asset_type.as_deref())
        .bind(filter.host.as_deref())
        .bind(filter.environment.as_deref())
        .bind(filter.min_risk)
        .bind(filter.include_deleted)
        .fetch_one(&mut *conn)
        .await?
        .try_get("n")?;

        let rows = sqlx::query(
            r#"
            SELECT * FROM assets
            WHERE ($1::uuid IS NULL OR tenant_id = $1 OR tenant_id IS NULL)
              AND ($2::text IS NULL OR asset_type = $2)
              AND ($3::text IS NULL OR host = $3)
              AND ($4::text IS NULL OR environment = $4)
              AND ($5::int IS NULL OR risk_score >= $5)
              AND ($6::bool OR deleted_at IS NULL)
            ORDER BY risk_score DESC, updated_at DESC
            LIMIT $7 OFFSET $8
            "#,
        )
        .bind(tenant.tenant_id)
        .bind(filter.asset_type.as_deref())
        .bind(filter.host.as_deref())
        .bind(filter.environment.as_deref())
        .bind(filter.min_risk)
        .bind(filter.include_deleted)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(conn)
        .await?;

        let items = rows.iter().map(row_to_asset).collect::<Result<Vec<_>>>()?;
        Ok(Paged::new(items, total, page))
    }

    /// Unconditional overwrite of the aggregated stats
    pub async fn update_stats(
        conn: &mut PgConnection,
        id: EntityId,
        risk_score: i32,
        total_findings: i64,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE assets SET risk_score = $2, total_findings = $3, updated_at = now() WHERE id = $1",
        )
        .bind(id)
        .bind(risk_score)
        .bind(total_findings)
        .execute(conn)
        .await?;
        Ok(())
    }

    pub async fn soft_delete(conn: &mut PgConnection, id: EntityId) -> Result<()> {
        sqlx::query("UPDATE assets SET deleted_at = now(), updated_at = now() WHERE id = $1")
            .bind(id)
            .execute(conn)
            .await?;
        Ok(())
    }

    /// Live-finding statistics for risk recomputation and graph sync
    pub async fn finding_stats(
        conn: &mut PgConnection,
        asset_id: EntityId,
    ) -> Result<AssetFindingStats> {
        let total: i64 = sqlx::query(
            "SELECT count(*) AS n FROM findings WHERE asset_id = $1 AND deleted_at IS NULL",
        )
        .bind(asset_id)
        .fetch_one(&mut *conn)
        .await?
        .try_get("n")?;

        let rows = sqlx::query(
            r#"
            SELECT c.classification_type AS ctype,
                   count(*) AS cnt,
                   avg(f.confidence_score) AS avg_conf,
                   max(CASE f.severity
                        WHEN 'critical' THEN 4
                        WHEN 'high' THEN 3
                        WHEN 'medium' THEN 2
                        ELSE 1 END) AS max_sev
            FROM findings f
            JOIN classifications c ON c.finding_id = f.id
            WHERE f.asset_id = $1 AND f.deleted_at IS NULL
            GROUP BY c.classification_type
            "#,
        )
        .bind(asset_id)
        .fetch_all(conn)
        .await?;

        let by_type = rows
            .iter()
            .map(|r| {
                let ctype = ClassificationType::from_str(r.try_get::<String, _>("ctype")?.as_str())?;
                let max_sev = match r.try_get::<i32, _>("max_sev")? {
                    4 => Severity::Critical,
                    3 => Severity::High,
                    2 => Severity::Medium,
                    _ => Severity::Low,
                };
                Ok(PiiTypeAggregate {
                    classification_type: ctype,
                    finding_count: r.try_get("cnt")?,
                    avg_confidence: r.try_get::<Option<f64>, _>("avg_conf")?.unwrap_or(0.0),
                    max_severity: max_sev,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(AssetFindingStats {
            total_findings: total,
            by_type,
        })
    }
}

fn row_to_asset(row: &PgRow) -> Result<Asset> {
    Ok(Asset {
        id: row.try_get("id")?,
        tenant_id: row.try_get("tenant_id")?,
        stable_id: row.try_get("stable_id")?,
        asset_type: row.try_get("asset_type")?,
        name: row.try_get("name")?,
        path: row.try_get("path")?,
        data_source: row.try_get("data_source")?,
        host: row.try_get("host")?,
        environment: Environment::from_str(row.try_get::<String, _>("environment")?.as_str())?,
        owner: row.try_get("owner")?,
        source_system: row.try_get("source_system")?,
        metadata: row.try_get("metadata")?,
        risk_score: row.try_get("risk_score")?,
        total_findings: row.try_get("total_findings")?,
        is_masked: row.try_get("is_masked")?,
        masking_strategy: row.try_get("masking_strategy")?,
        masked_at: row.try_get("masked_at")?,
        deleted_at: row.try_get("deleted_at")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
