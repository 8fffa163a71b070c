//! Source profile repository.
//!
//! Connection configuration is stored encrypted in the `connections`
//! table; decryption happens only inside the remediation orchestrator.

use privguard_core::types::{SourceType, ValidationStatus};
use privguard_core::{EntityId, Result, SourceProfile, TenantContext};
use sqlx::postgres::PgRow;
use sqlx::{PgConnection, Row};
use std::str::FromStr;

/// Repository over `connections`
pub struct ProfileRepo;

impl ProfileRepo {
    pub async fn insert(conn: &mut PgConnection, profile: &SourceProfile) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO connections
                (id, tenant_id, name, source_type, encrypted_config, validation_status,
                 disabled_at, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(profile.id)
        .bind(profile.tenant_id)
        .bind(&profile.name)
        .bind(profile.source_type.as_str())
        .bind(&profile.encrypted_config)
        .bind(profile.validation_status.as_str())
        .bind(profile.disabled_at)
        .bind(profile.created_at)
        .bind(profile.updated_at)
        .execute(conn)
        .await?;
        Ok(())
    }

    pub async fn get(conn: &mut PgConnection, id: EntityId) -> Result<Option<SourceProfile>> {
        let row = sqlx::query("SELECT * FROM connections WHERE id = $1")
            .bind(id)
            .fetch_optional(conn)
            .await?;
        row.map(|r| row_to_profile(&r)).transpose()
    }

    /// Active profile for a source type within the tenant scope
    pub async fn get_for_source(
        conn: &mut PgConnection,
        tenant: TenantContext,
        source_type: SourceType,
    ) -> Result<Option<SourceProfile>> {
        let row = sqlx::query(
            r#"
            SELECT * FROM connections
            WHERE source_type = $1
              AND disabled_at IS NULL
              AND ($2::uuid IS NULL OR tenant_id = $2 OR tenant_id IS NULL)
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(source_type.as_str())
        .bind(tenant.tenant_id)
        .fetch_optional(conn)
        .await?;
        row.map(|r| row_to_profile(&r)).transpose()
    }

    pub async fn set_validation_status(
        conn: &mut PgConnection,
        id: EntityId,
        status: ValidationStatus,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE connections SET validation_status = $2, updated_at = now() WHERE id = $1",
        )
        .bind(id)
        .bind(status.as_str())
        .execute(conn)
        .await?;
        Ok(())
    }

    /// Soft-disable a profile
    pub async fn disable(conn: &mut PgConnection, id: EntityId) -> Result<()> {
        sqlx::query("UPDATE connections SET disabled_at = now(), updated_at = now() WHERE id = $1")
            .bind(id)
            .execute(conn)
            .await?;
        Ok(())
    }
}

fn row_to_profile(row: &PgRow) -> Result<SourceProfile> {
    Ok(SourceProfile {
        id: row.try_get("id")?,
        tenant_id: row.try_get("tenant_id")?,
        name: row.try_get("name")?,
        source_type: SourceType::from_str(row.try_get::<String, _>("source_type")?.as_str())?,
        encrypted_config: row.try_get("encrypted_config")?,
        validation_status: ValidationStatus::from_str(
            row.try_get::<String, _>("validation_status")?.as_str(),
        )?,
        disabled_at: row.try_get("disabled_at")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
