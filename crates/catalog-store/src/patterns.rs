//! Pattern repository. Patterns are recorded as seen, never evaluated.

use privguard_core::utils::{current_timestamp, generate_uuid};
use privguard_core::{Pattern, Result, TenantContext};
use sqlx::postgres::PgRow;
use sqlx::{PgConnection, Row};

/// Repository over `patterns`
pub struct PatternRepo;

impl PatternRepo {
    /// Resolve a tenant-scoped pattern by name, inserting it on first
    /// sight. A uniqueness race falls back to the winning row.
    pub async fn resolve_or_insert(
        conn: &mut PgConnection,
        tenant: TenantContext,
        name: &str,
        category: &str,
    ) -> Result<Pattern> {
        if let Some(existing) = Self::get_by_name(&mut *conn, tenant, name).await? {
            return Ok(existing);
        }

        let pattern = Pattern {
            id: generate_uuid(),
            tenant_id: tenant.tenant_id,
            name: name.to_string(),
            pattern_type: "scanner".to_string(),
            category: category.to_string(),
            description: None,
            definition: None,
            is_active: true,
            created_at: current_timestamp(),
        };

        let result = sqlx::query(
            r#"
            INSERT INTO patterns
                (id, tenant_id, name, pattern_type, category, description, definition, is_active, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(pattern.id)
        .bind(pattern.tenant_id)
        .bind(&pattern.name)
        .bind(&pattern.pattern_type)
        .bind(&pattern.category)
        .bind(pattern.description.as_deref())
        .bind(pattern.definition.as_deref())
        .bind(pattern.is_active)
        .bind(pattern.created_at)
        .execute(&mut *conn)
        .await;

        match result {
            Ok(_) => Ok(pattern),
            Err(e) if crate::pool::is_unique_violation(&e) => {
                Self::get_by_name(conn, tenant, name)
                    .await?
                    .ok_or_else(|| privguard_core::Error::internal("pattern vanished after race"))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn get_by_name(
        conn: &mut PgConnection,
        tenant: TenantContext,
        name: &str,
    ) -> Result<Option<Pattern>> {
        let row = sqlx::query(
            r#"
            SELECT * FROM patterns
            WHERE name = $1
              AND COALESCE(tenant_id::text, '') = COALESCE($2::uuid::text, '')
            "#,
        )
        .bind(name)
        .bind(tenant.tenant_id)
        .fetch_optional(conn)
        .await?;
        row.map(|r| row_to_pattern(&r)).transpose()
    }

}

fn row_to_pattern(row: &PgRow) -> Result<Pattern> {
    Ok(Pattern {
        id: row.try_get("id")?,
        tenant_id: row.try_get("tenant_id")?,
        name: row.try_get("name")?,
        pattern_type: row.try_get("pattern_type")?,
        category: row.try_get("category")?,
        description: row.try_get("description")?,
        definition: row.try_get("definition")?,
        is_active: row.try_get("is_active")?,
        created_at: row.try_get("created_at")?,
    })
}
