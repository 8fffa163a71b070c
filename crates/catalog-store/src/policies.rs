//! Policy, policy execution, and consent repositories.

use privguard_core::{ConsentRecord, Policy, PolicyExecution, Result, TenantContext};
use sqlx::postgres::PgRow;
use sqlx::{PgConnection, Row};

/// Repository over `policies`, `policy_executions`, and `consent_records`
pub struct PolicyRepo;

impl PolicyRepo {
    pub async fn insert(conn: &mut PgConnection, policy: &Policy) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO policies (id, tenant_id, name, description, conditions, actions, is_active, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(policy.id)
        .bind(policy.tenant_id)
        .bind(&policy.name)
        .bind(policy.description.as_deref())
        .bind(&policy.conditions)
        .bind(&policy.actions)
        .bind(policy.is_active)
        .bind(policy.created_at)
        .execute(conn)
        .await?;
        Ok(())
    }

    pub async fn get(
        conn: &mut PgConnection,
        tenant: TenantContext,
        id: privguard_core::EntityId,
    ) -> Result<Option<Policy>> {
        let row = sqlx::query(
            r#"
            SELECT * FROM policies
            WHERE id = $1 AND ($2::uuid IS NULL OR tenant_id = $2 OR tenant_id IS NULL)
            "#,
        )
        .bind(id)
        .bind(tenant.tenant_id)
        .fetch_optional(conn)
        .await?;
        row.map(|r| row_to_policy(&r)).transpose()
    }

    pub async fn list_active(
        conn: &mut PgConnection,
        tenant: TenantContext,
    ) -> Result<Vec<Policy>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM policies
            WHERE is_active
              AND ($1::uuid IS NULL OR tenant_id = $1 OR tenant_id IS NULL)
            ORDER BY created_at
            "#,
        )
        .bind(tenant.tenant_id)
        .fetch_all(conn)
        .await?;
        rows.iter().map(row_to_policy).collect()
    }

    pub async fn record_execution(
        conn: &mut PgConnection,
        execution: &PolicyExecution,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO policy_executions (id, policy_id, finding_id, outcome, detail, executed_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(execution.id)
        .bind(execution.policy_id)
        .bind(execution.finding_id)
        .bind(&execution.outcome)
        .bind(execution.detail.as_deref())
        .bind(execution.executed_at)
        .execute(conn)
        .await?;
        Ok(())
    }

    /// Upsert consent on the (tenant, data_subject, pii_type) key
    pub async fn upsert_consent(conn: &mut PgConnection, record: &ConsentRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO consent_records
                (id, tenant_id, data_subject_id, pii_type, given_at, expires_at, withdrawn_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT ((COALESCE(tenant_id::text, '')), data_subject_id, pii_type)
            DO UPDATE SET given_at = EXCLUDED.given_at,
                          expires_at = EXCLUDED.expires_at,
                          withdrawn_at = EXCLUDED.withdrawn_at
            "#,
        )
        .bind(record.id)
        .bind(record.tenant_id)
        .bind(&record.data_subject_id)
        .bind(&record.pii_type)
        .bind(record.given_at)
        .bind(record.expires_at)
        .bind(record.withdrawn_at)
        .execute(conn)
        .await?;
        Ok(())
    }

    pub async fn get_consent(
        conn: &mut PgConnection,
        tenant: TenantContext,
        data_subject_id: &str,
        pii_type: &str,
    ) -> Result<Option<ConsentRecord>> {
        let row = sqlx::query(
            r#"
            SELECT * FROM consent_records
            WHERE data_subject_id = $1 AND pii_type = $2
              AND COALESCE(tenant_id::text, '') = COALESCE($3::uuid::text, '')
            "#,
        )
        .bind(data_subject_id)
        .bind(pii_type)
        .bind(tenant.tenant_id)
        .fetch_optional(conn)
        .await?;

        row.map(|r| {
            Ok(ConsentRecord {
                id: r.try_get("id")?,
                tenant_id: r.try_get("tenant_id")?,
                data_subject_id: r.try_get("data_subject_id")?,
                pii_type: r.try_get("pii_type")?,
                given_at: r.try_get("given_at")?,
                expires_at: r.try_get("expires_at")?,
                withdrawn_at: r.try_get("withdrawn_at")?,
            })
        })
        .transpose()
    }
}

fn row_to_policy(row: &PgRow) -> Result<Policy> {
    Ok(Policy {
        id: row.try_get("id")?,
        tenant_id: row.try_get("tenant_id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        conditions: row.try_get("conditions")?,
        actions: row.try_get("actions")?,
        is_active: row.try_get("is_active")?,
        created_at: row.try_get("created_at")?,
    })
}
