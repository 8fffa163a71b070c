//! Append-only audit log repository.

use privguard_core::{AuditEvent, Result};
use sqlx::PgConnection;

/// Repository over `audit_logs`. Rows are never updated or deleted.
pub struct AuditRepo;

impl AuditRepo {
    pub async fn record(conn: &mut PgConnection, event: &AuditEvent) -> Result<()> {
        let metadata = serde_json::to_value(&event.metadata)?;
        sqlx::query(
            r#"
            INSERT INTO audit_logs
                (id, tenant_id, event_type, event_time, user_id, resource_type, resource_id,
                 action, before_state, after_state, metadata)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(event.id)
        .bind(event.tenant_id)
        .bind(&event.event_type)
        .bind(event.event_time)
        .bind(event.user_id.as_deref())
        .bind(&event.resource_type)
        .bind(event.resource_id)
        .bind(&event.action)
        .bind(event.before_state.as_ref())
        .bind(event.after_state.as_ref())
        .bind(metadata)
        .execute(conn)
        .await?;
        Ok(())
    }
}
