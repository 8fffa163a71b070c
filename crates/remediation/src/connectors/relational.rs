//! Relational source connector (PostgreSQL).
//!
//! Operations address a record by primary key when a locator is present,
//! otherwise by the value itself. Identifiers are validated against a
//! strict character set before interpolation; values only ever travel as
//! bind parameters.

use crate::connector::{Connector, ConnectorConfig, RemediationTarget};
use async_trait::async_trait;
use privguard_core::types::SourceType;
use privguard_core::{Error, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use std::time::Duration;

/// Connector over a PostgreSQL source system
pub struct RelationalConnector {
    pool: PgPool,
    id_column: String,
}

impl RelationalConnector {
    pub async fn connect(config: ConnectorConfig) -> Result<Self> {
        let dsn = config
            .dsn
            .ok_or_else(|| Error::connector("postgresql", "profile config is missing dsn"))?;

        let pool = PgPoolOptions::new()
            .max_connections(2)
            .acquire_timeout(Duration::from_secs(10))
            .connect(&dsn)
            .await
            .map_err(|e| Error::connector("postgresql", format!("connect failed: {e}")))?;

        Ok(Self {
            pool,
            id_column: config.id_column.unwrap_or_else(|| "id".to_string()),
        })
    }

    fn table_and_field<'a>(&self, target: &'a RemediationTarget) -> Result<(&'a str, &'a str)> {
        let field = target.field.as_deref().ok_or_else(|| {
            Error::connector("postgresql", "relational remediation requires a column")
        })?;
        validate_identifier(&target.path)?;
        validate_identifier(field)?;
        validate_identifier(&self.id_column)?;
        Ok((target.path.as_str(), field))
    }
}

/// Reject identifiers outside [A-Za-z0-9_.]; values are bound, but table
/// and column names must be interpolated.
fn validate_identifier(identifier: &str) -> Result<()> {
    if identifier.is_empty()
        || !identifier
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
    {
        return Err(Error::connector(
            "postgresql",
            format!("invalid identifier: {identifier}"),
        ));
    }
    Ok(())
}

#[async_trait]
impl Connector for RelationalConnector {
    fn source_type(&self) -> SourceType {
        SourceType::Postgresql
    }

    fn supports_restore_after_delete(&self) -> bool {
        true
    }

    async fn get_original_value(&self, target: &RemediationTarget) -> Result<String> {
        let (table, field) = self.table_and_field(target)?;

        match &target.record_id {
            Some(record_id) => {
                let sql = format!(
                    "SELECT {field}::text AS value FROM {table} WHERE {}::text = $1",
                    self.id_column
                );
                let row = sqlx::query(&sql)
                    .bind(record_id)
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(|e| Error::connector("postgresql", e.to_string()))?
                    .ok_or_else(|| {
                        Error::not_found(format!("record {record_id} in {table}"))
                    })?;
                let value: Option<String> = row
                    .try_get("value")
                    .map_err(|e| Error::connector("postgresql", e.to_string()))?;
                value.ok_or_else(|| Error::not_found(format!("value at {table}.{field}")))
            }
            // Value-addressed: the match itself is the original
            None => {
                let sql = format!("SELECT count(*) AS n FROM {table} WHERE {field}::text = $1");
                let n: i64 = sqlx::query(&sql)
                    .bind(&target.match_value)
                    .fetch_one(&self.pool)
                    .await
                    .map_err(|e| Error::connector("postgresql", e.to_string()))?
                    .try_get("n")
                    .map_err(|e| Error::connector("postgresql", e.to_string()))?;
                if n == 0 {
                    return Err(Error::not_found(format!(
                        "value in {table}.{field}"
                    )));
                }
                Ok(target.match_value.clone())
            }
        }
    }

    async fn mask(&self, target: &RemediationTarget, masked: &str) -> Result<()> {
        let (table, field) = self.table_and_field(target)?;
        let sql = match &target.record_id {
            Some(_) => format!(
                "UPDATE {table} SET {field} = $1 WHERE {}::text = $2",
                self.id_column
            ),
            None => format!("UPDATE {table} SET {field} = $1 WHERE {field}::text = $2"),
        };
        let locator = target
            .record_id
            .clone()
            .unwrap_or_else(|| target.match_value.clone());

        sqlx::query(&sql)
            .bind(masked)
            .bind(&locator)
            .execute(&self.pool)
            .await
            .map_err(|e| Error::connector("postgresql", e.to_string()))?;
        Ok(())
    }

    async fn delete(&self, target: &RemediationTarget) -> Result<()> {
        let (table, field) = self.table_and_field(target)?;
        // Value-addressed delete cannot be located again for restore
        let record_id = target.record_id.as_deref().ok_or_else(|| {
            Error::connector("postgresql", "delete requires a record locator")
        })?;

        let sql = format!(
            "UPDATE {table} SET {field} = NULL WHERE {}::text = $1",
            self.id_column
        );
        sqlx::query(&sql)
            .bind(record_id)
            .execute(&self.pool)
            .await
            .map_err(|e| Error::connector("postgresql", e.to_string()))?;
        Ok(())
    }

    async fn encrypt(&self, target: &RemediationTarget, key_ref: &str) -> Result<()> {
        let cipher = crate::crypto::CredentialCipher::from_key_ref(key_ref)?;
        let encrypted = cipher.encrypt(&target.match_value)?;
        self.mask(target, &encrypted).await
    }

    async fn restore_value(&self, target: &RemediationTarget, value: &str) -> Result<()> {
        let (table, field) = self.table_and_field(target)?;
        let sql = match &target.record_id {
            Some(_) => format!(
                "UPDATE {table} SET {field} = $1 WHERE {}::text = $2",
                self.id_column
            ),
            // Address by the currently applied value
            None => format!("UPDATE {table} SET {field} = $1 WHERE {field}::text = $2"),
        };
        let locator = target
            .record_id
            .clone()
            .unwrap_or_else(|| target.match_value.clone());

        sqlx::query(&sql)
            .bind(value)
            .bind(&locator)
            .execute(&self.pool)
            .await
            .map_err(|e| Error::connector("postgresql", e.to_string()))?;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.pool.close().await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_validation() {
        assert!(validate_identifier("public.customers").is_ok());
        assert!(validate_identifier("email_address").is_ok());
        assert!(validate_identifier("").is_err());
        assert!(validate_identifier("users; DROP TABLE users").is_err());
        assert!(validate_identifier("col\"name").is_err());
    }
}
