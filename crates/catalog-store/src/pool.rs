//! Catalog connection pool and migrations.

use privguard_core::config::DatabaseConfig;
use privguard_core::Result;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;

/// Shared handle to the catalog database
#[derive(Debug, Clone)]
pub struct CatalogPool {
    pool: PgPool,
}

impl CatalogPool {
    /// Connect and verify the pool against the configured database
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.timeout_seconds))
            .connect(&config.url)
            .await?;
        Ok(Self { pool })
    }

    /// Apply embedded schema migrations
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| privguard_core::Error::internal(format!("migration failed: {e}")))?;
        Ok(())
    }

    pub fn inner(&self) -> &PgPool {
        &self.pool
    }

    /// Begin a transaction; dropped un-committed it rolls back, which is
    /// the rollback boundary for ingestion batches.
    pub async fn begin(&self) -> Result<sqlx::Transaction<'static, sqlx::Postgres>> {
        Ok(self.pool.begin().await?)
    }
}

/// Map a sqlx error to true when it is a Postgres unique-constraint hit.
/// Dedup and stable-id races converge through this check instead of failing.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => db.code().as_deref() == Some("23505"),
        _ => false,
    }
}
