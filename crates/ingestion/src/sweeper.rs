//! Background scan-cleanup sweeper.
//!
//! Ticker-driven task marking over-age running scans as timed out. The
//! CAS inside the repository guarantees each scan transitions exactly
//! once even with concurrent sweepers.

use catalog_store::{CatalogPool, ScanRunRepo};
use privguard_core::config::ScanConfig;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Periodic timeout sweeper over the scan_runs table
pub struct ScanSweeper {
    pool: CatalogPool,
    config: ScanConfig,
}

impl ScanSweeper {
    pub fn new(pool: CatalogPool, config: ScanConfig) -> Self {
        Self { pool, config }
    }

    /// One sweep pass; returns the scans transitioned to timeout
    pub async fn sweep_once(&self) -> privguard_core::Result<Vec<privguard_core::EntityId>> {
        let mut conn = self.pool.inner().acquire().await?;
        ScanRunRepo::sweep_timeouts(&mut conn, self.config.timeout_minutes).await
    }

    /// Run the sweeper until shutdown is signalled
    pub fn start(self, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        let interval = Duration::from_secs(self.config.cleanup_interval_minutes.max(1) * 60);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The immediate first tick would sweep at startup before any
            // scan can be over-age; skip it.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        match self.sweep_once().await {
                            Ok(swept) if !swept.is_empty() => {
                                info!(count = swept.len(), "scan timeout sweep transitioned runs");
                            }
                            Ok(_) => {}
                            Err(e) => error!(error = %e, "scan timeout sweep failed"),
                        }
                    }
                    _ = shutdown.changed() => {
                        if *shutdown.borrow() {
                            info!("scan sweeper stopping");
                            break;
                        }
                    }
                }
            }
        })
    }
}
