// Modified: 2026-03-14

//! Application state: process-wide components initialized once at startup
//! and injected into handlers. No implicit singletons inside the core.

use catalog_store::CatalogPool;
use ingestion::{AssetManager, IngestionPipeline, ScanSweeper};
use lineage_graph::{
    start_sync_workers, GraphStore, LineageService, LineageSynchronizer, Neo4jStore, NullStore,
    SyncHandle,
};
use privguard_core::config::PlatformConfig;
use privguard_core::Result;
use remediation::{ConnectorRegistry, CredentialCipher, RemediationOrchestrator};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};
use workflow_activities::Activities;

/// Shared handle to every core component
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<PlatformConfig>,
    pub pool: CatalogPool,
    pub pipeline: Arc<IngestionPipeline>,
    pub assets: Arc<AssetManager>,
    pub lineage: Arc<LineageService>,
    pub synchronizer: Arc<LineageSynchronizer>,
    pub orchestrator: Arc<RemediationOrchestrator>,
    pub activities: Arc<Activities>,
    pub cipher: Arc<CredentialCipher>,
    /// Dropping the sender stops the background workers on shutdown
    shutdown: Arc<watch::Sender<bool>>,
}

impl AppState {
    pub async fn new(config: PlatformConfig) -> Result<Self> {
        let pool = CatalogPool::connect(&config.database).await?;
        pool.migrate().await?;

        let store: Arc<dyn GraphStore> = if config.graph.enabled {
            match Neo4jStore::connect(&config.graph).await {
                Ok(store) => Arc::new(store),
                Err(e) => {
                    // Degraded start: ingestion proceeds, lineage reports
                    // unavailable, the resync sweep recovers on restart.
                    warn!(error = %e, "graph store unreachable at startup, lineage degraded");
                    Arc::new(NullStore)
                }
            }
        } else {
            info!("graph sync disabled by configuration");
            Arc::new(NullStore)
        };

        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let synchronizer = Arc::new(LineageSynchronizer::new(Arc::clone(&store), pool.clone()));
        let (sync_handle, _workers): (SyncHandle, _) = start_sync_workers(
            Arc::clone(&synchronizer),
            config.graph.sync_workers,
            config.graph.sync_queue_depth,
            shutdown_rx.clone(),
        );

        let assets = Arc::new(AssetManager::new(sync_handle.clone()));
        let classifier = Arc::new(classification::Classifier::new(
            config.classification.clone(),
        ));
        let enricher = Arc::new(classification::Enricher::new(
            config.encryption.value_hash_salt.clone(),
        ));

        let pipeline = Arc::new(IngestionPipeline::new(
            pool.clone(),
            classifier,
            enricher,
            Arc::clone(&assets),
            sync_handle.clone(),
            config.ingest,
        ));

        let cipher = Arc::new(CredentialCipher::from_key_ref(&config.encryption.key_ref)?);
        let registry = Arc::new(ConnectorRegistry::new(Arc::clone(&cipher)));
        let orchestrator = Arc::new(RemediationOrchestrator::new(
            pool.clone(),
            registry,
            sync_handle.clone(),
            config.encryption.key_ref.clone(),
        ));

        let lineage = Arc::new(LineageService::new(store, pool.clone()));
        let activities = Arc::new(Activities::new(
            pool.clone(),
            Arc::clone(&pipeline),
            Arc::clone(&synchronizer),
            Arc::clone(&orchestrator),
        ));

        ScanSweeper::new(pool.clone(), config.scan.clone()).start(shutdown_rx.clone());
        spawn_resync_ticker(
            sync_handle,
            config.graph.resync_interval_minutes,
            shutdown_rx,
        );

        Ok(Self {
            config: Arc::new(config),
            pool,
            pipeline,
            assets,
            lineage,
            synchronizer,
            orchestrator,
            activities,
            cipher,
            shutdown: Arc::new(shutdown_tx),
        })
    }

    /// Signal background workers to stop
    pub fn shutdown(&self) {
        let _ = self.shutdown.send(true);
    }
}

/// Periodic full-resync: sweeps assets whose catalog state is newer than
/// the graph's, recovering from dropped sync tasks and graph outages.
fn spawn_resync_ticker(
    sync: lineage_graph::SyncHandle,
    interval_minutes: u64,
    mut shutdown: watch::Receiver<bool>,
) {
    tokio::spawn(async move {
        let period = std::time::Duration::from_secs(interval_minutes.max(1) * 60);
        let mut ticker = tokio::time::interval(period);
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    sync.enqueue(lineage_graph::SyncTask::FullResync);
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
    });
}
