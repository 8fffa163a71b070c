//! # Lineage Graph
//!
//! Materializes the catalog into the three-level semantic hierarchy
//! (System -> Asset -> PII_Category) and serves lineage queries. The
//! graph is derived state: on conflict the catalog wins and a resync is
//! scheduled. Graph unavailability degrades reads explicitly and never
//! blocks ingestion.

pub mod queries;
pub mod queue;
pub mod store;
pub mod synchronizer;

pub use queries::{hierarchy_view, LineageService};
pub use queue::{start_sync_workers, SyncHandle, SyncTask};
pub use store::{GraphStore, Neo4jStore, NullStore};
pub use synchronizer::LineageSynchronizer;
