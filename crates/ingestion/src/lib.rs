//! # Ingestion
//!
//! Consumes verified scanner findings and drives them through asset
//! resolution, enrichment, classification, and catalog persistence under
//! one transaction per batch. Owns asset identity and the scan timeout
//! sweeper.

pub mod asset_manager;
pub mod payload;
pub mod pipeline;
pub mod stable_id;
pub mod sweeper;

pub use asset_manager::AssetManager;
pub use payload::{CandidateFinding, IngestBatch, ScannerReport, SdkReport};
pub use pipeline::IngestionPipeline;
pub use stable_id::{compute_stable_id, parse_db_locator};
pub use sweeper::ScanSweeper;
