//! # Catalog Store
//!
//! Relational persistence for the Privguard catalog: scan runs, assets,
//! patterns, findings, classifications, review states, audit logs,
//! remediation actions, source profiles, policies, and consent records.
//!
//! Repositories take `&mut PgConnection` executors so the ingestion
//! pipeline can bind every operation of one batch to a single
//! transaction. Uniqueness invariants live in the schema, not in
//! application locks; races converge through typed insert outcomes.

pub mod assets;
pub mod audit;
pub mod classifications;
pub mod findings;
pub mod patterns;
pub mod policies;
pub mod pool;
pub mod profiles;
pub mod relationships;
pub mod remediations;
pub mod scan_runs;

pub use assets::{AssetRepo, InsertOutcome};
pub use audit::AuditRepo;
pub use classifications::{ClassificationRepo, ReviewRepo};
pub use findings::{FindingInsert, FindingRepo};
pub use patterns::PatternRepo;
pub use policies::PolicyRepo;
pub use pool::{is_unique_violation, CatalogPool};
pub use profiles::ProfileRepo;
pub use relationships::RelationshipRepo;
pub use remediations::RemediationRepo;
pub use scan_runs::ScanRunRepo;
