//! # Classification
//!
//! Enrichment and multi-signal classification for Privguard. The engine
//! maps a candidate finding plus its contextual signals to an explainable
//! sensitivity decision: classification type, confidence tier, severity,
//! and risk score.

pub mod engine;
pub mod enrichment;
pub mod rules;
pub mod severity;

pub use engine::{
    ClassificationDecision, ClassificationInput, Classifier, SignalScore, CLASSIFIER_VERSION,
};
pub use enrichment::{
    enrichment_score, infer_environment, Enricher, EnrichmentContext, EnrichmentSignals,
};
pub use rules::{normalize_pattern_name, validate_locked_type};
pub use severity::{aggregate_asset_risk, dynamic_severity, risk_score};
