// Modified: 2026-03-14

//! Finding, classification, and review models.

use crate::types::{
    ClassificationType, ConfidenceTier, EntityId, ReviewStatus, Severity, TenantId, Timestamp,
};
use serde::{Deserialize, Serialize};

/// A single PII occurrence accepted from a scanner as authoritative.
///
/// The tuple (asset_id, pattern_name, normalized_value_hash, scan_run_id)
/// is unique; duplicates are silently dropped at insert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    pub id: EntityId,
    pub tenant_id: Option<TenantId>,
    pub scan_run_id: EntityId,
    pub asset_id: EntityId,
    pub pattern_id: EntityId,
    pub pattern_name: String,
    pub matches: Vec<String>,
    pub sample_text: Option<String>,
    /// Derived from (classification type, tier, environment)
    pub severity: Severity,
    pub confidence_score: f64,
    pub enrichment_score: f64,
    pub enrichment_signals: serde_json::Value,
    pub enrichment_failed: bool,
    pub context: serde_json::Value,
    pub masked_value: Option<String>,
    /// Salted hash of the normalized first match; the dedup key component
    pub normalized_value_hash: String,
    pub occurrence_count: i32,
    pub risk_score: i32,
    pub deleted_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

/// Sensitivity decision attached 1:1 to a finding
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Classification {
    pub id: EntityId,
    pub finding_id: EntityId,
    pub classification_type: ClassificationType,
    pub sub_category: Option<String>,
    pub confidence_score: f64,
    pub tier: ConfidenceTier,
    /// Concatenated per-signal explanations, stored verbatim for audit
    pub justification: String,
    pub dpdpa_category: Option<String>,
    pub requires_consent: bool,
    pub retention_period: Option<String>,
    pub classifier_version: String,
    pub classified_at: Timestamp,
}

/// Human-review record per finding; cascade-deletes with it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewState {
    pub id: EntityId,
    pub finding_id: EntityId,
    pub status: ReviewStatus,
    pub reviewed_by: Option<String>,
    pub reviewed_at: Option<Timestamp>,
    pub comments: Option<String>,
}

/// A finding joined with its classification and review state, derived at
/// query time. Cross-references stay foreign keys in the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FindingDetail {
    pub finding: Finding,
    pub classification: Option<Classification>,
    pub review: Option<ReviewState>,
}
