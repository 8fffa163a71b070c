// Modified: 2026-03-14

//! Asset models.
//!
//! An asset is a data container (file, table, bucket) deduplicated by a
//! stable identifier: the SHA-256 of a normalized locator, unique per
//! tenant. Re-ingesting the same logical asset resolves to the same row.

use crate::types::{EntityId, Environment, Severity, TenantId, Timestamp};
use crate::types::ClassificationType;
use serde::{Deserialize, Serialize};

/// A data container tracked by the catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asset {
    pub id: EntityId,
    pub tenant_id: Option<TenantId>,
    /// SHA-256 hex of the normalized identifier; unique per tenant
    pub stable_id: String,
    pub asset_type: String,
    pub name: String,
    pub path: String,
    pub data_source: String,
    pub host: String,
    pub environment: Environment,
    pub owner: Option<String>,
    pub source_system: Option<String>,
    pub metadata: serde_json::Value,
    /// Aggregated risk in [0, 100], recomputed whenever findings change
    pub risk_score: i32,
    pub total_findings: i64,
    pub is_masked: bool,
    pub masking_strategy: Option<String>,
    pub masked_at: Option<Timestamp>,
    pub deleted_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Caller-supplied fields for asset create-or-update
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAsset {
    pub tenant_id: Option<TenantId>,
    /// Generated from the normalized locator when absent
    pub stable_id: Option<String>,
    pub asset_type: String,
    pub name: String,
    pub path: String,
    pub data_source: String,
    pub host: String,
    pub environment: Environment,
    pub owner: Option<String>,
    pub source_system: Option<String>,
    pub metadata: serde_json::Value,
}

impl NewAsset {
    /// Materialize a full catalog row from the caller-supplied fields
    pub fn into_asset(self, stable_id: String) -> Asset {
        let now = crate::utils::current_timestamp();
        Asset {
            id: crate::utils::generate_uuid(),
            tenant_id: self.tenant_id,
            stable_id,
            asset_type: self.asset_type,
            name: self.name,
            path: self.path,
            data_source: self.data_source,
            host: self.host,
            environment: self.environment,
            owner: self.owner,
            source_system: self.source_system,
            metadata: self.metadata,
            risk_score: 10,
            total_findings: 0,
            is_masked: false,
            masking_strategy: None,
            masked_at: None,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Directed typed edge between two assets; (source, target, type) is unique
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetRelationship {
    pub id: EntityId,
    pub source_asset_id: EntityId,
    pub target_asset_id: EntityId,
    pub relationship_type: String,
    pub metadata: serde_json::Value,
    pub created_at: Timestamp,
}

/// A named detector seen by the catalog. The catalog records patterns;
/// it does not evaluate them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pattern {
    pub id: EntityId,
    pub tenant_id: Option<TenantId>,
    /// Tenant-unique detector name, e.g. "IN_AADHAAR"
    pub name: String,
    pub pattern_type: String,
    pub category: String,
    pub description: Option<String>,
    pub definition: Option<String>,
    pub is_active: bool,
    pub created_at: Timestamp,
}

/// Per-type aggregate over an asset's live findings, used for risk
/// recomputation and graph sync
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PiiTypeAggregate {
    pub classification_type: ClassificationType,
    pub finding_count: i64,
    pub avg_confidence: f64,
    pub max_severity: Severity,
}

/// Finding statistics for one asset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetFindingStats {
    pub total_findings: i64,
    pub by_type: Vec<PiiTypeAggregate>,
}

impl AssetFindingStats {
    /// True when any live finding carries the given severity
    pub fn has_severity(&self, severity: Severity) -> bool {
        self.by_type.iter().any(|a| a.max_severity >= severity)
    }
}
