// Modified: 2026-03-14

//! Graph projection models.
//!
//! The lineage graph is a derived materialization of the catalog in three
//! frozen levels: System -> Asset -> PII_Category. On conflict the catalog
//! wins and a resync is scheduled.

use crate::types::{EntityId, Severity, Timestamp};
use serde::{Deserialize, Serialize};

/// System node: one per scanned host. Id is `"system-" + host`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemNode {
    pub id: String,
    pub host: String,
    pub source_system: Option<String>,
}

impl SystemNode {
    pub fn from_host(host: &str, source_system: Option<String>) -> Self {
        Self {
            id: format!("system-{host}"),
            host: host.to_string(),
            source_system,
        }
    }
}

/// Asset node mirroring the catalog row's current attributes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetNode {
    pub id: EntityId,
    pub path: String,
    pub asset_type: String,
    pub environment: String,
    pub risk_score: i32,
}

/// PII category node, keyed by the classification type code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PiiCategoryNode {
    pub pii_type: String,
    pub risk_level: Severity,
    pub finding_count: i64,
    pub avg_confidence: f64,
}

/// ASSET_CONTAINS_PII edge attributes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainsPiiEdge {
    pub asset_id: EntityId,
    pub pii_type: String,
    pub finding_count: i64,
    pub avg_confidence: f64,
    pub updated_at: Timestamp,
    /// Exposure close timestamp, set when the last finding of this type
    /// on the asset is remediated
    pub until: Option<Timestamp>,
}

/// One PII category attached to an asset in the hierarchy projection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineageCategory {
    pub pii_type: String,
    pub finding_count: i64,
    pub avg_confidence: f64,
}

/// One asset under a system in the hierarchy projection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineageAsset {
    pub asset: AssetNode,
    pub categories: Vec<LineageCategory>,
}

/// One system subtree of the hierarchy projection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineageSystem {
    pub system: SystemNode,
    pub assets: Vec<LineageAsset>,
}

/// Degradation status of a lineage response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineageStatus {
    Available,
    Unavailable,
}

/// Hierarchy projection response. When the graph store is down the
/// status is explicit; the catalog is never silently substituted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineageView {
    pub status: LineageStatus,
    pub systems: Vec<LineageSystem>,
}

/// Per-PII-type aggregation row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PiiSummaryRow {
    pub pii_type: String,
    pub findings: i64,
    pub affected_assets: i64,
    pub affected_systems: i64,
    pub avg_confidence: f64,
}

/// Filters accepted by the hierarchy projection
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LineageFilter {
    pub system: Option<String>,
    pub risk: Option<Severity>,
    pub category: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_node_id_rule() {
        let node = SystemNode::from_host("db-prod-01", Some("billing".to_string()));
        assert_eq!(node.id, "system-db-prod-01");
        assert_eq!(node.host, "db-prod-01");
    }
}
