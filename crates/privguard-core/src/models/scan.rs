// Modified: 2026-03-14

//! Scan run models.
//!
//! A ScanRun records one execution of a scanner profile. Rows are created
//! at ingestion start and mutated only through the CAS transition set;
//! they are never hard-deleted.

use crate::types::{EntityId, ScanStatus, TenantId, Timestamp};
use serde::{Deserialize, Serialize};

/// One execution of a scanner profile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanRun {
    pub id: EntityId,
    pub tenant_id: Option<TenantId>,
    /// Scanner profile that produced this run
    pub profile_name: String,
    /// Host/origin label from the first candidate of the batch
    pub host: String,
    pub status: ScanStatus,
    pub started_at: Timestamp,
    pub completed_at: Option<Timestamp>,
    pub total_findings: i64,
    pub total_assets: i64,
    /// Free-form metadata: nul-strip counters, per-run timeout override, scanner stats
    pub metadata: serde_json::Value,
    pub cancelled_at: Option<Timestamp>,
    pub cancelled_by: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl ScanRun {
    /// Per-run timeout override from metadata, when present
    pub fn timeout_minutes(&self) -> Option<i64> {
        self.metadata.get("timeout_minutes").and_then(|v| v.as_i64())
    }
}

/// Immutable audit row written for every scan status change
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanStateTransition {
    pub id: EntityId,
    pub scan_run_id: EntityId,
    pub from_status: ScanStatus,
    pub to_status: ScanStatus,
    pub transitioned_at: Timestamp,
    pub transitioned_by: Option<String>,
}

/// Outcome of one ingested batch, returned to the scanner
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestSummary {
    pub scan_run_id: EntityId,
    pub total_findings: i64,
    pub total_assets: i64,
    pub assets_created: i64,
    pub patterns_found: i64,
    /// Candidates refused by the locked-type gate
    pub rejected_candidates: i64,
    /// Candidates dropped by the dedup unique index
    pub duplicates_skipped: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::{current_timestamp, generate_uuid};

    fn scan_run_with_metadata(metadata: serde_json::Value) -> ScanRun {
        let now = current_timestamp();
        ScanRun {
            id: generate_uuid(),
            tenant_id: None,
            profile_name: "default".to_string(),
            host: "db-01".to_string(),
            status: ScanStatus::Running,
            started_at: now,
            completed_at: None,
            total_findings: 0,
            total_assets: 0,
            metadata,
            cancelled_at: None,
            cancelled_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_timeout_override_from_metadata() {
        let run = scan_run_with_metadata(serde_json::json!({ "timeout_minutes": 45 }));
        assert_eq!(run.timeout_minutes(), Some(45));

        let run = scan_run_with_metadata(serde_json::json!({}));
        assert_eq!(run.timeout_minutes(), None);
    }
}
