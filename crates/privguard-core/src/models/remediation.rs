// Modified: 2026-03-14

//! Remediation models.

use crate::types::{
    EntityId, RemediationActionType, RemediationStatus, SourceType, TenantId, Timestamp,
    ValidationStatus,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// A staged, reversible remediation action against an external system
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemediationAction {
    pub id: EntityId,
    pub tenant_id: Option<TenantId>,
    pub finding_id: EntityId,
    pub action_type: RemediationActionType,
    pub executed_by: String,
    pub executed_at: Option<Timestamp>,
    pub effective_from: Option<Timestamp>,
    /// Null while the action is active; set on rollback
    pub effective_until: Option<Timestamp>,
    /// Self-FK to the action this one rolled back
    pub rollback_reference: Option<EntityId>,
    pub status: RemediationStatus,
    pub error_detail: Option<String>,
    /// Carries the original value captured pre-execution, for reversal
    pub metadata: serde_json::Value,
    pub created_at: Timestamp,
}

impl RemediationAction {
    /// The rollback token captured before execution, if present
    pub fn original_value(&self) -> Option<&str> {
        self.metadata.get("original_value").and_then(|v| v.as_str())
    }
}

/// Configuration for a data source; credentials are stored encrypted and
/// never serialized back to callers.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SourceProfile {
    pub id: EntityId,
    pub tenant_id: Option<TenantId>,
    /// Tenant-unique profile name
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    pub source_type: SourceType,
    /// AES-256-GCM encrypted connection configuration, base64
    #[serde(skip_serializing)]
    pub encrypted_config: String,
    pub validation_status: ValidationStatus,
    pub disabled_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Read-only impact estimate computed by remediation preview
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemediationImpact {
    pub affected_assets: i64,
    pub affected_systems: i64,
    pub distinct_pii_types: Vec<String>,
    pub estimated_records: i64,
}

/// Per-finding before/after sample produced by preview
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemediationSample {
    pub finding_id: EntityId,
    pub before: String,
    pub after: String,
}

/// Full preview response: impact summary plus samples. Never writes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemediationPreview {
    pub action_type: RemediationActionType,
    pub impact: RemediationImpact,
    pub samples: Vec<RemediationSample>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_original_value_from_metadata() {
        let now = crate::utils::current_timestamp();
        let action = RemediationAction {
            id: crate::utils::generate_uuid(),
            tenant_id: None,
            finding_id: crate::utils::generate_uuid(),
            action_type: RemediationActionType::Mask,
            executed_by: "dpo".to_string(),
            executed_at: None,
            effective_from: None,
            effective_until: None,
            rollback_reference: None,
            status: RemediationStatus::Pending,
            error_detail: None,
            metadata: serde_json::json!({ "original_value": "ABCDE1234F" }),
            created_at: now,
        };
        assert_eq!(action.original_value(), Some("ABCDE1234F"));
    }

    #[test]
    fn test_profile_credentials_not_serialized() {
        let now = crate::utils::current_timestamp();
        let profile = SourceProfile {
            id: crate::utils::generate_uuid(),
            tenant_id: None,
            name: "billing-db".to_string(),
            source_type: SourceType::Postgresql,
            encrypted_config: "c2VjcmV0".to_string(),
            validation_status: ValidationStatus::Valid,
            disabled_at: None,
            created_at: now,
            updated_at: now,
        };
        let json = serde_json::to_value(&profile).unwrap();
        assert!(json.get("encrypted_config").is_none());
    }
}
