// Modified: 2026-03-14

//! Audit models.
//!
//! The audit log is append-only; before/after snapshots are stored as
//! structured JSON so state changes remain reconstructible.

use crate::types::{EntityId, TenantId, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use validator::Validate;

/// Append-only audit log entry
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AuditEvent {
    /// Unique audit entry identifier
    pub id: EntityId,
    pub tenant_id: Option<TenantId>,
    /// Event type, e.g. "asset.created", "remediation.executed"
    pub event_type: String,
    /// Event timestamp
    pub event_time: Timestamp,
    /// Actor that performed the action
    pub user_id: Option<String>,
    /// Resource type affected
    pub resource_type: String,
    /// Resource ID affected
    pub resource_id: Option<EntityId>,
    /// Action performed
    #[validate(length(min = 1, max = 255))]
    pub action: String,
    /// State before the action (for modification events)
    pub before_state: Option<serde_json::Value>,
    /// State after the action
    pub after_state: Option<serde_json::Value>,
    /// Additional metadata
    pub metadata: HashMap<String, String>,
}

impl AuditEvent {
    /// Create a new audit event
    pub fn new(
        event_type: impl Into<String>,
        resource_type: impl Into<String>,
        action: impl Into<String>,
    ) -> Self {
        Self {
            id: crate::utils::generate_uuid(),
            tenant_id: None,
            event_type: event_type.into(),
            event_time: crate::utils::current_timestamp(),
            user_id: None,
            resource_type: resource_type.into(),
            resource_id: None,
            action: action.into(),
            before_state: None,
            after_state: None,
            metadata: HashMap::new(),
        }
    }

    /// Set the tenant scope
    pub fn with_tenant(mut self, tenant_id: Option<TenantId>) -> Self {
        self.tenant_id = tenant_id;
        self
    }

    /// Set the acting user
    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Set the affected resource id
    pub fn with_resource(mut self, resource_id: EntityId) -> Self {
        self.resource_id = Some(resource_id);
        self
    }

    /// Attach before/after state snapshots
    pub fn with_states(
        mut self,
        before: Option<serde_json::Value>,
        after: Option<serde_json::Value>,
    ) -> Self {
        self.before_state = before;
        self.after_state = after;
        self
    }

    /// Add metadata to the audit event
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audit_event_builder() {
        let asset_id = crate::utils::generate_uuid();
        let event = AuditEvent::new("asset.created", "asset", "create")
            .with_user("ingestor")
            .with_resource(asset_id)
            .with_metadata("stable_id", "abc123");

        assert_eq!(event.event_type, "asset.created");
        assert_eq!(event.resource_type, "asset");
        assert_eq!(event.user_id.as_deref(), Some("ingestor"));
        assert_eq!(event.resource_id, Some(asset_id));
        assert!(event.metadata.contains_key("stable_id"));
        assert!(event.before_state.is_none());
    }
}
