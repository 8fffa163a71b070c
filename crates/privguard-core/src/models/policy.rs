// Modified: 2026-03-14

//! Policy and consent models.

use crate::types::{EntityId, TenantId, Timestamp};
use serde::{Deserialize, Serialize};

/// Declarative governance policy: conditions matched against findings,
/// actions applied on match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Policy {
    pub id: EntityId,
    pub tenant_id: Option<TenantId>,
    pub name: String,
    pub description: Option<String>,
    pub conditions: serde_json::Value,
    pub actions: serde_json::Value,
    pub is_active: bool,
    pub created_at: Timestamp,
}

/// Outcome of one policy evaluation against a finding
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyExecution {
    pub id: EntityId,
    pub policy_id: EntityId,
    pub finding_id: EntityId,
    pub outcome: String,
    pub detail: Option<String>,
    pub executed_at: Timestamp,
}

/// Consent record keyed by (data_subject_id, pii_type)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsentRecord {
    pub id: EntityId,
    pub tenant_id: Option<TenantId>,
    pub data_subject_id: String,
    pub pii_type: String,
    pub given_at: Option<Timestamp>,
    pub expires_at: Option<Timestamp>,
    pub withdrawn_at: Option<Timestamp>,
}

impl ConsentRecord {
    /// Consent is effective when given, not withdrawn, and not expired
    pub fn is_effective(&self, at: Timestamp) -> bool {
        match self.given_at {
            None => false,
            Some(given) if given > at => false,
            Some(_) => {
                if self.withdrawn_at.map_or(false, |w| w <= at) {
                    return false;
                }
                self.expires_at.map_or(true, |e| e > at)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn record(
        given: Option<i64>,
        expires: Option<i64>,
        withdrawn: Option<i64>,
    ) -> (ConsentRecord, Timestamp) {
        let now = crate::utils::current_timestamp();
        let rec = ConsentRecord {
            id: crate::utils::generate_uuid(),
            tenant_id: None,
            data_subject_id: "subject-1".to_string(),
            pii_type: "IN_PAN".to_string(),
            given_at: given.map(|d| now + Duration::days(d)),
            expires_at: expires.map(|d| now + Duration::days(d)),
            withdrawn_at: withdrawn.map(|d| now + Duration::days(d)),
        };
        (rec, now)
    }

    #[test]
    fn test_consent_effective() {
        let (rec, now) = record(Some(-1), Some(30), None);
        assert!(rec.is_effective(now));
    }

    #[test]
    fn test_consent_withdrawn() {
        let (rec, now) = record(Some(-10), None, Some(-1));
        assert!(!rec.is_effective(now));
    }

    #[test]
    fn test_consent_expired() {
        let (rec, now) = record(Some(-10), Some(-1), None);
        assert!(!rec.is_effective(now));
    }

    #[test]
    fn test_consent_never_given() {
        let (rec, now) = record(None, None, None);
        assert!(!rec.is_effective(now));
    }
}
