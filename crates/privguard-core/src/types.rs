// Modified: 2026-03-14

//! Common type definitions for the Privguard platform.
//!
//! This module provides the shared enums, identifier aliases, and constants
//! used throughout the ingestion, classification, catalog, lineage, and
//! remediation subsystems.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Common identifier type for entities
pub type EntityId = uuid::Uuid;

/// Common timestamp type (UTC, millisecond precision in storage)
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Tenant identifier. `None` marks a legacy single-tenant row.
pub type TenantId = uuid::Uuid;

/// Common result type for the platform
pub type Result<T> = std::result::Result<T, crate::error::Error>;

/// Finding severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Lift one level, saturating at Critical. Applied in production environments.
    pub fn lift(self) -> Self {
        match self {
            Self::Low => Self::Medium,
            Self::Medium => Self::High,
            Self::High | Self::Critical => Self::Critical,
        }
    }

    /// Lower one level, saturating at Low. Applied in non-production environments.
    pub fn lower(self) -> Self {
        match self {
            Self::Critical => Self::High,
            Self::High => Self::Medium,
            Self::Medium | Self::Low => Self::Low,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Severity {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "critical" => Ok(Self::Critical),
            other => Err(crate::error::Error::validation(format!(
                "unknown severity: {other}"
            ))),
        }
    }
}

/// Deployment environment of an asset's source system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Production,
    Staging,
    Development,
    Test,
}

impl Environment {
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Production => "production",
            Self::Staging => "staging",
            Self::Development => "development",
            Self::Test => "test",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Environment {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "production" | "prod" => Ok(Self::Production),
            "staging" | "stage" => Ok(Self::Staging),
            "development" | "dev" => Ok(Self::Development),
            "test" | "qa" => Ok(Self::Test),
            other => Err(crate::error::Error::validation(format!(
                "unknown environment: {other}"
            ))),
        }
    }
}

/// Confidence tier assigned from the final classification score
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConfidenceTier {
    Discard,
    NeedsReview,
    Validated,
    HighConfidence,
    Confirmed,
}

impl ConfidenceTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Confirmed => "CONFIRMED",
            Self::HighConfidence => "HIGH_CONFIDENCE",
            Self::Validated => "VALIDATED",
            Self::NeedsReview => "NEEDS_REVIEW",
            Self::Discard => "DISCARD",
        }
    }
}

impl fmt::Display for ConfidenceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ConfidenceTier {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "CONFIRMED" => Ok(Self::Confirmed),
            "HIGH_CONFIDENCE" => Ok(Self::HighConfidence),
            "VALIDATED" => Ok(Self::Validated),
            "NEEDS_REVIEW" => Ok(Self::NeedsReview),
            "DISCARD" => Ok(Self::Discard),
            other => Err(crate::error::Error::validation(format!(
                "unknown confidence tier: {other}"
            ))),
        }
    }
}

/// Regulatory classification attached to a finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClassificationType {
    /// Government identifiers, card numbers, health data
    #[serde(rename = "Sensitive Personal Data")]
    SensitivePersonal,
    /// Contact identifiers: emails, phone numbers, names
    #[serde(rename = "Personal Data")]
    Personal,
    /// Credentials, API keys, tokens
    #[serde(rename = "Secrets")]
    Secrets,
    /// Everything else
    #[serde(rename = "Non-PII")]
    NonPii,
}

impl ClassificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SensitivePersonal => "Sensitive Personal Data",
            Self::Personal => "Personal Data",
            Self::Secrets => "Secrets",
            Self::NonPii => "Non-PII",
        }
    }

    /// Short code used as the PII_Category graph node key
    pub fn code(&self) -> &'static str {
        match self {
            Self::SensitivePersonal => "SENSITIVE_PERSONAL",
            Self::Personal => "PERSONAL",
            Self::Secrets => "SECRETS",
            Self::NonPii => "NON_PII",
        }
    }

    /// Whether findings of this type require data-subject consent under DPDPA
    pub fn requires_consent(&self) -> bool {
        matches!(self, Self::SensitivePersonal | Self::Personal)
    }
}

impl fmt::Display for ClassificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ClassificationType {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Sensitive Personal Data" | "SENSITIVE_PERSONAL" => Ok(Self::SensitivePersonal),
            "Personal Data" | "PERSONAL" => Ok(Self::Personal),
            "Secrets" | "SECRETS" => Ok(Self::Secrets),
            "Non-PII" | "NON_PII" => Ok(Self::NonPii),
            other => Err(crate::error::Error::validation(format!(
                "unknown classification type: {other}"
            ))),
        }
    }
}

/// Scan run lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
    Timeout,
}

impl ScanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
            Self::Timeout => "timeout",
        }
    }

    /// True when no further transitions are allowed
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Completed | Self::Failed | Self::Cancelled | Self::Timeout
        )
    }

    /// The allowed transition set: pending -> running -> {completed, failed,
    /// cancelled, timeout}; cancellation also allowed from pending.
    pub fn can_transition_to(&self, to: ScanStatus) -> bool {
        match (self, to) {
            (Self::Pending, Self::Running) => true,
            (Self::Pending, Self::Cancelled) => true,
            (Self::Running, Self::Completed) => true,
            (Self::Running, Self::Failed) => true,
            (Self::Running, Self::Cancelled) => true,
            (Self::Running, Self::Timeout) => true,
            _ => false,
        }
    }
}

impl fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ScanStatus {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "running" => Ok(Self::Running),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            "cancelled" => Ok(Self::Cancelled),
            "timeout" => Ok(Self::Timeout),
            other => Err(crate::error::Error::validation(format!(
                "unknown scan status: {other}"
            ))),
        }
    }
}

/// Remediation action lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RemediationStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
    RolledBack,
}

impl RemediationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::InProgress => "IN_PROGRESS",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
            Self::RolledBack => "ROLLED_BACK",
        }
    }

    /// PENDING -> IN_PROGRESS -> {COMPLETED, FAILED}; COMPLETED -> ROLLED_BACK.
    pub fn can_transition_to(&self, to: RemediationStatus) -> bool {
        match (self, to) {
            (Self::Pending, Self::InProgress) => true,
            (Self::InProgress, Self::Completed) => true,
            (Self::InProgress, Self::Failed) => true,
            (Self::Completed, Self::RolledBack) => true,
            _ => false,
        }
    }
}

impl fmt::Display for RemediationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RemediationStatus {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "IN_PROGRESS" => Ok(Self::InProgress),
            "COMPLETED" => Ok(Self::Completed),
            "FAILED" => Ok(Self::Failed),
            "ROLLED_BACK" => Ok(Self::RolledBack),
            other => Err(crate::error::Error::validation(format!(
                "unknown remediation status: {other}"
            ))),
        }
    }
}

/// Remediation operations the connectors can perform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RemediationActionType {
    Mask,
    Delete,
    Encrypt,
    Quarantine,
}

impl RemediationActionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mask => "MASK",
            Self::Delete => "DELETE",
            Self::Encrypt => "ENCRYPT",
            Self::Quarantine => "QUARANTINE",
        }
    }
}

impl fmt::Display for RemediationActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RemediationActionType {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_uppercase().as_str() {
            "MASK" => Ok(Self::Mask),
            "DELETE" => Ok(Self::Delete),
            "ENCRYPT" => Ok(Self::Encrypt),
            "QUARANTINE" => Ok(Self::Quarantine),
            other => Err(crate::error::Error::validation(format!(
                "unknown remediation action: {other}"
            ))),
        }
    }
}

/// Human-review states attached to each finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    Pending,
    Confirmed,
    FalsePositive,
    NeedsReview,
}

impl ReviewStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::FalsePositive => "false_positive",
            Self::NeedsReview => "needs_review",
        }
    }
}

impl fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ReviewStatus {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "false_positive" => Ok(Self::FalsePositive),
            "needs_review" => Ok(Self::NeedsReview),
            other => Err(crate::error::Error::validation(format!(
                "unknown review status: {other}"
            ))),
        }
    }
}

/// Source profile validation states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationStatus {
    Pending,
    Valid,
    Invalid,
}

impl ValidationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Valid => "valid",
            Self::Invalid => "invalid",
        }
    }
}

impl FromStr for ValidationStatus {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(Self::Pending),
            "valid" => Ok(Self::Valid),
            "invalid" => Ok(Self::Invalid),
            other => Err(crate::error::Error::validation(format!(
                "unknown validation status: {other}"
            ))),
        }
    }
}

/// Families of data sources the scanners report against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    Postgresql,
    Mysql,
    Filesystem,
    ObjectStore,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Postgresql => "postgresql",
            Self::Mysql => "mysql",
            Self::Filesystem => "fs",
            Self::ObjectStore => "object_store",
        }
    }

    /// Relational sources share the `data_source::host::schema.table`
    /// stable-id normalization; file-like sources use the raw path.
    pub fn is_relational(&self) -> bool {
        matches!(self, Self::Postgresql | Self::Mysql)
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SourceType {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "postgresql" | "postgres" => Ok(Self::Postgresql),
            "mysql" => Ok(Self::Mysql),
            "fs" | "filesystem" | "file" => Ok(Self::Filesystem),
            "object_store" | "s3" | "gcs" => Ok(Self::ObjectStore),
            other => Err(crate::error::Error::validation(format!(
                "unknown source type: {other}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_modulation() {
        assert_eq!(Severity::Medium.lift(), Severity::High);
        assert_eq!(Severity::Critical.lift(), Severity::Critical);
        assert_eq!(Severity::Medium.lower(), Severity::Low);
        assert_eq!(Severity::Low.lower(), Severity::Low);
    }

    #[test]
    fn test_scan_status_transitions() {
        assert!(ScanStatus::Pending.can_transition_to(ScanStatus::Running));
        assert!(ScanStatus::Running.can_transition_to(ScanStatus::Completed));
        assert!(ScanStatus::Running.can_transition_to(ScanStatus::Timeout));
        assert!(ScanStatus::Pending.can_transition_to(ScanStatus::Cancelled));
        assert!(!ScanStatus::Completed.can_transition_to(ScanStatus::Running));
        assert!(!ScanStatus::Cancelled.can_transition_to(ScanStatus::Completed));
        assert!(!ScanStatus::Pending.can_transition_to(ScanStatus::Completed));
    }

    #[test]
    fn test_remediation_status_transitions() {
        use RemediationStatus::*;
        assert!(Pending.can_transition_to(InProgress));
        assert!(InProgress.can_transition_to(Completed));
        assert!(InProgress.can_transition_to(Failed));
        assert!(Completed.can_transition_to(RolledBack));
        assert!(!Completed.can_transition_to(InProgress));
        assert!(!Failed.can_transition_to(RolledBack));
        assert!(!RolledBack.can_transition_to(Pending));
    }

    #[test]
    fn test_classification_type_consent() {
        assert!(ClassificationType::SensitivePersonal.requires_consent());
        assert!(ClassificationType::Personal.requires_consent());
        assert!(!ClassificationType::Secrets.requires_consent());
        assert!(!ClassificationType::NonPii.requires_consent());
    }

    #[test]
    fn test_tier_ordering() {
        assert!(ConfidenceTier::Confirmed > ConfidenceTier::HighConfidence);
        assert!(ConfidenceTier::NeedsReview > ConfidenceTier::Discard);
    }

    #[test]
    fn test_round_trips() {
        for s in ["pending", "running", "completed", "failed", "cancelled", "timeout"] {
            assert_eq!(s.parse::<ScanStatus>().unwrap().as_str(), s);
        }
        for s in ["PENDING", "IN_PROGRESS", "COMPLETED", "FAILED", "ROLLED_BACK"] {
            assert_eq!(s.parse::<RemediationStatus>().unwrap().as_str(), s);
        }
        assert_eq!(
            "Sensitive Personal Data".parse::<ClassificationType>().unwrap(),
            ClassificationType::SensitivePersonal
        );
    }

    #[test]
    fn test_source_type_families() {
        assert!("postgres".parse::<SourceType>().unwrap().is_relational());
        assert!(!"fs".parse::<SourceType>().unwrap().is_relational());
    }
}
