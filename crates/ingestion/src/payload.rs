//! Inbound payload decoding.
//!
//! Scanner payloads are heterogeneous JSON grouped by source family.
//! They are decoded as tagged variants at this boundary and collapsed to
//! the canonical candidate record before any business logic; nothing
//! downstream branches on raw map keys.

use privguard_core::types::{Severity, SourceType};
use privguard_core::{EntityId, Error, Result, TenantContext};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

/// One raw entry of a scanner report, as shipped on the wire
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawCandidate {
    pub host: String,
    /// Filesystem path or `<conn> > schema.table.column` locator
    pub file_path: String,
    pub pattern_name: String,
    #[serde(default)]
    pub matches: Vec<String>,
    #[serde(default)]
    pub sample_text: Option<String>,
    #[serde(default)]
    pub profile: Option<String>,
    #[serde(default)]
    pub data_source: Option<String>,
    #[serde(default)]
    pub file_data: serde_json::Value,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub confidence_score: Option<f64>,
}

/// Verified-findings report: arrays grouped by source family
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerReport {
    #[serde(flatten)]
    pub families: BTreeMap<String, Vec<RawCandidate>>,
}

/// Flat SDK-verified form: validation-gate fields are mandatory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SdkReport {
    #[serde(default)]
    pub scan_id: Option<EntityId>,
    pub findings: Vec<SdkFinding>,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

/// One SDK-verified finding; confidence is not optional here
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SdkFinding {
    pub host: String,
    pub file_path: String,
    pub pattern_name: String,
    pub source_type: String,
    pub confidence_score: f64,
    #[serde(default)]
    pub matches: Vec<String>,
    #[serde(default)]
    pub sample_text: Option<String>,
    #[serde(default)]
    pub data_source: Option<String>,
    #[serde(default)]
    pub column_name: Option<String>,
    #[serde(default)]
    pub metadata: serde_json::Value,
    #[serde(default)]
    pub severity: Option<String>,
}

/// Canonical candidate record consumed by the pipeline
#[derive(Debug, Clone)]
pub struct CandidateFinding {
    pub source_type: SourceType,
    pub host: String,
    pub locator: String,
    pub pattern_name: String,
    pub matches: Vec<String>,
    pub sample_text: Option<String>,
    pub data_source: String,
    pub column_name: Option<String>,
    pub metadata: serde_json::Value,
    pub scanner_severity: Option<Severity>,
    pub confidence: Option<f64>,
    pub environment_hint: Option<String>,
}

/// One ingestion batch, labeled by tenant and scan origin
#[derive(Debug, Clone)]
pub struct IngestBatch {
    pub tenant: TenantContext,
    pub profile_name: String,
    pub candidates: Vec<CandidateFinding>,
    pub metadata: serde_json::Value,
}

impl ScannerReport {
    /// Collapse the grouped report into a canonical batch. An unknown
    /// source family or an empty report is refused at this boundary.
    pub fn into_batch(self, tenant: TenantContext) -> Result<IngestBatch> {
        let mut candidates = Vec::new();
        let mut profile = None;

        for (family, entries) in self.families {
            let source_type = SourceType::from_str(&family).map_err(|_| {
                Error::validation(format!("unknown source family: {family}"))
            })?;

            for raw in entries {
                if profile.is_none() {
                    profile = raw.profile.clone();
                }
                candidates.push(raw.into_candidate(source_type));
            }
        }

        if candidates.is_empty() {
            return Err(Error::validation("no findings in batch"));
        }

        Ok(IngestBatch {
            tenant,
            profile_name: profile.unwrap_or_else(|| "default".to_string()),
            candidates,
            metadata: serde_json::json!({}),
        })
    }
}

impl RawCandidate {
    fn into_candidate(self, source_type: SourceType) -> CandidateFinding {
        let environment_hint = self
            .file_data
            .get("environment")
            .or_else(|| self.file_data.get("env"))
            .and_then(|v| v.as_str())
            .map(str::to_string);

        let column_name = if source_type.is_relational() {
            crate::stable_id::parse_db_locator(&self.file_path).column
        } else {
            None
        };

        CandidateFinding {
            source_type,
            host: self.host,
            locator: self.file_path,
            pattern_name: self.pattern_name,
            matches: self.matches,
            sample_text: self.sample_text,
            data_source: self
                .data_source
                .unwrap_or_else(|| source_type.as_str().to_string()),
            column_name,
            metadata: self.file_data,
            scanner_severity: self.severity.and_then(|s| Severity::from_str(&s).ok()),
            confidence: self.confidence_score,
            environment_hint,
        }
    }
}

impl SdkReport {
    /// Collapse the flat SDK form. Every finding must carry its
    /// validation-gate fields; a violation refuses the whole batch.
    pub fn into_batch(self, tenant: TenantContext) -> Result<IngestBatch> {
        if self.findings.is_empty() {
            return Err(Error::validation("no findings in batch"));
        }

        let mut candidates = Vec::with_capacity(self.findings.len());
        for (index, finding) in self.findings.into_iter().enumerate() {
            if !(0.0..=1.0).contains(&finding.confidence_score) {
                return Err(Error::validation(format!(
                    "finding {index}: confidence_score must be within [0, 1]"
                )));
            }
            if finding.pattern_name.trim().is_empty() {
                return Err(Error::validation(format!(
                    "finding {index}: pattern_name is mandatory"
                )));
            }

            let source_type = SourceType::from_str(&finding.source_type)?;
            let environment_hint = finding
                .metadata
                .get("environment")
                .and_then(|v| v.as_str())
                .map(str::to_string);
            let column_name = finding.column_name.clone().or_else(|| {
                if source_type.is_relational() {
                    crate::stable_id::parse_db_locator(&finding.file_path).column
                } else {
                    None
                }
            });

            candidates.push(CandidateFinding {
                source_type,
                host: finding.host,
                locator: finding.file_path,
                pattern_name: finding.pattern_name,
                matches: finding.matches,
                sample_text: finding.sample_text,
                data_source: finding
                    .data_source
                    .unwrap_or_else(|| source_type.as_str().to_string()),
                column_name,
                metadata: finding.metadata,
                scanner_severity: finding.severity.and_then(|s| Severity::from_str(&s).ok()),
                confidence: Some(finding.confidence_score),
                environment_hint,
            });
        }

        Ok(IngestBatch {
            tenant,
            profile_name: "sdk".to_string(),
            candidates,
            metadata: self.metadata,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report_json() -> serde_json::Value {
        serde_json::json!({
            "fs": [{
                "host": "files-01",
                "file_path": "/data/users/export.csv",
                "pattern_name": "IN_PAN",
                "matches": ["ABCDE1234F"],
                "sample_text": "pan: ABCDE1234F",
                "profile": "nightly",
                "data_source": "shared-nfs",
                "file_data": {"environment": "staging", "size": 1024}
            }],
            "postgresql": [{
                "host": "db-01",
                "file_path": "billing > public.customers.email",
                "pattern_name": "EMAIL",
                "matches": ["a@b.example"],
                "sample_text": null,
                "file_data": {}
            }]
        })
    }

    #[test]
    fn test_scanner_report_collapses_to_candidates() {
        let report: ScannerReport = serde_json::from_value(report_json()).unwrap();
        let batch = report.into_batch(TenantContext::legacy()).unwrap();

        assert_eq!(batch.candidates.len(), 2);
        assert_eq!(batch.profile_name, "nightly");

        let fs = batch
            .candidates
            .iter()
            .find(|c| c.source_type == SourceType::Filesystem)
            .unwrap();
        assert_eq!(fs.environment_hint.as_deref(), Some("staging"));
        assert_eq!(fs.data_source, "shared-nfs");
        assert!(fs.column_name.is_none());

        let pg = batch
            .candidates
            .iter()
            .find(|c| c.source_type == SourceType::Postgresql)
            .unwrap();
        assert_eq!(pg.column_name.as_deref(), Some("email"));
        // Missing data_source defaults to the source family
        assert_eq!(pg.data_source, "postgresql");
    }

    #[test]
    fn test_empty_report_is_refused() {
        let report: ScannerReport = serde_json::from_value(serde_json::json!({})).unwrap();
        let err = report.into_batch(TenantContext::legacy()).unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
    }

    #[test]
    fn test_unknown_family_is_refused() {
        let report: ScannerReport = serde_json::from_value(serde_json::json!({
            "carrier_pigeon": [{
                "host": "h", "file_path": "/x", "pattern_name": "EMAIL"
            }]
        }))
        .unwrap();
        assert!(report.into_batch(TenantContext::legacy()).is_err());
    }

    #[test]
    fn test_sdk_confidence_is_mandatory_and_bounded() {
        let report = SdkReport {
            scan_id: None,
            findings: vec![SdkFinding {
                host: "db-01".to_string(),
                file_path: "billing > public.users.pan".to_string(),
                pattern_name: "IN_PAN".to_string(),
                source_type: "postgresql".to_string(),
                confidence_score: 1.7,
                matches: vec![],
                sample_text: None,
                data_source: None,
                column_name: None,
                metadata: serde_json::json!({}),
                severity: None,
            }],
            metadata: serde_json::json!({}),
        };
        assert!(report.into_batch(TenantContext::legacy()).is_err());
    }

    #[test]
    fn test_sdk_empty_batch_is_refused() {
        let report = SdkReport {
            scan_id: None,
            findings: vec![],
            metadata: serde_json::json!({}),
        };
        assert!(report.into_batch(TenantContext::legacy()).is_err());
    }
}
