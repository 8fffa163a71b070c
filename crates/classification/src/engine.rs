//! Classification engine.
//!
//! A classification decision is computed from four signals, each carrying
//! a raw score in [0,1], a configured weight, and an explanation. The
//! final score is the weight-normalized sum over applicable signals. The
//! engine is pure and does not fail: missing inputs are neutral signals,
//! and an empty applicable set yields Non-PII / NEEDS_REVIEW.

use crate::enrichment::{enrichment_score, EnrichmentSignals};
use crate::rules::{
    any_token_matches, classification_for, corroboration_keywords, is_secret_shaped, tokenize,
};
use crate::severity::{dynamic_severity, risk_score};
use privguard_core::config::ClassificationConfig;
use privguard_core::types::{ClassificationType, ConfidenceTier, Environment, Severity};
use serde::Serialize;

/// Version stamp stored on every classification row
pub const CLASSIFIER_VERSION: &str = "1.2.0";

/// Input to one classification decision
#[derive(Debug, Clone)]
pub struct ClassificationInput<'a> {
    /// Canonical locked pattern name, already validated at ingestion
    pub canonical_pattern: &'a str,
    pub column_name: Option<&'a str>,
    pub asset_path: &'a str,
    /// Scanner-supplied ML confidence, when present
    pub external_confidence: Option<f64>,
    pub signals: &'a EnrichmentSignals,
}

/// One scored signal with its explanation, kept for audit
#[derive(Debug, Clone, Serialize)]
pub struct SignalScore {
    pub name: &'static str,
    pub raw: f64,
    pub weight: f64,
    pub explanation: String,
}

/// Full classification decision with explainability
#[derive(Debug, Clone, Serialize)]
pub struct ClassificationDecision {
    pub classification_type: ClassificationType,
    pub sub_category: String,
    pub tier: ConfidenceTier,
    pub final_score: f64,
    pub severity: Severity,
    pub risk_score: i32,
    pub requires_consent: bool,
    pub dpdpa_category: Option<String>,
    pub retention_period: Option<String>,
    /// Concatenated per-signal explanations, stored verbatim
    pub justification: String,
    pub signals: Vec<SignalScore>,
    pub classifier_version: String,
}

/// Stateless classification engine holding validated configuration
#[derive(Debug, Clone)]
pub struct Classifier {
    config: ClassificationConfig,
}

impl Classifier {
    pub fn new(config: ClassificationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClassificationConfig {
        &self.config
    }

    /// Classify one candidate. Pure; never fails.
    pub fn classify(&self, input: &ClassificationInput<'_>) -> ClassificationDecision {
        let (classification_type, sub_category) = classification_for(input.canonical_pattern);
        let environment = input.signals.environment;

        let mut signals = Vec::with_capacity(4);
        signals.push(self.rule_signal(input, classification_type));
        signals.push(self.ml_signal(input));
        signals.push(self.context_signal(input));
        signals.push(self.entropy_signal(input));

        let weight_sum: f64 = signals.iter().map(|s| s.weight).sum();
        if weight_sum <= 0.0 {
            return self.fallback_decision(environment, signals);
        }

        let final_score = (signals.iter().map(|s| s.raw * s.weight).sum::<f64>() / weight_sum)
            .clamp(0.0, 1.0);

        let tier = self.tier_for(final_score);
        let severity = dynamic_severity(classification_type, tier, environment);
        let risk = risk_score(classification_type, tier, environment);
        let justification = join_explanations(&signals);

        tracing::debug!(
            pattern = input.canonical_pattern,
            score = final_score,
            tier = %tier,
            "classification decision"
        );

        ClassificationDecision {
            classification_type,
            sub_category: sub_category.to_string(),
            tier,
            final_score,
            severity,
            risk_score: risk,
            requires_consent: classification_type.requires_consent(),
            dpdpa_category: dpdpa_category(classification_type),
            retention_period: retention_period(classification_type),
            justification,
            signals,
            classifier_version: CLASSIFIER_VERSION.to_string(),
        }
    }

    /// Rule signal: lexical corroboration of the locked pattern against
    /// column name and path tokens. Always applicable.
    fn rule_signal(
        &self,
        input: &ClassificationInput<'_>,
        classification_type: ClassificationType,
    ) -> SignalScore {
        let keywords = corroboration_keywords(classification_type);
        let column_hit = input
            .column_name
            .map(|col| any_token_matches(&tokenize(col), keywords))
            .unwrap_or(false);
        let path_hit = any_token_matches(&tokenize(input.asset_path), keywords);

        let mut raw: f64 = 0.65;
        if column_hit {
            raw += 0.2;
        }
        if path_hit {
            raw += 0.2;
        }

        SignalScore {
            name: "rule",
            raw: raw.min(1.0),
            weight: self.config.weights.rules,
            explanation: format!(
                "rule: pattern {} in locked scope, column corroboration {}, path corroboration {}",
                input.canonical_pattern,
                if column_hit { "yes" } else { "no" },
                if path_hit { "yes" } else { "no" },
            ),
        }
    }

    /// External-ML signal: scanner-supplied confidence. Weight 0 when absent.
    fn ml_signal(&self, input: &ClassificationInput<'_>) -> SignalScore {
        match input.external_confidence {
            Some(confidence) => SignalScore {
                name: "external_ml",
                raw: confidence.clamp(0.0, 1.0),
                weight: self.config.weights.external_ml,
                explanation: format!("external_ml: scanner confidence {confidence:.2}"),
            },
            None => SignalScore {
                name: "external_ml",
                raw: 0.0,
                weight: 0.0,
                explanation: "external_ml: absent".to_string(),
            },
        }
    }

    /// Context signal: the combined enrichment score. Always applicable;
    /// failed enrichment already substituted neutral values upstream.
    fn context_signal(&self, input: &ClassificationInput<'_>) -> SignalScore {
        let score = enrichment_score(input.signals);
        SignalScore {
            name: "context",
            raw: score,
            weight: self.config.weights.context,
            explanation: format!(
                "context: enrichment score {score:.2} (semantics {:.2}, environment {})",
                input.signals.asset_semantics, input.signals.environment,
            ),
        }
    }

    /// Entropy signal: applies only to secret/token-shaped patterns.
    fn entropy_signal(&self, input: &ClassificationInput<'_>) -> SignalScore {
        if !is_secret_shaped(input.canonical_pattern) {
            return SignalScore {
                name: "entropy",
                raw: 0.0,
                weight: 0.0,
                explanation: "entropy: not applicable".to_string(),
            };
        }

        let raw = 0.6 * input.signals.entropy + 0.4 * input.signals.charset_diversity;
        SignalScore {
            name: "entropy",
            raw: raw.clamp(0.0, 1.0),
            weight: self.config.weights.entropy,
            explanation: format!(
                "entropy: value entropy {:.2}, charset diversity {:.2}",
                input.signals.entropy, input.signals.charset_diversity,
            ),
        }
    }

    fn tier_for(&self, score: f64) -> ConfidenceTier {
        let t = &self.config.thresholds;
        if score >= t.confirmed {
            ConfidenceTier::Confirmed
        } else if score >= t.high {
            ConfidenceTier::HighConfidence
        } else if score >= t.needs_review {
            ConfidenceTier::Validated
        } else if score >= t.discard {
            ConfidenceTier::NeedsReview
        } else {
            ConfidenceTier::Discard
        }
    }

    /// No applicable signal: Non-PII / NEEDS_REVIEW
    fn fallback_decision(
        &self,
        environment: Environment,
        signals: Vec<SignalScore>,
    ) -> ClassificationDecision {
        let classification_type = ClassificationType::NonPii;
        let tier = ConfidenceTier::NeedsReview;
        ClassificationDecision {
            classification_type,
            sub_category: "unclassified".to_string(),
            tier,
            final_score: 0.0,
            severity: dynamic_severity(classification_type, tier, environment),
            risk_score: risk_score(classification_type, tier, environment),
            requires_consent: false,
            dpdpa_category: None,
            retention_period: None,
            justification: "no applicable classification signal".to_string(),
            signals,
            classifier_version: CLASSIFIER_VERSION.to_string(),
        }
    }
}

fn dpdpa_category(classification_type: ClassificationType) -> Option<String> {
    match classification_type {
        ClassificationType::SensitivePersonal => Some("sensitive_personal_data".to_string()),
        ClassificationType::Personal => Some("personal_data".to_string()),
        ClassificationType::Secrets => Some("credential".to_string()),
        ClassificationType::NonPii => None,
    }
}

fn retention_period(classification_type: ClassificationType) -> Option<String> {
    match classification_type {
        ClassificationType::SensitivePersonal => Some("5 years".to_string()),
        ClassificationType::Personal => Some("3 years".to_string()),
        ClassificationType::Secrets => Some("90 days".to_string()),
        ClassificationType::NonPii => None,
    }
}

fn join_explanations(signals: &[SignalScore]) -> String {
    signals
        .iter()
        .map(|s| s.explanation.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrichment::{Enricher, EnrichmentContext};
    use privguard_core::config::SignalWeights;

    fn classifier() -> Classifier {
        Classifier::new(ClassificationConfig::default())
    }

    fn signals_for(path: &str, value: &str, env: Option<&str>) -> EnrichmentSignals {
        Enricher::new("test-salt").enrich(&EnrichmentContext {
            asset_path: path,
            normalized_value: value,
            pattern_name: "IN_AADHAAR",
            asset_type: "file",
            column_name: None,
            explicit_environment: env,
            database_name: None,
        })
    }

    #[test]
    fn test_aadhaar_production_scenario() {
        let signals = signals_for(
            "/prod/users/identity.csv",
            "234567890123",
            Some("production"),
        );
        let decision = classifier().classify(&ClassificationInput {
            canonical_pattern: "IN_AADHAAR",
            column_name: None,
            asset_path: "/prod/users/identity.csv",
            external_confidence: Some(0.92),
            signals: &signals,
        });

        assert_eq!(
            decision.classification_type,
            ClassificationType::SensitivePersonal
        );
        assert_eq!(decision.tier, ConfidenceTier::Confirmed);
        assert_eq!(decision.severity, Severity::Critical);
        assert_eq!(decision.risk_score, 100);
        assert!(decision.requires_consent);
        assert_eq!(
            decision.dpdpa_category.as_deref(),
            Some("sensitive_personal_data")
        );
    }

    #[test]
    fn test_final_score_is_weight_normalized() {
        let signals = signals_for("/opt/data/file.csv", "abcde1234f", Some("production"));
        let with_ml = classifier().classify(&ClassificationInput {
            canonical_pattern: "IN_PAN",
            column_name: None,
            asset_path: "/opt/data/file.csv",
            external_confidence: Some(1.0),
            signals: &signals,
        });
        let without_ml = classifier().classify(&ClassificationInput {
            canonical_pattern: "IN_PAN",
            column_name: None,
            asset_path: "/opt/data/file.csv",
            external_confidence: None,
            signals: &signals,
        });

        // Absent ML removes its weight from the denominator rather than
        // pulling the score toward zero
        assert!(with_ml.final_score > without_ml.final_score);
        assert!(without_ml.final_score > 0.4);
    }

    #[test]
    fn test_entropy_applies_only_to_secrets() {
        let signals = signals_for("/etc/app/config.env", "sk_live_a8Bc9dEf0gH1", None);

        let secret = classifier().classify(&ClassificationInput {
            canonical_pattern: "API_KEY",
            column_name: None,
            asset_path: "/etc/app/config.env",
            external_confidence: None,
            signals: &signals,
        });
        let email = classifier().classify(&ClassificationInput {
            canonical_pattern: "EMAIL",
            column_name: None,
            asset_path: "/etc/app/config.env",
            external_confidence: None,
            signals: &signals,
        });

        let entropy_weight = |d: &ClassificationDecision| {
            d.signals
                .iter()
                .find(|s| s.name == "entropy")
                .map(|s| s.weight)
                .unwrap_or_default()
        };
        assert!(entropy_weight(&secret) > 0.0);
        assert_eq!(entropy_weight(&email), 0.0);
    }

    #[test]
    fn test_column_corroboration_raises_rule_signal() {
        let signals = signals_for("/opt/export.csv", "user@example.com", None);
        let base = ClassificationInput {
            canonical_pattern: "EMAIL",
            column_name: None,
            asset_path: "/opt/export.csv",
            external_confidence: None,
            signals: &signals,
        };
        let plain = classifier().classify(&base);
        let corroborated = classifier().classify(&ClassificationInput {
            column_name: Some("customer_email"),
            ..base
        });

        let rule_raw = |d: &ClassificationDecision| {
            d.signals.iter().find(|s| s.name == "rule").unwrap().raw
        };
        assert!(rule_raw(&corroborated) > rule_raw(&plain));
    }

    #[test]
    fn test_zero_weight_sum_falls_back() {
        let config = ClassificationConfig {
            weights: SignalWeights {
                rules: 0.0,
                external_ml: 0.5,
                context: 0.0,
                entropy: 0.0,
            },
            ..ClassificationConfig::default()
        };
        let signals = signals_for("/opt/export.csv", "value123", None);
        let decision = Classifier::new(config).classify(&ClassificationInput {
            canonical_pattern: "EMAIL",
            column_name: None,
            asset_path: "/opt/export.csv",
            external_confidence: None, // ML absent, so no signal applies
            signals: &signals,
        });

        assert_eq!(decision.classification_type, ClassificationType::NonPii);
        assert_eq!(decision.tier, ConfidenceTier::NeedsReview);
    }

    #[test]
    fn test_justification_concatenates_signal_explanations() {
        let signals = signals_for("/prod/users/data.csv", "234567890123", None);
        let decision = classifier().classify(&ClassificationInput {
            canonical_pattern: "IN_AADHAAR",
            column_name: Some("aadhaar_number"),
            asset_path: "/prod/users/data.csv",
            external_confidence: Some(0.8),
            signals: &signals,
        });

        assert!(decision.justification.contains("rule:"));
        assert!(decision.justification.contains("external_ml:"));
        assert!(decision.justification.contains("context:"));
        assert!(decision.justification.contains("entropy:"));
    }

    #[test]
    fn test_confidence_score_in_unit_interval() {
        for value in ["a", "234567890123", "sk_live_xxx", ""] {
            let signals = signals_for("/data/users.csv", value, None);
            let decision = classifier().classify(&ClassificationInput {
                canonical_pattern: "IN_PAN",
                column_name: None,
                asset_path: "/data/users.csv",
                external_confidence: Some(0.5),
                signals: &signals,
            });
            assert!((0.0..=1.0).contains(&decision.final_score));
        }
    }
}
