//! Dynamic severity and risk scoring.
//!
//! Severity is a two-dimensional table keyed by (classification type,
//! confidence tier) and modulated by environment: production lifts one
//! level, non-production lowers one; Secrets in production floor at High.

use privguard_core::types::{ClassificationType, ConfidenceTier, Environment, Severity};
use privguard_core::AssetFindingStats;

/// Base severity before environment modulation
fn base_severity(classification_type: ClassificationType, tier: ConfidenceTier) -> Severity {
    use ClassificationType::*;
    use ConfidenceTier::*;

    match (classification_type, tier) {
        (SensitivePersonal, Confirmed | HighConfidence) => Severity::High,
        (SensitivePersonal, Validated | NeedsReview) => Severity::Medium,
        (SensitivePersonal, Discard) => Severity::Low,

        (Secrets, Confirmed | HighConfidence) => Severity::High,
        (Secrets, Validated | NeedsReview) => Severity::Medium,
        (Secrets, Discard) => Severity::Low,

        (Personal, Confirmed | HighConfidence) => Severity::Medium,
        (Personal, _) => Severity::Low,

        (NonPii, _) => Severity::Low,
    }
}

/// Severity for a classified finding, environment-modulated
pub fn dynamic_severity(
    classification_type: ClassificationType,
    tier: ConfidenceTier,
    environment: Environment,
) -> Severity {
    let base = base_severity(classification_type, tier);
    let modulated = if environment.is_production() {
        base.lift()
    } else {
        base.lower()
    };

    // Secrets in production are always at least High
    if classification_type == ClassificationType::Secrets && environment.is_production() {
        modulated.max(Severity::High)
    } else {
        modulated
    }
}

fn type_weight(classification_type: ClassificationType) -> f64 {
    match classification_type {
        ClassificationType::SensitivePersonal => 1.0,
        ClassificationType::Secrets => 0.9,
        ClassificationType::Personal => 0.7,
        ClassificationType::NonPii => 0.2,
    }
}

fn tier_multiplier(tier: ConfidenceTier) -> f64 {
    match tier {
        ConfidenceTier::Confirmed => 1.0,
        ConfidenceTier::HighConfidence => 0.9,
        ConfidenceTier::Validated => 0.75,
        ConfidenceTier::NeedsReview => 0.5,
        ConfidenceTier::Discard => 0.25,
    }
}

fn environment_multiplier(environment: Environment) -> f64 {
    match environment {
        Environment::Production => 1.0,
        Environment::Staging => 0.8,
        Environment::Development => 0.7,
        Environment::Test => 0.6,
    }
}

/// Deterministic finding risk score in [0, 100], used to sort findings
/// and to feed asset risk aggregation
pub fn risk_score(
    classification_type: ClassificationType,
    tier: ConfidenceTier,
    environment: Environment,
) -> i32 {
    let score = 100.0
        * type_weight(classification_type)
        * tier_multiplier(tier)
        * environment_multiplier(environment);
    score.round() as i32
}

/// Per-asset risk recomputed whenever findings change: any Critical
/// finding dominates, then High with a count escalation, then presence.
pub fn aggregate_asset_risk(stats: &AssetFindingStats) -> i32 {
    if stats.total_findings == 0 {
        return 10;
    }
    if stats.has_severity(Severity::Critical) {
        return 95;
    }
    if stats.has_severity(Severity::High) {
        return if stats.total_findings > 3 { 85 } else { 75 };
    }
    if stats.total_findings > 10 {
        60
    } else {
        40
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use privguard_core::PiiTypeAggregate;

    #[test]
    fn test_sensitive_confirmed_production_is_critical() {
        assert_eq!(
            dynamic_severity(
                ClassificationType::SensitivePersonal,
                ConfidenceTier::Confirmed,
                Environment::Production
            ),
            Severity::Critical
        );
    }

    #[test]
    fn test_non_production_lowers() {
        assert_eq!(
            dynamic_severity(
                ClassificationType::SensitivePersonal,
                ConfidenceTier::Confirmed,
                Environment::Development
            ),
            Severity::Medium
        );
    }

    #[test]
    fn test_secrets_production_floor() {
        // Even a Discard-tier secret holds the High floor in production
        assert_eq!(
            dynamic_severity(
                ClassificationType::Secrets,
                ConfidenceTier::Discard,
                Environment::Production
            ),
            Severity::High
        );
    }

    #[test]
    fn test_risk_score_extremes() {
        assert_eq!(
            risk_score(
                ClassificationType::SensitivePersonal,
                ConfidenceTier::Confirmed,
                Environment::Production
            ),
            100
        );
        assert_eq!(
            risk_score(
                ClassificationType::NonPii,
                ConfidenceTier::Discard,
                Environment::Test
            ),
            3
        );
    }

    #[test]
    fn test_risk_score_is_monotone_in_tier() {
        let score = |tier| {
            risk_score(
                ClassificationType::Personal,
                tier,
                Environment::Production,
            )
        };
        assert!(score(ConfidenceTier::Confirmed) > score(ConfidenceTier::HighConfidence));
        assert!(score(ConfidenceTier::HighConfidence) > score(ConfidenceTier::Validated));
        assert!(score(ConfidenceTier::Validated) > score(ConfidenceTier::NeedsReview));
    }

    fn stats(total: i64, max_severity: Severity) -> AssetFindingStats {
        AssetFindingStats {
            total_findings: total,
            by_type: vec![PiiTypeAggregate {
                classification_type: ClassificationType::Personal,
                finding_count: total,
                avg_confidence: 0.8,
                max_severity,
            }],
        }
    }

    #[test]
    fn test_aggregate_asset_risk_rule() {
        assert_eq!(
            aggregate_asset_risk(&AssetFindingStats {
                total_findings: 0,
                by_type: vec![]
            }),
            10
        );
        assert_eq!(aggregate_asset_risk(&stats(1, Severity::Critical)), 95);
        assert_eq!(aggregate_asset_risk(&stats(2, Severity::High)), 75);
        assert_eq!(aggregate_asset_risk(&stats(4, Severity::High)), 85);
        assert_eq!(aggregate_asset_risk(&stats(5, Severity::Medium)), 40);
        assert_eq!(aggregate_asset_risk(&stats(11, Severity::Low)), 60);
    }
}
