//! Enrichment service.
//!
//! Computes the contextual signals consumed by the classifier: asset
//! semantics, environment, value statistics, token shape, and the salted
//! value hash used for dedup and consent linkage. Enrichment never fails
//! the pipeline; a signal that cannot be computed sets `enrichment_failed`
//! and downstream treats the absent signal as neutral, not as zero.

use crate::rules::{tokenize, SEMANTIC_PATH_KEYWORDS};
use privguard_core::types::Environment;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::str::FromStr;

/// Neutral stand-in for a signal that failed to compute
const NEUTRAL_SIGNAL: f64 = 0.5;

/// Inputs to enrichment, assembled by the ingestion pipeline
#[derive(Debug, Clone)]
pub struct EnrichmentContext<'a> {
    pub asset_path: &'a str,
    /// First match, already normalized (lowercased, spaces/hyphens stripped)
    pub normalized_value: &'a str,
    pub pattern_name: &'a str,
    pub asset_type: &'a str,
    pub column_name: Option<&'a str>,
    /// Explicit environment label from the scanner, when present
    pub explicit_environment: Option<&'a str>,
    /// Database name hint for relational sources
    pub database_name: Option<&'a str>,
}

/// Signals produced by enrichment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichmentSignals {
    /// Boost in [0,1] when path tokens match sensitive-location keywords
    pub asset_semantics: f64,
    pub environment: Environment,
    /// Shannon entropy of the normalized value, scaled to [0,1]
    pub entropy: f64,
    /// Fraction of character classes (lower/upper/digit/symbol) present
    pub charset_diversity: f64,
    /// Canonicalized character-class pattern of the value
    pub token_shape: String,
    /// Salted hash for dedup and consent linkage
    pub value_hash: String,
    /// Count of the same value_hash seen before, when known
    pub historical_count: Option<i64>,
    /// True iff any signal failed to compute
    pub enrichment_failed: bool,
}

/// Stateless enrichment service. The salt is process configuration,
/// injected at startup.
#[derive(Debug, Clone)]
pub struct Enricher {
    value_salt: String,
}

impl Enricher {
    pub fn new(value_salt: impl Into<String>) -> Self {
        Self {
            value_salt: value_salt.into(),
        }
    }

    /// Compute all enrichment signals for one candidate
    pub fn enrich(&self, ctx: &EnrichmentContext<'_>) -> EnrichmentSignals {
        let mut failed = false;

        let asset_semantics = asset_semantics(ctx.asset_path, ctx.column_name);
        let environment = infer_environment(
            ctx.explicit_environment,
            ctx.asset_path,
            ctx.database_name,
        );

        let (entropy, charset_diversity, token_shape) = if ctx.normalized_value.is_empty() {
            failed = true;
            (NEUTRAL_SIGNAL, NEUTRAL_SIGNAL, String::new())
        } else {
            (
                normalized_entropy(ctx.normalized_value),
                charset_diversity(ctx.normalized_value),
                token_shape(ctx.normalized_value),
            )
        };

        let value_hash = self.salted_hash(ctx.normalized_value);

        EnrichmentSignals {
            asset_semantics,
            environment,
            entropy,
            charset_diversity,
            token_shape,
            value_hash,
            historical_count: None,
            enrichment_failed: failed,
        }
    }

    /// Salted SHA-256 of a normalized value, hex-encoded
    pub fn salted_hash(&self, normalized_value: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.value_salt.as_bytes());
        hasher.update(b":");
        hasher.update(normalized_value.as_bytes());
        hex::encode(hasher.finalize())
    }
}

/// Combine signals into the Context Signal consumed by the classifier.
/// Weights are fixed; this is not the configurable classifier weighting.
pub fn enrichment_score(signals: &EnrichmentSignals) -> f64 {
    let environment_weight = match signals.environment {
        Environment::Production => 1.0,
        Environment::Staging => 0.6,
        Environment::Development => 0.4,
        Environment::Test => 0.2,
    };

    let score = 0.4 * signals.asset_semantics
        + 0.2 * signals.entropy
        + 0.1 * signals.charset_diversity
        + 0.3 * environment_weight;
    score.clamp(0.0, 1.0)
}

/// Semantic sensitivity of the asset location: base 0.2, +0.2 per distinct
/// sensitive keyword found in the path or the column name, capped at 1.0.
fn asset_semantics(path: &str, column: Option<&str>) -> f64 {
    let mut tokens = tokenize(path);
    if let Some(col) = column {
        tokens.extend(tokenize(col));
    }

    let hits = SEMANTIC_PATH_KEYWORDS
        .iter()
        .filter(|k| tokens.iter().any(|t| t.starts_with(*k)))
        .count();

    (0.2 + 0.2 * hits as f64).min(1.0)
}

/// Environment inference: explicit field first, then path and database
/// name hints. Unknown defaults to production: the safe assumption for
/// risk scoring.
pub fn infer_environment(explicit: Option<&str>, path: &str, database: Option<&str>) -> Environment {
    if let Some(value) = explicit {
        if let Ok(env) = Environment::from_str(value) {
            return env;
        }
    }

    let mut haystack = path.to_lowercase();
    if let Some(db) = database {
        haystack.push('/');
        haystack.push_str(&db.to_lowercase());
    }

    if haystack.contains("prod") {
        Environment::Production
    } else if haystack.contains("stag") {
        Environment::Staging
    } else if haystack.contains("test") || haystack.contains("qa") {
        Environment::Test
    } else if haystack.contains("dev") {
        Environment::Development
    } else {
        Environment::Production
    }
}

/// Shannon entropy of the value scaled by the maximum achievable for its
/// length, yielding [0,1]. Single-character values score 0.
fn normalized_entropy(value: &str) -> f64 {
    let chars: Vec<char> = value.chars().collect();
    let n = chars.len();
    if n < 2 {
        return 0.0;
    }

    let mut counts = std::collections::HashMap::new();
    for c in &chars {
        *counts.entry(*c).or_insert(0usize) += 1;
    }

    let n_f = n as f64;
    let entropy: f64 = counts
        .values()
        .map(|&count| {
            let p = count as f64 / n_f;
            -p * p.log2()
        })
        .sum();

    (entropy / n_f.log2()).clamp(0.0, 1.0)
}

/// Fraction of character classes present: lowercase, uppercase, digit, symbol
fn charset_diversity(value: &str) -> f64 {
    let mut lower = false;
    let mut upper = false;
    let mut digit = false;
    let mut symbol = false;
    for c in value.chars() {
        if c.is_ascii_lowercase() {
            lower = true;
        } else if c.is_ascii_uppercase() {
            upper = true;
        } else if c.is_ascii_digit() {
            digit = true;
        } else {
            symbol = true;
        }
    }
    [lower, upper, digit, symbol].iter().filter(|b| **b).count() as f64 / 4.0
}

/// Canonical character-class pattern: runs of the same class collapse to
/// one marker with a length, e.g. "abc123" -> "a{3}9{3}". Capped at 16
/// runs; longer values truncate with "+".
fn token_shape(value: &str) -> String {
    fn class_of(c: char) -> char {
        if c.is_ascii_lowercase() {
            'a'
        } else if c.is_ascii_uppercase() {
            'A'
        } else if c.is_ascii_digit() {
            '9'
        } else {
            '#'
        }
    }

    let mut shape = String::new();
    let mut runs = 0usize;
    let mut current: Option<(char, usize)> = None;

    for c in value.chars() {
        let class = class_of(c);
        match current {
            Some((prev, count)) if prev == class => current = Some((prev, count + 1)),
            Some((prev, count)) => {
                shape.push_str(&format!("{prev}{{{count}}}"));
                runs += 1;
                if runs >= 16 {
                    shape.push('+');
                    return shape;
                }
                current = Some((class, 1));
            }
            None => current = Some((class, 1)),
        }
    }
    if let Some((prev, count)) = current {
        shape.push_str(&format!("{prev}{{{count}}}"));
    }
    shape
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx<'a>(path: &'a str, value: &'a str) -> EnrichmentContext<'a> {
        EnrichmentContext {
            asset_path: path,
            normalized_value: value,
            pattern_name: "IN_PAN",
            asset_type: "file",
            column_name: None,
            explicit_environment: None,
            database_name: None,
        }
    }

    #[test]
    fn test_asset_semantics_boost() {
        let enricher = Enricher::new("salt");
        let sensitive = enricher.enrich(&ctx("/data/users/billing.csv", "abcde1234f"));
        let bland = enricher.enrich(&ctx("/var/log/syslog", "abcde1234f"));
        assert!(sensitive.asset_semantics > bland.asset_semantics);
        assert_eq!(bland.asset_semantics, 0.2);
    }

    #[test]
    fn test_environment_inference() {
        let enricher = Enricher::new("salt");

        let explicit = EnrichmentContext {
            explicit_environment: Some("staging"),
            ..ctx("/prod/users.csv", "v")
        };
        assert_eq!(enricher.enrich(&explicit).environment, Environment::Staging);

        assert_eq!(
            enricher.enrich(&ctx("/prod/data.csv", "v")).environment,
            Environment::Production
        );
        assert_eq!(
            enricher.enrich(&ctx("/srv/testdata/x.csv", "v")).environment,
            Environment::Test
        );
        // Unknown defaults to production
        assert_eq!(
            enricher.enrich(&ctx("/opt/files/x.csv", "v")).environment,
            Environment::Production
        );
    }

    #[test]
    fn test_entropy_bounds() {
        assert_eq!(normalized_entropy("a"), 0.0);
        assert_eq!(normalized_entropy("aaaa"), 0.0);
        // All-distinct characters reach the maximum
        assert!((normalized_entropy("abcd") - 1.0).abs() < 1e-9);
        let mid = normalized_entropy("aabbccdd11");
        assert!(mid > 0.0 && mid < 1.0);
    }

    #[test]
    fn test_charset_diversity() {
        assert_eq!(charset_diversity("123456"), 0.25);
        assert_eq!(charset_diversity("abc123"), 0.5);
        assert_eq!(charset_diversity("Ab1!"), 1.0);
    }

    #[test]
    fn test_token_shape() {
        assert_eq!(token_shape("abc123"), "a{3}9{3}");
        assert_eq!(token_shape("ABCDE1234F"), "A{5}9{4}A{1}");
        assert_eq!(token_shape("a-1"), "a{1}#{1}9{1}");
    }

    #[test]
    fn test_salted_hash_differs_by_salt() {
        let a = Enricher::new("salt-a").salted_hash("value");
        let b = Enricher::new("salt-b").salted_hash("value");
        assert_ne!(a, b);
        assert_eq!(a, Enricher::new("salt-a").salted_hash("value"));
    }

    #[test]
    fn test_empty_value_marks_enrichment_failed() {
        let enricher = Enricher::new("salt");
        let signals = enricher.enrich(&ctx("/data/users.csv", ""));
        assert!(signals.enrichment_failed);
        // Failed statistical signals fall back to neutral, not zero
        assert_eq!(signals.entropy, NEUTRAL_SIGNAL);
        assert_eq!(signals.charset_diversity, NEUTRAL_SIGNAL);
    }

    #[test]
    fn test_enrichment_score_production_exceeds_test() {
        let enricher = Enricher::new("salt");
        let prod = enricher.enrich(&ctx("/prod/users/data.csv", "abcde1234f"));
        let test = enricher.enrich(&EnrichmentContext {
            explicit_environment: Some("test"),
            ..ctx("/prod/users/data.csv", "abcde1234f")
        });
        assert!(enrichment_score(&prod) > enrichment_score(&test));
    }
}
