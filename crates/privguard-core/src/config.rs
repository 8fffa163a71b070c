// Modified: 2026-03-14

//! Configuration management for the Privguard platform.
//!
//! Process-wide settings are loaded once at startup and injected into
//! components; nothing in the core reads the environment after boot.

use crate::error::Error;
use crate::types::Result;
use serde::{Deserialize, Serialize};
use std::env;

/// Main configuration structure for the Privguard platform
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformConfig {
    /// Catalog database configuration
    pub database: DatabaseConfig,
    /// API server configuration
    pub server: ServerConfig,
    /// Graph store configuration
    pub graph: GraphConfig,
    /// Classification engine configuration
    pub classification: ClassificationConfig,
    /// Scan lifecycle configuration
    pub scan: ScanConfig,
    /// Ingest-time suppression configuration
    pub ingest: IngestConfig,
    /// Credential encryption configuration
    pub encryption: EncryptionConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Catalog database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database URL
    pub url: String,
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Connection acquire timeout in seconds
    pub timeout_seconds: u64,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host address
    pub host: String,
    /// Server port
    pub port: u16,
    /// Maximum request body size in bytes
    pub max_body_size: usize,
}

/// Graph store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphConfig {
    /// When false, graph sync is a no-op and lineage endpoints report unavailable
    pub enabled: bool,
    /// Bolt URI of the Neo4j instance
    pub uri: String,
    /// Neo4j user
    pub user: String,
    /// Neo4j password
    pub password: String,
    /// Number of parallel synchronizer workers
    pub sync_workers: usize,
    /// Depth of the pending-sync queue
    pub sync_queue_depth: usize,
    /// Interval of the periodic full-resync sweep
    pub resync_interval_minutes: u64,
}

/// Classification engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationConfig {
    /// Per-signal weights, summed at runtime
    pub weights: SignalWeights,
    /// Monotone decreasing tier cutoffs
    pub thresholds: TierThresholds,
    /// Normalized pattern-name allowlist. Empty means the built-in set.
    pub locked_types: Vec<String>,
}

/// Per-signal classification weights
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SignalWeights {
    pub rules: f64,
    pub external_ml: f64,
    pub context: f64,
    pub entropy: f64,
}

/// Confidence tier cutoffs applied to the final score
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TierThresholds {
    pub confirmed: f64,
    pub high: f64,
    pub needs_review: f64,
    pub discard: f64,
}

/// Scan lifecycle configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Per-run wall-clock deadline, overridable via ScanRun metadata
    pub timeout_minutes: i64,
    /// Interval of the background timeout sweeper
    pub cleanup_interval_minutes: u64,
}

/// Ingest-time suppression configuration (spec open question 9a:
/// persist everything by default, suppression is deployment opt-in)
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Drop findings classified Non-PII
    pub drop_non_pii: bool,
    /// Drop findings scoring below the discard threshold
    pub drop_discard: bool,
}

/// Credential encryption configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptionConfig {
    /// Reference to the symmetric key used for source-profile credentials.
    /// Resolved to key material once at process start.
    pub key_ref: String,
    /// Salt mixed into finding value hashes for dedup and consent linkage
    pub value_hash_salt: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            server: ServerConfig::default(),
            graph: GraphConfig::default(),
            classification: ClassificationConfig::default(),
            scan: ScanConfig::default(),
            ingest: IngestConfig::default(),
            encryption: EncryptionConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgresql://localhost/privguard".to_string()),
            max_connections: 10,
            timeout_seconds: 30,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            max_body_size: 16 * 1024 * 1024, // 16MB
        }
    }
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            enabled: env::var("GRAPH_ENABLED")
                .map(|v| v != "false" && v != "0")
                .unwrap_or(true),
            uri: env::var("NEO4J_URI").unwrap_or_else(|_| "bolt://localhost:7687".to_string()),
            user: env::var("NEO4J_USER").unwrap_or_else(|_| "neo4j".to_string()),
            password: env::var("NEO4J_PASSWORD").unwrap_or_else(|_| "neo4j".to_string()),
            sync_workers: 4,
            sync_queue_depth: 1024,
            resync_interval_minutes: 30,
        }
    }
}

impl Default for ClassificationConfig {
    fn default() -> Self {
        Self {
            weights: SignalWeights::default(),
            thresholds: TierThresholds::default(),
            locked_types: Vec::new(),
        }
    }
}

impl Default for SignalWeights {
    fn default() -> Self {
        Self {
            rules: 0.4,
            external_ml: 0.3,
            context: 0.2,
            entropy: 0.1,
        }
    }
}

impl Default for TierThresholds {
    fn default() -> Self {
        Self {
            confirmed: 0.8,
            high: 0.65,
            needs_review: 0.45,
            discard: 0.25,
        }
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            timeout_minutes: 30,
            cleanup_interval_minutes: 5,
        }
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            drop_non_pii: false,
            drop_discard: false,
        }
    }
}

impl Default for EncryptionConfig {
    fn default() -> Self {
        Self {
            key_ref: env::var("ENCRYPTION_KEY")
                .unwrap_or_else(|_| "dev-insecure-key".to_string()),
            value_hash_salt: env::var("VALUE_HASH_SALT")
                .unwrap_or_else(|_| "privguard".to_string()),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            format: env::var("LOG_FORMAT").unwrap_or_else(|_| "json".to_string()),
        }
    }
}

impl PlatformConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let config = Self::default();
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.database.url.is_empty() {
            return Err(Error::configuration("Database URL cannot be empty"));
        }

        if self.server.port == 0 {
            return Err(Error::configuration("Server port must be greater than 0"));
        }

        self.classification.validate()?;

        if self.scan.timeout_minutes <= 0 {
            return Err(Error::configuration("Scan timeout must be positive"));
        }

        if self.graph.enabled && self.graph.uri.is_empty() {
            return Err(Error::configuration(
                "Graph URI cannot be empty when graph sync is enabled",
            ));
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(Error::configuration(format!(
                "Invalid log level: {}",
                self.logging.level
            )));
        }

        Ok(())
    }
}

impl ClassificationConfig {
    /// Validate weights and threshold monotonicity
    pub fn validate(&self) -> Result<()> {
        let w = &self.weights;
        for (name, value) in [
            ("rules", w.rules),
            ("external_ml", w.external_ml),
            ("context", w.context),
            ("entropy", w.entropy),
        ] {
            if value < 0.0 {
                return Err(Error::configuration(format!(
                    "Classification weight '{name}' cannot be negative"
                )));
            }
        }
        if w.rules + w.external_ml + w.context + w.entropy <= 0.0 {
            return Err(Error::configuration(
                "Classification weights must sum to a positive value",
            ));
        }

        let t = &self.thresholds;
        if !(t.confirmed > t.high && t.high > t.needs_review && t.needs_review > t.discard) {
            return Err(Error::configuration(
                "Classification thresholds must be monotone decreasing: confirmed > high > needs_review > discard",
            ));
        }
        for (name, value) in [
            ("confirmed", t.confirmed),
            ("high", t.high),
            ("needs_review", t.needs_review),
            ("discard", t.discard),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::configuration(format!(
                    "Classification threshold '{name}' must be within [0, 1]"
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = PlatformConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_threshold_monotonicity_enforced() {
        let mut config = ClassificationConfig::default();
        config.thresholds.high = 0.95; // above confirmed
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_negative_weight_rejected() {
        let mut config = ClassificationConfig::default();
        config.weights.entropy = -0.1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_weight_sum_rejected() {
        let mut config = ClassificationConfig::default();
        config.weights = SignalWeights {
            rules: 0.0,
            external_ml: 0.0,
            context: 0.0,
            entropy: 0.0,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_suppression_defaults_off() {
        let config = IngestConfig::default();
        assert!(!config.drop_non_pii);
        assert!(!config.drop_discard);
    }
}
