//! Connector contract and registry.
//!
//! Connectors are per-source-type and stateless across actions; the
//! registry decrypts profile configuration at call time and hands back a
//! connected instance. Idempotency contract: mask, encrypt, and restore
//! are idempotent; delete is not. Rollback of a delete requires
//! `supports_restore_after_delete`.

use crate::connectors::object_store::ObjectStoreConnector;
use crate::connectors::relational::RelationalConnector;
use crate::crypto::CredentialCipher;
use async_trait::async_trait;
use privguard_core::types::SourceType;
use privguard_core::{Error, Result, SourceProfile};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Decrypted connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectorConfig {
    /// Connection string for relational sources
    #[serde(default)]
    pub dsn: Option<String>,
    /// Root directory for file/object sources
    #[serde(default)]
    pub base_path: Option<String>,
    /// Primary-key column used for record addressing; defaults to `id`
    #[serde(default)]
    pub id_column: Option<String>,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// Where a remediated value lives in the source system
#[derive(Debug, Clone)]
pub struct RemediationTarget {
    /// `schema.table` for relational sources, relative path for objects
    pub path: String,
    /// Column holding the value, when relational
    pub field: Option<String>,
    /// Record locator; value-addressed operations run without one
    pub record_id: Option<String>,
    /// The value being remediated, as matched by the scanner
    pub match_value: String,
}

/// Uniform remediation capability set
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Connector: Send + Sync {
    fn source_type(&self) -> SourceType;

    /// Whether a DELETE can be reversed through `restore_value`
    fn supports_restore_after_delete(&self) -> bool;

    /// Fetch the current original value; the rollback token
    async fn get_original_value(&self, target: &RemediationTarget) -> Result<String>;

    /// Replace the value with its masked form. Idempotent.
    async fn mask(&self, target: &RemediationTarget, masked: &str) -> Result<()>;

    /// Remove the value. Not idempotent.
    async fn delete(&self, target: &RemediationTarget) -> Result<()>;

    /// Replace the value with an encrypted form under the given key. Idempotent.
    async fn encrypt(&self, target: &RemediationTarget, key_ref: &str) -> Result<()>;

    /// Write a previously captured value back. Idempotent given the token.
    async fn restore_value(&self, target: &RemediationTarget, value: &str) -> Result<()>;

    /// Release held resources
    async fn close(&self) -> Result<()>;
}

/// Factory producing connectors per source type
pub struct ConnectorRegistry {
    cipher: Arc<CredentialCipher>,
}

impl ConnectorRegistry {
    pub fn new(cipher: Arc<CredentialCipher>) -> Self {
        Self { cipher }
    }

    /// Decrypt the profile's configuration and connect
    pub async fn connect(&self, profile: &SourceProfile) -> Result<Box<dyn Connector>> {
        let plaintext = self.cipher.decrypt(&profile.encrypted_config)?;
        let config: ConnectorConfig = serde_json::from_str(&plaintext)?;

        match profile.source_type {
            SourceType::Postgresql => {
                Ok(Box::new(RelationalConnector::connect(config).await?))
            }
            SourceType::Filesystem | SourceType::ObjectStore => {
                Ok(Box::new(ObjectStoreConnector::new(profile.source_type, config)?))
            }
            SourceType::Mysql => Err(Error::connector(
                "mysql",
                "no remediation connector registered for this source type",
            )),
        }
    }
}
