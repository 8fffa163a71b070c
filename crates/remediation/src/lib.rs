//! # Remediation
//!
//! Staged, reversible remediation of PII findings against heterogeneous
//! source systems through a uniform connector capability set. Credentials
//! are decrypted at call time and never leave this crate.

pub mod connector;
pub mod connectors;
pub mod crypto;
pub mod orchestrator;
pub mod templates;

pub use connector::{Connector, ConnectorConfig, ConnectorRegistry, RemediationTarget};
pub use crypto::CredentialCipher;
pub use orchestrator::RemediationOrchestrator;
pub use templates::mask_value;
