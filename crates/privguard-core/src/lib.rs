// Modified: 2026-03-14

//! # Privguard Core
//!
//! Core data models, types, and utilities for the Privguard data-privacy
//! discovery and governance platform. This crate provides the foundational
//! components used across ingestion, classification, catalog, lineage, and
//! remediation.

pub mod config;
pub mod error;
pub mod models;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use error::{Error, Result};
pub use models::*;
pub use types::*;

/// Current version of the Privguard core library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
