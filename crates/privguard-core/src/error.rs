// Modified: 2026-03-14

//! Error types for the Privguard platform

use thiserror::Error;

/// Main error type for the Privguard platform
#[derive(Error, Debug)]
pub enum Error {
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Database error: {source}")]
    Database {
        #[from]
        source: sqlx::Error,
    },

    #[error("Serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },

    #[error("IO error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("Not found: {resource}")]
    NotFound { resource: String },

    #[error("Conflict: {message}")]
    Conflict {
        message: String,
        /// Id of the already-existing resource, when the conflict converged on one.
        existing_id: Option<uuid::Uuid>,
    },

    #[error("Illegal state transition for {resource}: {from} -> {to}")]
    State {
        resource: String,
        from: String,
        to: String,
    },

    #[error("Graph store error: {message}")]
    Graph { message: String },

    #[error("Lineage unavailable: {message}")]
    GraphUnavailable { message: String },

    #[error("Connector error: {source_type}: {message}")]
    Connector {
        source_type: String,
        message: String,
    },

    #[error("Crypto error: {message}")]
    Crypto { message: String },

    #[error("Timeout error: {operation}")]
    Timeout { operation: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl Error {
    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    /// Create a conflict error
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
            existing_id: None,
        }
    }

    /// Create a conflict error that converged on an existing resource
    pub fn conflict_with(message: impl Into<String>, existing_id: uuid::Uuid) -> Self {
        Self::Conflict {
            message: message.into(),
            existing_id: Some(existing_id),
        }
    }

    /// Create an illegal state transition error
    pub fn state(
        resource: impl Into<String>,
        from: impl Into<String>,
        to: impl Into<String>,
    ) -> Self {
        Self::State {
            resource: resource.into(),
            from: from.into(),
            to: to.into(),
        }
    }

    /// Create a graph store error
    pub fn graph(message: impl Into<String>) -> Self {
        Self::Graph {
            message: message.into(),
        }
    }

    /// Create a lineage-unavailable error
    pub fn graph_unavailable(message: impl Into<String>) -> Self {
        Self::GraphUnavailable {
            message: message.into(),
        }
    }

    /// Create a connector error
    pub fn connector(source_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Connector {
            source_type: source_type.into(),
            message: message.into(),
        }
    }

    /// Create a crypto error
    pub fn crypto(message: impl Into<String>) -> Self {
        Self::Crypto {
            message: message.into(),
        }
    }

    /// Create a timeout error
    pub fn timeout(operation: impl Into<String>) -> Self {
        Self::Timeout {
            operation: operation.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Check if this is a client error (4xx)
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Validation { .. }
                | Self::NotFound { .. }
                | Self::Conflict { .. }
                | Self::State { .. }
        )
    }

    /// Check if the operation that produced this error is safe to retry
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Database { .. }
                | Self::Graph { .. }
                | Self::GraphUnavailable { .. }
                | Self::Timeout { .. }
        )
    }

    /// Get HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation { .. } => 400,
            Self::NotFound { .. } => 404,
            Self::Conflict { .. } | Self::State { .. } => 409,
            Self::GraphUnavailable { .. } => 503,
            Self::Database { .. }
            | Self::Serialization { .. }
            | Self::Io { .. }
            | Self::Configuration { .. }
            | Self::Graph { .. }
            | Self::Connector { .. }
            | Self::Crypto { .. }
            | Self::Timeout { .. }
            | Self::Internal { .. } => 500,
        }
    }

    /// Stable machine-readable error kind for API responses
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation",
            Self::Configuration { .. } => "configuration",
            Self::Database { .. } => "database",
            Self::Serialization { .. } => "serialization",
            Self::Io { .. } => "io",
            Self::NotFound { .. } => "not_found",
            Self::Conflict { .. } => "conflict",
            Self::State { .. } => "illegal_transition",
            Self::Graph { .. } => "graph",
            Self::GraphUnavailable { .. } => "lineage_unavailable",
            Self::Connector { .. } => "connector",
            Self::Crypto { .. } => "crypto",
            Self::Timeout { .. } => "timeout",
            Self::Internal { .. } => "internal",
        }
    }
}

/// Result type alias for the Privguard platform
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_vs_server_errors() {
        assert!(Error::validation("bad input").is_client_error());
        assert!(Error::not_found("asset").is_client_error());
        assert!(Error::state("scan_run", "completed", "running").is_client_error());
        assert!(!Error::internal("boom").is_client_error());
        assert!(!Error::graph_unavailable("neo4j down").is_client_error());
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(Error::validation("x").status_code(), 400);
        assert_eq!(Error::not_found("x").status_code(), 404);
        assert_eq!(Error::conflict("x").status_code(), 409);
        assert_eq!(Error::state("scan_run", "a", "b").status_code(), 409);
        assert_eq!(Error::graph_unavailable("x").status_code(), 503);
        assert_eq!(Error::internal("x").status_code(), 500);
    }

    #[test]
    fn test_retryable() {
        assert!(Error::timeout("sync").is_retryable());
        assert!(Error::graph("bolt reset").is_retryable());
        assert!(!Error::validation("x").is_retryable());
        assert!(!Error::conflict("x").is_retryable());
    }

    #[test]
    fn test_conflict_carries_existing_id() {
        let id = uuid::Uuid::new_v4();
        match Error::conflict_with("asset exists", id) {
            Error::Conflict { existing_id, .. } => assert_eq!(existing_id, Some(id)),
            other => panic!("unexpected error: {other}"),
        }
    }
}
