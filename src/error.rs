//! Error types for bridge operations
//!
//! One taxonomy covers the whole request path: validation and lookup errors
//! surface synchronously through the HTTP layer, while invocation errors are
//! only ever recorded into task and pipeline records.

use thiserror::Error;
use warp::http::StatusCode;

/// Main error type for bridge operations
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Malformed request input, rejected before any record is created
    #[error("{message}")]
    Validation { message: String },

    /// No eligible agent for a requested capability
    #[error("No agent available for {capability}")]
    NoAgentAvailable { capability: String },

    /// Lookup by id/name missed
    #[error("{resource} not found")]
    NotFound { resource: String },

    /// Remote agent call failed; recorded into the owning record, never
    /// returned to an HTTP caller
    #[error("Remote invocation failed: {message}")]
    Invocation { message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl BridgeError {
    /// Create validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create no-agent-available error
    pub fn no_agent_available<S: Into<String>>(capability: S) -> Self {
        Self::NoAgentAvailable {
            capability: capability.into(),
        }
    }

    /// Create not-found error
    pub fn not_found<S: Into<String>>(resource: S) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    /// Create invocation error
    pub fn invocation<S: Into<String>>(message: S) -> Self {
        Self::Invocation {
            message: message.into(),
        }
    }

    /// HTTP status this error maps to when surfaced synchronously.
    ///
    /// Invocation errors never reach an HTTP caller; one that leaks here
    /// reports as an internal error.
    pub fn http_status(&self) -> StatusCode {
        match self {
            BridgeError::Validation { .. } => StatusCode::BAD_REQUEST,
            BridgeError::NoAgentAvailable { .. } => StatusCode::NOT_FOUND,
            BridgeError::NotFound { .. } => StatusCode::NOT_FOUND,
            BridgeError::Invocation { .. }
            | BridgeError::Config(_)
            | BridgeError::Io(_)
            | BridgeError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Result type for bridge operations
pub type BridgeResult<T> = Result<T, BridgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_constructor() {
        let error = BridgeError::validation("Capability is required");
        assert!(matches!(error, BridgeError::Validation { .. }));
        assert_eq!(error.to_string(), "Capability is required");
    }

    #[test]
    fn test_no_agent_available_constructor() {
        let error = BridgeError::no_agent_available("summarize_text");
        assert!(matches!(error, BridgeError::NoAgentAvailable { .. }));
        assert_eq!(error.to_string(), "No agent available for summarize_text");
    }

    #[test]
    fn test_not_found_constructor() {
        let error = BridgeError::not_found("Task");
        assert!(matches!(error, BridgeError::NotFound { .. }));
        assert_eq!(error.to_string(), "Task not found");
    }

    #[test]
    fn test_invocation_constructor() {
        let error = BridgeError::invocation("connection refused");
        assert!(matches!(error, BridgeError::Invocation { .. }));
        assert_eq!(
            error.to_string(),
            "Remote invocation failed: connection refused"
        );
    }

    // ========== Tests for HTTP Status Mapping ==========

    #[test]
    fn test_validation_maps_to_400() {
        let error = BridgeError::validation("steps must be a non-empty array");
        assert_eq!(error.http_status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_no_agent_available_maps_to_404() {
        let error = BridgeError::no_agent_available("translate_text");
        assert_eq!(error.http_status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_not_found_maps_to_404() {
        let error = BridgeError::not_found("Pipeline");
        assert_eq!(error.http_status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_invocation_maps_to_500() {
        let error = BridgeError::invocation("timed out");
        assert_eq!(error.http_status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "missing file");
        let error: BridgeError = io_error.into();
        assert!(matches!(error, BridgeError::Io(_)));
        assert_eq!(error.http_status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
