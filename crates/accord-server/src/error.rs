//! Error types for the Accord Server
//!
//! This module contains the error types used throughout the server.

use accord_record_store::RecordStoreError;
use thiserror::Error;

/// Server error types
#[derive(Error, Debug)]
pub enum ServerError {
    /// Resource not found
    #[error("{0} not found")]
    NotFound(String),

    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Record store error
    #[error("Record store error: {0}")]
    StoreError(String),

    /// Workflow engine API error (transport or protocol)
    #[error("Engine API error: {0}")]
    EngineApiError(String),

    /// Correlation search unreachable or malformed. Distinct from an empty
    /// search result, which is a valid "no instance to notify" outcome.
    #[error("Correlation resolution failed: {0}")]
    ResolutionFailure(String),

    /// Variable payload construction error
    #[error("Variable payload build failed: {0}")]
    BuildFailure(String),

    /// Delivery to a single process instance failed
    #[error("Delivery to instance {instance_id} failed: {detail}")]
    DeliveryFailure {
        /// Process instance the delivery targeted
        instance_id: String,
        /// Failure detail
        detail: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// Internal server error
    #[error("Internal server error: {0}")]
    InternalError(String),
}

/// Result type for server operations
pub type ServerResult<T> = Result<T, ServerError>;

// Implement conversions from other error types
impl From<RecordStoreError> for ServerError {
    fn from(err: RecordStoreError) -> Self {
        match err {
            RecordStoreError::NotFound(contract_id) => {
                ServerError::NotFound(format!("Contract {}", contract_id))
            }
            _ => ServerError::StoreError(format!("{}", err)),
        }
    }
}

impl From<reqwest::Error> for ServerError {
    fn from(err: reqwest::Error) -> Self {
        ServerError::EngineApiError(format!("HTTP request error: {}", err))
    }
}

impl From<serde_json::Error> for ServerError {
    fn from(err: serde_json::Error) -> Self {
        ServerError::ValidationError(format!("JSON error: {}", err))
    }
}

impl From<std::io::Error> for ServerError {
    fn from(err: std::io::Error) -> Self {
        ServerError::InternalError(format!("IO error: {}", err))
    }
}

impl ServerError {
    /// Check if the error is a not-found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, ServerError::NotFound(_))
    }

    /// Check if the error is a correlation resolution failure
    pub fn is_resolution_failure(&self) -> bool {
        matches!(self, ServerError::ResolutionFailure(_))
    }

    /// Check if the error is a payload build failure
    pub fn is_build_failure(&self) -> bool {
        matches!(self, ServerError::BuildFailure(_))
    }

    /// Check if the error belongs to the synchronization phase. These errors
    /// never escalate to fail an otherwise-successful record mutation.
    pub fn is_sync_phase_error(&self) -> bool {
        matches!(
            self,
            ServerError::ResolutionFailure(_)
                | ServerError::BuildFailure(_)
                | ServerError::DeliveryFailure { .. }
        )
    }
}
