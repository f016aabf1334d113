// --- File: crates/bookwise_common/src/error.rs ---
use thiserror::Error;

/// The base error type shared across the Bookwise crates.
///
/// Feature crates keep their own thiserror enums and convert into this type
/// at the boundaries where a common shape is needed.
#[derive(Error, Debug)]
pub enum BookwiseError {
    /// Error occurred due to missing or invalid configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Error occurred during validation
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Error occurred during an external service call
    #[error("External service error: {service_name} - {message}")]
    ExternalServiceError {
        service_name: String,
        message: String,
    },

    /// Error occurred due to a conflict (e.g., slot already taken)
    #[error("Conflict: {0}")]
    ConflictError(String),

    /// Error occurred due to a resource not being found
    #[error("Not found: {0}")]
    NotFoundError(String),

    /// Error occurred due to an internal error
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl BookwiseError {
    /// Convenience constructor for external-service failures.
    pub fn external(service_name: impl Into<String>, message: impl Into<String>) -> Self {
        BookwiseError::ExternalServiceError {
            service_name: service_name.into(),
            message: message.into(),
        }
    }
}
