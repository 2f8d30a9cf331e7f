//! Core error types for smart-todo-core.
//!
//! Errors are split by who can act on them: callers get `InvalidInput` and
//! `UnsupportedAction`, while `ExternalServiceUnavailable` is consumed inside
//! the engine and only ever shows up as a degraded response.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for smart-todo-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Caller supplied data the engine refuses to correct
    #[error("Invalid input for '{field}': {message}")]
    InvalidInput { field: String, message: String },

    /// Generative model could not be reached or did not answer in time
    #[error("External service '{service}' unavailable: {message}")]
    ExternalServiceUnavailable { service: String, message: String },

    /// Unrecognized `action` field in a suggestion request
    #[error("Unsupported action: {0}")]
    UnsupportedAction(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CoreError {
    /// Shorthand for [`CoreError::InvalidInput`].
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        CoreError::InvalidInput {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Shorthand for [`CoreError::ExternalServiceUnavailable`].
    pub fn unavailable(service: impl Into<String>, message: impl Into<String>) -> Self {
        CoreError::ExternalServiceUnavailable {
            service: service.into(),
            message: message.into(),
        }
    }

    /// Stable machine-readable kind, used in error responses.
    pub fn kind(&self) -> &'static str {
        match self {
            CoreError::InvalidInput { .. } => "invalid_input",
            CoreError::ExternalServiceUnavailable { .. } => "external_service_unavailable",
            CoreError::UnsupportedAction(_) => "unsupported_action",
            CoreError::Config(_) => "config",
            CoreError::Io(_) => "io",
            CoreError::Json(_) => "json",
        }
    }

    /// HTTP-style status an API layer should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            CoreError::InvalidInput { .. } | CoreError::UnsupportedAction(_) => 400,
            CoreError::Json(_) => 400,
            CoreError::ExternalServiceUnavailable { .. } => 503,
            CoreError::Config(_) | CoreError::Io(_) => 500,
        }
    }

    /// Whether the error is the caller's fault.
    pub fn is_client_error(&self) -> bool {
        self.status_code() / 100 == 4
    }
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

impl From<tokio::time::error::Elapsed> for CoreError {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        CoreError::unavailable("generator", "request timed out")
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
