// --- File: crates/icewatch_common/src/error.rs ---
use std::fmt;
use thiserror::Error;

/// The base error type for all icewatch errors.
///
/// Each crate keeps its own error enum and implements `From<SpecificError>`
/// for `IcewatchError`, so the binary can report every failure the same way.
#[derive(Error, Debug)]
pub enum IcewatchError {
    /// Error occurred during an HTTP request
    #[error("HTTP request failed: {0}")]
    HttpError(String),

    /// Error occurred while parsing data
    #[error("Failed to parse data: {0}")]
    ParseError(String),

    /// Error occurred due to missing or invalid configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Error occurred during authentication or authorization
    #[error("Authentication error: {0}")]
    AuthError(String),

    /// Error occurred in the local store
    #[error("Storage error: {0}")]
    StorageError(String),

    /// Error occurred during external service call
    #[error("External service error: {service_name} - {message}")]
    ExternalServiceError {
        service_name: String,
        message: String,
    },

    /// Error occurred due to an internal error
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Maps an error category onto a process exit status.
pub trait ExitCode {
    fn exit_code(&self) -> i32;
}

impl ExitCode for IcewatchError {
    fn exit_code(&self) -> i32 {
        match self {
            IcewatchError::ConfigError(_) => 2,
            IcewatchError::StorageError(_) => 3,
            IcewatchError::HttpError(_) | IcewatchError::ExternalServiceError { .. } => 4,
            IcewatchError::AuthError(_) => 5,
            IcewatchError::ParseError(_) => 6,
            IcewatchError::InternalError(_) => 1,
        }
    }
}

// Common error conversions
impl From<reqwest::Error> for IcewatchError {
    fn from(err: reqwest::Error) -> Self {
        IcewatchError::HttpError(err.to_string())
    }
}

impl From<serde_json::Error> for IcewatchError {
    fn from(err: serde_json::Error) -> Self {
        IcewatchError::ParseError(err.to_string())
    }
}

impl From<std::io::Error> for IcewatchError {
    fn from(err: std::io::Error) -> Self {
        IcewatchError::InternalError(err.to_string())
    }
}

// Utility functions for error handling
pub fn config_error<T: fmt::Display>(message: T) -> IcewatchError {
    IcewatchError::ConfigError(message.to_string())
}

pub fn storage_error<T: fmt::Display>(message: T) -> IcewatchError {
    IcewatchError::StorageError(message.to_string())
}

pub fn external_service_error<T: fmt::Display>(service_name: &str, message: T) -> IcewatchError {
    IcewatchError::ExternalServiceError {
        service_name: service_name.to_string(),
        message: message.to_string(),
    }
}
