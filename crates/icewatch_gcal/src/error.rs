// --- File: crates/icewatch_gcal/src/error.rs ---
use icewatch_common::{external_service_error, IcewatchError};
use thiserror::Error;

/// Failures of the service-account token flow.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Failed to read credentials file {path}: {source}")]
    CredentialsIo {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse credentials: {0}")]
    CredentialsParse(#[from] serde_json::Error),
    #[error("Invalid private key: {0}")]
    InvalidKey(jsonwebtoken::errors::Error),
    #[error("Failed to sign token request: {0}")]
    Signing(jsonwebtoken::errors::Error),
    #[error("Token request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Token endpoint refused the request: {error} ({description})")]
    Rejected { error: String, description: String },
    #[error("Token endpoint returned {status}: {body}")]
    Http { status: u16, body: String },
    #[error("Malformed token response: {0}")]
    MalformedResponse(String),
    #[error("Unknown token type: {0}")]
    UnknownTokenType(String),
}

/// Failures of a single calendar write.
#[derive(Error, Debug)]
pub enum GcalError {
    #[error("Calendar request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Calendar API error: {0}")]
    Api(String),
    #[error("Authorization failed: {0}")]
    Auth(#[from] AuthError),
    #[error("Invalid calendar URL: {0}")]
    Url(String),
}

impl From<AuthError> for IcewatchError {
    fn from(err: AuthError) -> Self {
        IcewatchError::AuthError(err.to_string())
    }
}

impl From<GcalError> for IcewatchError {
    fn from(err: GcalError) -> Self {
        match err {
            GcalError::Auth(e) => e.into(),
            other => external_service_error("Google Calendar", other),
        }
    }
}
