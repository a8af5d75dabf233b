//! Error types for the store

use icewatch_common::{storage_error, IcewatchError};
use thiserror::Error;

/// Errors that can occur when working with the store
#[derive(Debug, Error)]
pub enum DbError {
    /// Error from SQLx
    #[error("Database error: {0}")]
    SqlxError(#[from] sqlx::Error),

    /// Error with the database configuration
    #[error("Database configuration error: {0}")]
    ConfigError(String),

    /// Error with database pool creation
    #[error("Database pool error: {0}")]
    PoolError(String),

    /// Error with database transaction
    #[error("Database transaction error: {0}")]
    TransactionError(String),

    /// A stored value could not be decoded; the surrounding pass must abort
    #[error("Can't parse stored {what} ({key}): {source}")]
    Decode {
        what: &'static str,
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// A value could not be serialized for storage
    #[error("Can't encode {what}: {source}")]
    Encode {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// A scope was addressed under a day that does not exist
    #[error("No such day: {0}")]
    MissingDay(String),

    /// A write was attempted through a read transaction
    #[error("Write attempted in a read-only transaction")]
    ReadOnly,
}

impl From<DbError> for IcewatchError {
    fn from(err: DbError) -> Self {
        storage_error(err)
    }
}
