// --- File: crates/icewatch_tracker/src/error.rs ---
use icewatch_common::{external_service_error, IcewatchError};
use icewatch_db::DbError;
use thiserror::Error;

/// Anything that aborts a pass. Nothing of an aborted pass is committed.
#[derive(Error, Debug)]
pub enum TrackerError {
    #[error(transparent)]
    Store(#[from] DbError),
    #[error("Can't retrieve booking info for {context}: {source}")]
    Booking {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("Stored day key {0:?} is not a date")]
    InvalidDay(String),
}

impl TrackerError {
    pub(crate) fn booking<E>(context: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        TrackerError::Booking {
            context: context.into(),
            source: Box::new(source),
        }
    }
}

impl From<TrackerError> for IcewatchError {
    fn from(err: TrackerError) -> Self {
        match err {
            TrackerError::Store(e) => e.into(),
            TrackerError::InvalidDay(_) => IcewatchError::ParseError(err.to_string()),
            booking @ TrackerError::Booking { .. } => external_service_error("Booking site", booking),
        }
    }
}
