// --- File: crates/icewatch_booking/src/error.rs ---
use icewatch_common::{external_service_error, IcewatchError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BookingError {
    #[error("Booking site request failed: {0}")]
    RequestError(#[from] reqwest::Error),
    #[error("Booking site returned an error: {0}")]
    ApiError(String),
    #[error("Failed to parse booking site response: {0}")]
    ParseError(#[from] serde_json::Error),
    #[error("Invalid booking site URL: {0}")]
    UrlError(String),
}

impl From<BookingError> for IcewatchError {
    fn from(err: BookingError) -> Self {
        match err {
            BookingError::ParseError(e) => {
                IcewatchError::ParseError(format!("Booking site response: {}", e))
            }
            other => external_service_error("Booking site", other),
        }
    }
}
