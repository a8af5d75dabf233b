// --- File: crates/icewatch_common/src/lib.rs ---

// Declare modules within this crate
pub mod clock; // Local civil time of the rink
pub mod error; // Error handling
pub mod http; // HTTP utilities
pub mod logging; // Logging utilities
pub mod models; // Data structures and models
pub mod services; // Service abstractions

// Re-export error types and utilities for easier access
pub use error::{
    config_error, external_service_error, storage_error, ExitCode, IcewatchError,
};

pub use clock::{day_key, LocalZone, TimeParseError};

// Re-export HTTP utilities for easier access
pub use http::{
    client::{create_client, HTTP_CLIENT},
    describe_failure,
};

pub use models::{
    CalendarDay, CalendarEvent, ComparableFields, EventDateTime, EventRecord, ProductId, Snapshot,
};

// Shared models, error handling, logging and HTTP plumbing used by every
// other icewatch crate.
