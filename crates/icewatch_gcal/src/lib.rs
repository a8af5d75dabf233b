// --- File: crates/icewatch_gcal/src/lib.rs ---
//! Google Calendar side of icewatch: service-account tokens, the mapping of
//! session snapshots to events and the update-or-insert protocol.

pub mod auth;
pub mod error;
pub mod event;
pub mod service;
pub mod sync;

pub use auth::{BearerToken, ServiceAccountKey, TokenAuthenticator};
pub use error::{AuthError, GcalError};
pub use event::{event_id, make_calendar_event, product_link};
pub use service::GoogleCalendarService;
pub use sync::{CalendarSync, SyncOutcome};
