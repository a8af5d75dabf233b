// --- File: crates/icewatch_common/src/services.rs ---
//! Service abstractions for external services.
//!
//! The tracker talks to the booking site and to the calendar only through
//! these traits, so tests can substitute in-process fakes for either side.

use chrono::NaiveDate;
use std::future::Future;
use std::pin::Pin;

use crate::models::{CalendarDay, CalendarEvent, EventRecord, ProductId};

/// Type alias for a boxed future that returns a Result
pub type BoxFuture<'a, T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'a>>;

/// Outcome of an attempt to overwrite an existing calendar event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    Updated,
    /// The calendar has no event with that id (never inserted, or deleted
    /// on the calendar side).
    NotFound,
}

/// Read access to the booking site.
pub trait BookingService: Send + Sync {
    /// Error type returned by booking service operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Month calendar for one product: which days have at least one event.
    fn fetch_calendar(
        &self,
        month: u32,
        year: i32,
        product: &ProductId,
    ) -> BoxFuture<'_, Vec<CalendarDay>, Self::Error>;

    /// Every session of `product` on `date`.
    fn fetch_event_records(
        &self,
        date: NaiveDate,
        product: &ProductId,
    ) -> BoxFuture<'_, Vec<EventRecord>, Self::Error>;
}

/// Write access to a calendar service.
pub trait CalendarService: Send + Sync {
    /// Error type returned by calendar service operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Replace the event addressed by `event.id`.
    fn update_event(
        &self,
        calendar_id: &str,
        event: &CalendarEvent,
    ) -> BoxFuture<'_, UpdateOutcome, Self::Error>;

    /// Create `event` under its own id.
    fn insert_event(&self, calendar_id: &str, event: &CalendarEvent)
        -> BoxFuture<'_, (), Self::Error>;
}
