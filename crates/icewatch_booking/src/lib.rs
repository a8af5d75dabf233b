// --- File: crates/icewatch_booking/src/lib.rs ---
//! Client for the rink's public booking site.
//!
//! Two endpoints are used: the per-product month calendar, which says which
//! days carry events, and the per-day session listing.

pub mod client;
pub mod error;
pub mod models;

pub use client::BookingClient;
pub use error::BookingError;
pub use models::parse_js_date;
