//! Embedded store for icewatch
//!
//! Persists what the tracker has observed on the booking site as a tree:
//! one bucket per day holding the day's product list and an events scope,
//! one scope per session, and under each session an append-only sequence
//! of snapshots. SQLite (through SQLx) provides the storage and the
//! transaction boundary of a pass.
//!
//! # Example
//!
//! ```rust,no_run
//! use icewatch_db::DbClient;
//!
//! async fn latest_days() -> Result<(), icewatch_db::DbError> {
//!     let db = DbClient::from_url("sqlite:ice-info.db").await?;
//!     let mut tx = db.begin_read().await?;
//!     let mut days = tx.days_from("2024-03-01");
//!     while let Some(day) = days.next(&mut tx).await? {
//!         println!("{}", day.date());
//!     }
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod error;
pub mod schema;
pub mod store;
#[cfg(test)]
mod store_test;

pub use client::DbClient;
pub use error::DbError;
pub use store::{encode_products, DayCursor, DayHandle, EventsHandle, SessionHandle, StoreTx};
