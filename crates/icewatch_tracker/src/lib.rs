// --- File: crates/icewatch_tracker/src/lib.rs ---
//! The polling engine.
//!
//! A pass opens one write transaction, walks the day buckets it covers,
//! records every fetched session through change detection, sweeps for
//! cancellations and commits. Calendar writes for what changed are sent
//! only after the commit and never undo it.

pub mod cancel;
pub mod detect;
pub mod error;
pub mod refresh;
pub mod scan;
pub mod tracker;

pub use cancel::{infer_cancellations, CancellationSweep};
pub use detect::{reconcile_session, record_snapshot, Action};
pub use error::TrackerError;
pub use refresh::STARTING_SOON;
pub use scan::{add_days, months_to_scan, DaysWithEvents};
pub use tracker::{PassReport, Tracker};
