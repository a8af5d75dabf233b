// --- File: crates/icewatch_tracker/src/tracker.rs ---
use chrono::{DateTime, Utc};
use icewatch_common::services::{BookingService, CalendarService};
use icewatch_common::{LocalZone, ProductId, Snapshot};
use icewatch_db::DbClient;
use icewatch_gcal::{CalendarSync, SyncOutcome};
use std::fmt;
use tracing::debug;

/// Counters of one pass, logged when it finishes.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PassReport {
    pub days_added: usize,
    pub days_refreshed: usize,
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub cancelled: usize,
    /// Sessions whose stored times could not be read.
    pub skipped_unparseable: usize,
    pub sync: SyncOutcome,
}

impl fmt::Display for PassReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} new days, {} days refreshed, sessions: {} created, {} updated, {} unchanged, {} cancelled, {} unparseable; calendar: {} updated, {} inserted, {} failed",
            self.days_added,
            self.days_refreshed,
            self.created,
            self.updated,
            self.unchanged,
            self.cancelled,
            self.skipped_unparseable,
            self.sync.updated,
            self.sync.inserted,
            self.sync.failed,
        )
    }
}

/// A calendar write owed for a snapshot recorded in the current pass. These
/// are only sent once the pass has committed.
#[derive(Debug, Clone)]
pub(crate) struct PendingSync {
    pub snapshot: Snapshot,
    pub day: String,
    pub product: Option<ProductId>,
    pub observed_at: DateTime<Utc>,
}

/// Runs polling passes against the store.
pub struct Tracker<B, C> {
    pub(crate) db: DbClient,
    pub(crate) booking: B,
    pub(crate) calendar: CalendarSync<C>,
    pub(crate) products: Vec<ProductId>,
    pub(crate) zone: LocalZone,
}

impl<B, C> Tracker<B, C>
where
    B: BookingService,
    C: CalendarService,
{
    pub fn new(
        db: DbClient,
        booking: B,
        calendar: CalendarSync<C>,
        products: Vec<ProductId>,
        zone: LocalZone,
    ) -> Self {
        Self {
            db,
            booking,
            calendar,
            products,
            zone,
        }
    }

    pub fn db(&self) -> &DbClient {
        &self.db
    }

    pub fn zone(&self) -> &LocalZone {
        &self.zone
    }

    pub fn calendar(&self) -> &CalendarSync<C> {
        &self.calendar
    }

    /// Sends the owed calendar writes. Failures only show up in the report.
    pub(crate) async fn reconcile_calendar(&self, pending: Vec<PendingSync>, report: &mut PassReport) {
        if !self.calendar.is_enabled() {
            if !pending.is_empty() {
                debug!("Calendar sync not configured, {} changes not mirrored", pending.len());
            }
            return;
        }
        for item in pending {
            let Some(product) = &item.product else {
                debug!(
                    "No product known for session {} on {}, not syncing",
                    item.snapshot.session_id(),
                    item.day
                );
                report.sync.skipped += 1;
                continue;
            };
            let outcome = self
                .calendar
                .sync(&item.snapshot, &item.day, product, item.observed_at)
                .await;
            report.sync.merge(outcome);
        }
    }
}
