// --- File: crates/icewatch_tracker/src/refresh.rs ---
//! Event refresh passes: fetch the sessions of known days, record what
//! changed, infer cancellations, then mirror the changes to the calendar.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use icewatch_common::services::{BookingService, CalendarService};
use icewatch_common::day_key;
use icewatch_db::{DayHandle, StoreTx};
use std::collections::HashSet;
use tracing::{debug, info, warn};

use crate::cancel::infer_cancellations;
use crate::detect::{reconcile_session, Action};
use crate::error::TrackerError;
use crate::tracker::{PassReport, PendingSync, Tracker};

/// How close a session start must be to trigger a refresh of today.
pub const STARTING_SOON: Duration = Duration::minutes(5);

impl<B, C> Tracker<B, C>
where
    B: BookingService,
    C: CalendarService,
{
    /// Refreshes today, or today and every later known day.
    pub async fn check_for_events(
        &self,
        only_today: bool,
        now: DateTime<Utc>,
    ) -> Result<PassReport, TrackerError> {
        let today = day_key(self.zone.today(now));
        let mut report = PassReport::default();
        let mut pending = Vec::new();

        let mut tx = self.db.begin_write().await?;
        if only_today {
            if let Some(day) = tx.day(&today).await? {
                self.check_events_for_day(&mut tx, &day, now, &mut report, &mut pending)
                    .await?;
            } else {
                debug!("No events known for {}", today);
            }
        } else {
            let mut days = tx.days_from(&today);
            while let Some(day) = days.next(&mut tx).await? {
                self.check_events_for_day(&mut tx, &day, now, &mut report, &mut pending)
                    .await?;
            }
        }
        tx.commit().await?;

        self.reconcile_calendar(pending, &mut report).await;
        info!("Event check finished: {}", report);
        Ok(report)
    }

    /// Refreshes today only if one of today's known sessions starts within
    /// [`STARTING_SOON`]. Returns `None` when nothing was due.
    pub async fn check_if_events_starting_soon(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Option<PassReport>, TrackerError> {
        if !self.session_starting_soon(now).await? {
            debug!("No session starting soon");
            return Ok(None);
        }
        info!("Session starting soon, refreshing today's events");
        self.check_for_events(true, now).await.map(Some)
    }

    async fn session_starting_soon(&self, now: DateTime<Utc>) -> Result<bool, TrackerError> {
        let today = day_key(self.zone.today(now));
        let mut tx = self.db.begin_read().await?;

        let Some(day) = tx.day(&today).await? else {
            return Ok(false);
        };
        let Some(events) = tx.events_scope(&day).await? else {
            return Ok(false);
        };

        for session in tx.sessions(&events).await? {
            let Some(latest) = tx.latest_snapshot(&session).await? else {
                continue;
            };
            let start = match self.zone.parse_local(&today, &latest.record.start_time) {
                Ok(start) => start.with_timezone(&Utc),
                Err(e) => {
                    warn!("Skipping session {}: {}", session.session_id(), e);
                    continue;
                }
            };
            if start >= now && start - now < STARTING_SOON {
                debug!("Session {} starts at {}", session.session_id(), start);
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Fetches every product's sessions for `day` and records them.
    ///
    /// A failed fetch aborts the pass: with part of the listing missing, the
    /// cancellation sweep would flag sessions that still exist.
    pub(crate) async fn check_events_for_day(
        &self,
        tx: &mut StoreTx,
        day: &DayHandle,
        now: DateTime<Utc>,
        report: &mut PassReport,
        pending: &mut Vec<PendingSync>,
    ) -> Result<(), TrackerError> {
        let date = NaiveDate::parse_from_str(day.date(), "%Y-%m-%d")
            .map_err(|_| TrackerError::InvalidDay(day.date().to_string()))?;
        let products = tx.products(day).await?;
        let events = tx.get_or_create_events_scope(day).await?;
        let mut observed = HashSet::new();

        for product in &products {
            let records = self
                .booking
                .fetch_event_records(date, product)
                .await
                .map_err(|e| TrackerError::booking(format!("{} on {}", product, day.date()), e))?;

            for record in records {
                let session = tx.get_or_create_session(&events, &record.session_id).await?;
                tx.set_session_product(&session, product).await?;
                observed.insert(record.session_id.clone());

                let (action, snapshot) = reconcile_session(tx, &session, record, now).await?;
                match action {
                    Action::Created => report.created += 1,
                    Action::Updated => report.updated += 1,
                    Action::Unchanged => report.unchanged += 1,
                }
                if action.changed() {
                    pending.push(PendingSync {
                        snapshot,
                        day: day.date().to_string(),
                        product: Some(product.clone()),
                        observed_at: now,
                    });
                }
            }
        }

        let sweep = infer_cancellations(tx, &events, &observed, now, &self.zone).await?;
        report.skipped_unparseable += sweep.skipped_unparseable;
        report.cancelled += sweep.cancelled.len();
        for (session, snapshot) in sweep.cancelled {
            let product = tx.session_product(&session).await?;
            pending.push(PendingSync {
                snapshot,
                day: day.date().to_string(),
                product,
                observed_at: now,
            });
        }

        report.days_refreshed += 1;
        Ok(())
    }
}
