// --- File: crates/icewatch_gcal/src/sync.rs ---
//! Best-effort mirroring of session snapshots into calendars.

use chrono::{DateTime, Utc};
use icewatch_common::services::{CalendarService, UpdateOutcome};
use icewatch_common::{LocalZone, ProductId, Snapshot};
use icewatch_config::ProductCatalog;
use tracing::{debug, info, warn};

use crate::event::make_calendar_event;

/// Counters for one or more sync calls.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SyncOutcome {
    pub updated: usize,
    pub inserted: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl SyncOutcome {
    pub fn merge(&mut self, other: SyncOutcome) {
        self.updated += other.updated;
        self.inserted += other.inserted;
        self.failed += other.failed;
        self.skipped += other.skipped;
    }
}

/// Writes snapshots to the calendars configured for their product.
///
/// Without a calendar service every call is a no-op.
pub struct CalendarSync<C> {
    service: Option<C>,
    catalog: ProductCatalog,
    default_calendar: Option<String>,
    zone: LocalZone,
}

impl<C: CalendarService> CalendarSync<C> {
    pub fn new(
        service: Option<C>,
        catalog: ProductCatalog,
        default_calendar: Option<String>,
        zone: LocalZone,
    ) -> Self {
        Self {
            service,
            catalog,
            default_calendar: default_calendar.filter(|c| !c.is_empty()),
            zone,
        }
    }

    pub fn disabled(catalog: ProductCatalog, zone: LocalZone) -> Self {
        Self::new(None, catalog, None, zone)
    }

    pub fn is_enabled(&self) -> bool {
        self.service.is_some()
    }

    pub fn service(&self) -> Option<&C> {
        self.service.as_ref()
    }

    /// The product's own calendars, else the default calendar.
    pub fn targets(&self, product: &ProductId) -> Vec<String> {
        let own = self.catalog.calendars_for(product);
        if !own.is_empty() {
            return own;
        }
        self.default_calendar.iter().cloned().collect()
    }

    /// Upserts the event for `snapshot` into every target calendar.
    ///
    /// Failures are logged and counted, never returned.
    pub async fn sync(
        &self,
        snapshot: &Snapshot,
        day: &str,
        product: &ProductId,
        updated_at: DateTime<Utc>,
    ) -> SyncOutcome {
        let mut outcome = SyncOutcome::default();
        let Some(service) = &self.service else {
            return outcome;
        };

        let targets = self.targets(product);
        if targets.is_empty() {
            debug!("No calendar configured for product {}, not syncing", product);
            outcome.skipped += 1;
            return outcome;
        }

        let event = match make_calendar_event(snapshot, day, product, updated_at, &self.zone) {
            Ok(event) => event,
            Err(e) => {
                warn!("Can't convert session {} to a calendar event: {}", snapshot.session_id(), e);
                outcome.failed += targets.len();
                return outcome;
            }
        };

        for calendar_id in &targets {
            match service.update_event(calendar_id, &event).await {
                Ok(UpdateOutcome::Updated) => {
                    debug!("Updated event {} in {}", event.id, calendar_id);
                    outcome.updated += 1;
                }
                Ok(UpdateOutcome::NotFound) => {
                    info!("Calendar event {} not found in {}, inserting", event.id, calendar_id);
                    match service.insert_event(calendar_id, &event).await {
                        Ok(()) => outcome.inserted += 1,
                        Err(e) => {
                            warn!("Calendar event insert failed for {}: {}", event.id, e);
                            outcome.failed += 1;
                        }
                    }
                }
                Err(e) => {
                    warn!("Calendar event update failed for {}: {}", event.id, e);
                    outcome.failed += 1;
                }
            }
        }
        outcome
    }
}
