// --- File: crates/services/icewatch_cli/src/service_factory.rs ---
//! Wires configuration into the services a pass needs.

use icewatch_booking::BookingClient;
use icewatch_common::{IcewatchError, LocalZone};
use icewatch_config::{load_product_catalog, AppConfig};
use icewatch_db::DbClient;
use icewatch_gcal::{CalendarSync, GoogleCalendarService, TokenAuthenticator};
use icewatch_tracker::Tracker;
use std::sync::Arc;
use tracing::{info, warn};

pub type IcewatchTracker = Tracker<BookingClient, GoogleCalendarService>;

/// The calendar client, or `None` when sync is not configured or cannot be
/// set up. Setup problems are logged and polling carries on without sync.
pub fn calendar_service(config: &AppConfig) -> Option<GoogleCalendarService> {
    let auth = match TokenAuthenticator::from_config(&config.gcal) {
        Ok(Some(auth)) => auth,
        Ok(None) => {
            info!("No calendar credentials configured, not syncing");
            return None;
        }
        Err(e) => {
            warn!("Can't create calendar client, no syncing: {}", e);
            return None;
        }
    };
    match GoogleCalendarService::new(&config.gcal, Arc::new(auth)) {
        Ok(service) => Some(service),
        Err(e) => {
            warn!("Can't create calendar client, no syncing: {}", e);
            None
        }
    }
}

/// Builds the tracker for the polling commands.
pub fn build_tracker(config: &AppConfig, db: DbClient) -> Result<IcewatchTracker, IcewatchError> {
    let catalog = load_product_catalog(&config.products_path)?;
    let zone = LocalZone::resolve(&config.timezone);
    let booking = BookingClient::new(&config.booking)?;
    let products = catalog.product_ids();
    let sync = CalendarSync::new(
        calendar_service(config),
        catalog,
        config.gcal.calendar_id.clone(),
        zone,
    );
    Ok(Tracker::new(db, booking, sync, products, zone))
}
