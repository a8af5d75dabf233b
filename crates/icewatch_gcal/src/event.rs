// --- File: crates/icewatch_gcal/src/event.rs ---
//! Mapping of a stored session snapshot onto a calendar event.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, SecondsFormat, Utc};
use data_encoding::BASE32HEX_NOPAD;
use icewatch_common::{
    CalendarEvent, EventDateTime, LocalZone, ProductId, Snapshot, TimeParseError,
};

pub const BOOKING_DETAILS_URL: &str =
    "https://bookings.national-ice-centre.com/booking/ice-sports-details!";

const CANCELLED_PREFIX: &str = "Cancelled: ";

/// Calendar event id for a session.
///
/// Lowercase unpadded base32hex of the session id bytes, which only uses
/// characters the Calendar API accepts in ids.
pub fn event_id(session_id: &str) -> String {
    BASE32HEX_NOPAD
        .encode(session_id.as_bytes())
        .to_ascii_lowercase()
}

/// Booking page for a product. The site has no per-session link.
pub fn product_link(product: &ProductId) -> String {
    format!(
        "{}{}",
        BOOKING_DETAILS_URL,
        URL_SAFE_NO_PAD.encode(product.as_str().as_bytes())
    )
}

/// Builds the calendar event for `snapshot` of a session held on `day`.
pub fn make_calendar_event(
    snapshot: &Snapshot,
    day: &str,
    product: &ProductId,
    updated_at: DateTime<Utc>,
    zone: &LocalZone,
) -> Result<CalendarEvent, TimeParseError> {
    let record = &snapshot.record;
    let start = zone.parse_local(day, &record.start_time)?;
    let end = zone.parse_local(day, &record.end_time)?;

    let summary = if snapshot.cancelled {
        format!("{}{}", CANCELLED_PREFIX, record.product_name)
    } else {
        record.product_name.clone()
    };
    let description = format!(
        "{} Academy, {} other booked, {} free\n{}\nLast updated: {}\n",
        record.academy_booked(),
        record.other_booked(),
        record.available_spaces,
        product_link(product),
        zone.localize(updated_at).format("%b %e %H:%M:%S"),
    );
    let zone_name = Some(zone.name().to_string());

    Ok(CalendarEvent {
        id: event_id(&record.session_id),
        summary,
        description,
        location: record.location.clone(),
        start: EventDateTime {
            date_time: start.to_rfc3339_opts(SecondsFormat::Secs, false),
            time_zone: zone_name.clone(),
        },
        end: EventDateTime {
            date_time: end.to_rfc3339_opts(SecondsFormat::Secs, false),
            time_zone: zone_name,
        },
    })
}
