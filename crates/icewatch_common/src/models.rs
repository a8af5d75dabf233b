// --- File: crates/icewatch_common/src/models.rs ---

// Data structures shared by the booking client, the store, the tracker and the
// calendar integration.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque product identifier issued by the booking site.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub String);

impl ProductId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProductId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// One bookable session as reported by the booking site's event listing.
///
/// Field names on the wire are the booking site's; everything else it sends
/// is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EventRecord {
    pub session_id: String,
    pub product_name: String,
    pub location: String,
    /// Time of day, `HH:MM:SS`, in the rink's local zone.
    pub start_time: String,
    /// Time of day, `HH:MM:SS`, in the rink's local zone.
    pub end_time: String,
    pub total_spaces: i64,
    pub available_spaces: i64,
    #[serde(rename = "CapacityFreeAcademy")]
    pub academy_capacity: i64,
    #[serde(rename = "AvailableFreeSpaces")]
    pub academy_available: i64,
}

impl EventRecord {
    /// Spaces taken by academy bookings.
    pub fn academy_booked(&self) -> i64 {
        self.academy_capacity - self.academy_available
    }

    /// Spaces taken by everyone else.
    pub fn other_booked(&self) -> i64 {
        self.total_spaces - self.available_spaces
    }
}

/// One immutable observation of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(flatten)]
    pub record: EventRecord,
    #[serde(rename = "UpdatedAt")]
    pub observed_at: DateTime<Utc>,
    #[serde(rename = "Cancelled", default)]
    pub cancelled: bool,
}

/// The fields whose change makes a new snapshot worth recording.
///
/// The session id and the observation time are deliberately absent: the
/// former is the key, the latter changes on every poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComparableFields<'a> {
    pub product_name: &'a str,
    pub location: &'a str,
    pub start_time: &'a str,
    pub end_time: &'a str,
    pub total_spaces: i64,
    pub available_spaces: i64,
    pub academy_capacity: i64,
    pub academy_available: i64,
    pub cancelled: bool,
}

impl Snapshot {
    /// A fresh, not-cancelled observation of `record`.
    pub fn observed(record: EventRecord, observed_at: DateTime<Utc>) -> Self {
        Self {
            record,
            observed_at,
            cancelled: false,
        }
    }

    /// Copy of this snapshot flagged as cancelled at `observed_at`.
    pub fn cancelled_at(&self, observed_at: DateTime<Utc>) -> Self {
        Self {
            record: self.record.clone(),
            observed_at,
            cancelled: true,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.record.session_id
    }

    pub fn comparable(&self) -> ComparableFields<'_> {
        ComparableFields {
            product_name: &self.record.product_name,
            location: &self.record.location,
            start_time: &self.record.start_time,
            end_time: &self.record.end_time,
            total_spaces: self.record.total_spaces,
            available_spaces: self.record.available_spaces,
            academy_capacity: self.record.academy_capacity,
            academy_available: self.record.academy_available,
            cancelled: self.cancelled,
        }
    }

    /// `true` when `other` would be a redundant entry after `self`.
    pub fn same_state_as(&self, other: &Snapshot) -> bool {
        self.comparable() == other.comparable()
    }
}

/// A day cell of the booking site's month calendar for one product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub has_event: bool,
}

/// Zoned instant in the shape the Google Calendar API expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDateTime {
    /// RFC 3339 timestamp with offset.
    pub date_time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

/// The subset of the Google Calendar event resource this application writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    pub id: String,
    pub summary: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub location: String,
    pub start: EventDateTime,
    pub end: EventDateTime,
}
