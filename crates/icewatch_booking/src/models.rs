// --- File: crates/icewatch_booking/src/models.rs ---
//! Wire shapes of the booking site's JSON endpoints.

use chrono::{DateTime, NaiveDate};
use icewatch_common::CalendarDay;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use tracing::warn;

/// Response of `ice-sports-calendar`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CalendarMonth {
    #[serde(default)]
    pub current_month: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub month: Option<u32>,
    #[serde(default)]
    pub dates: Vec<CalendarDate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CalendarDate {
    /// 0 for Sunday.
    #[serde(default)]
    pub day_of_week: Option<i64>,
    /// ASP.NET style, e.g. `/Date(1551398400000+0000)/`.
    pub date: String,
    #[serde(default)]
    pub has_event: bool,
}

static JS_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"/Date\((-?[0-9]+)(?:[+-][0-9]{4})?\)/").expect("valid date pattern")
});

/// Extracts the calendar date from an ASP.NET `/Date(ms+zone)/` literal.
///
/// The milliseconds are epoch based, so the zone suffix does not move the
/// instant; the date is taken in UTC, which is how the site encodes
/// midnight of each listed day.
pub fn parse_js_date(raw: &str) -> Option<NaiveDate> {
    let caps = JS_DATE.captures(raw)?;
    let millis: i64 = caps.get(1)?.as_str().parse().ok()?;
    DateTime::from_timestamp_millis(millis).map(|dt| dt.date_naive())
}

impl CalendarMonth {
    /// Days of the month, skipping entries whose date cannot be read.
    pub fn into_days(self) -> Vec<CalendarDay> {
        self.dates
            .into_iter()
            .filter_map(|entry| match parse_js_date(&entry.date) {
                Some(date) => Some(CalendarDay {
                    date,
                    has_event: entry.has_event,
                }),
                None => {
                    warn!("Ignoring calendar entry with unreadable date {:?}", entry.date);
                    None
                }
            })
            .collect()
    }
}
