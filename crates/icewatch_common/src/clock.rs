// --- File: crates/icewatch_common/src/clock.rs ---
//! The rink publishes session times as bare wall-clock strings. Everything
//! that turns those into instants goes through [`LocalZone`].

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use thiserror::Error;
use tracing::warn;

/// Zone used when none is configured.
pub const DEFAULT_ZONE: &str = "Europe/London";

const DAY_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimeParseError {
    #[error("cannot parse local time {input:?}: {source}")]
    Malformed {
        input: String,
        source: chrono::ParseError,
    },
    #[error("local time {input:?} does not exist in {zone}")]
    Nonexistent { input: String, zone: String },
}

/// The rink's civil timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalZone {
    tz: Tz,
}

impl LocalZone {
    /// Resolves an IANA zone name, falling back to UTC (with a warning) when
    /// the name is unknown.
    pub fn resolve(name: &str) -> Self {
        match name.parse::<Tz>() {
            Ok(tz) => Self { tz },
            Err(_) => {
                warn!("Can't load timezone {:?}, defaulting to UTC", name);
                Self::utc()
            }
        }
    }

    pub fn utc() -> Self {
        Self { tz: Tz::UTC }
    }

    pub fn name(&self) -> &'static str {
        self.tz.name()
    }

    /// Combines a `YYYY-MM-DD` day and an `HH:MM:SS` time in this zone.
    ///
    /// When clocks go back the earlier of the two instants is used. Times
    /// skipped when clocks go forward are an error.
    pub fn parse_local(&self, day: &str, time: &str) -> Result<DateTime<Tz>, TimeParseError> {
        let input = format!("{} {}", day, time);
        let naive = NaiveDateTime::parse_from_str(&input, DAY_TIME_FORMAT).map_err(|source| {
            TimeParseError::Malformed {
                input: input.clone(),
                source,
            }
        })?;
        self.tz
            .from_local_datetime(&naive)
            .earliest()
            .ok_or_else(|| TimeParseError::Nonexistent {
                input,
                zone: self.tz.name().to_string(),
            })
    }

    /// The calendar date of `now` on the rink's wall clock.
    pub fn today(&self, now: DateTime<Utc>) -> NaiveDate {
        now.with_timezone(&self.tz).date_naive()
    }

    pub fn localize(&self, at: DateTime<Utc>) -> DateTime<Tz> {
        at.with_timezone(&self.tz)
    }
}

impl Default for LocalZone {
    fn default() -> Self {
        Self::resolve(DEFAULT_ZONE)
    }
}

/// Canonical storage key of a date: `YYYY-MM-DD`.
pub fn day_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
