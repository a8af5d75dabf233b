// --- File: crates/icewatch_tracker/src/scan.rs ---
//! Discovery of days that have events, from the booking site's month
//! calendars.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use icewatch_common::services::{BookingService, CalendarService};
use icewatch_common::{day_key, ProductId};
use icewatch_db::{encode_products, DbError, StoreTx};
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::error::TrackerError;
use crate::tracker::{PassReport, Tracker};

/// Products with at least one event, per day.
pub type DaysWithEvents = BTreeMap<NaiveDate, Vec<ProductId>>;

/// The month containing `today` and the one after it, as `(month, year)`.
pub fn months_to_scan(today: NaiveDate) -> [(u32, i32); 2] {
    let (month, year) = (today.month(), today.year());
    let next = if month == 12 { (1, year + 1) } else { (month + 1, year) };
    [(month, year), next]
}

/// Creates missing day buckets and refreshes their product lists.
///
/// A stored list is only replaced when its serialized length differs, so a
/// reordering or a same-length substitution goes unnoticed. Returns the
/// keys of the days created.
pub async fn add_days(tx: &mut StoreTx, days: &DaysWithEvents) -> Result<Vec<String>, DbError> {
    let mut added = Vec::new();
    for (date, products) in days {
        let key = day_key(*date);
        let (day, created) = tx.ensure_day(&key).await?;
        if created {
            added.push(key.clone());
        }

        let encoded = encode_products(products)?;
        let current_len = tx.stored_products_json(&day).await?.map_or(0, |c| c.len());
        if current_len != encoded.len() {
            debug!("Products for {} now {}", key, encoded);
            tx.put_products_json(&day, &encoded).await?;
        }
    }
    Ok(added)
}

impl<B, C> Tracker<B, C>
where
    B: BookingService,
    C: CalendarService,
{
    /// Scans this month and next for days with events.
    pub async fn check_for_new_days(&self, now: DateTime<Utc>) -> Result<PassReport, TrackerError> {
        let today = self.zone.today(now);
        let mut days = DaysWithEvents::new();

        for (month, year) in months_to_scan(today) {
            info!("Checking calendar for {}/{}", month, year);
            for product in &self.products {
                let calendar = self
                    .booking
                    .fetch_calendar(month, year, product)
                    .await
                    .map_err(|e| {
                        TrackerError::booking(format!("calendar {}/{} of {}", month, year, product), e)
                    })?;
                for entry in calendar.into_iter().filter(|d| d.has_event) {
                    let products = days.entry(entry.date).or_default();
                    if !products.contains(product) {
                        products.push(product.clone());
                    }
                }
            }
        }

        let mut tx = self.db.begin_write().await?;
        let added = add_days(&mut tx, &days).await?;
        tx.commit().await?;

        if !added.is_empty() {
            info!("Added {} new days", added.len());
        }
        Ok(PassReport {
            days_added: added.len(),
            ..PassReport::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use icewatch_db::DbClient;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn december_rolls_into_next_year() {
        let dec = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
        assert_eq!(months_to_scan(dec), [(12, 2024), (1, 2025)]);
        assert_eq!(months_to_scan(date(1)), [(3, 2024), (4, 2024)]);
    }

    #[tokio::test]
    async fn product_list_replaced_only_when_length_changes() {
        let db = DbClient::in_memory().await.unwrap();
        let mut tx = db.begin_write().await.unwrap();

        let mut days = DaysWithEvents::new();
        days.insert(date(1), vec![ProductId::from("p1"), ProductId::from("p2")]);
        assert_eq!(add_days(&mut tx, &days).await.unwrap(), vec!["2024-03-01"]);
        let day = tx.day("2024-03-01").await.unwrap().unwrap();

        // a third product changes the length
        days.insert(
            date(1),
            vec![ProductId::from("p1"), ProductId::from("p2"), ProductId::from("p3")],
        );
        assert!(add_days(&mut tx, &days).await.unwrap().is_empty());
        assert_eq!(tx.products(&day).await.unwrap().len(), 3);

        // same length, different order: a known blind spot, nothing written
        days.insert(
            date(1),
            vec![ProductId::from("p3"), ProductId::from("p2"), ProductId::from("p1")],
        );
        add_days(&mut tx, &days).await.unwrap();
        assert_eq!(
            tx.stored_products_json(&day).await.unwrap().as_deref(),
            Some(r#"["p1","p2","p3"]"#)
        );
    }
}
