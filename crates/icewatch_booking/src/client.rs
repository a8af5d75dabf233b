// --- File: crates/icewatch_booking/src/client.rs ---
use chrono::NaiveDate;
use icewatch_common::services::{BoxFuture, BookingService};
use icewatch_common::{create_client, describe_failure, CalendarDay, EventRecord, ProductId};
use icewatch_config::BookingConfig;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use crate::error::BookingError;
use crate::models::CalendarMonth;

/// Read-only client for the booking site's JSON endpoints.
#[derive(Debug, Clone)]
pub struct BookingClient {
    client: Client,
    base_url: String,
}

impl BookingClient {
    /// Fails when `base_url` is not an absolute http(s) URL.
    pub fn new(config: &BookingConfig) -> Result<Self, BookingError> {
        let base = Url::parse(&config.base_url)
            .map_err(|e| BookingError::UrlError(format!("{}: {}", config.base_url, e)))?;
        if base.cannot_be_a_base() || !matches!(base.scheme(), "http" | "https") {
            return Err(BookingError::UrlError(config.base_url.clone()));
        }
        let client = create_client(config.timeout_secs, true)?;
        Ok(Self::with_client(client, &config.base_url))
    }

    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, BookingError> {
        let url = format!("{}/{}", self.base_url, path);
        debug!("GET {} {:?}", url, query);
        let response = self.client.get(&url).query(query).send().await?;
        if !response.status().is_success() {
            return Err(BookingError::ApiError(describe_failure(response).await));
        }
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Month calendar for `product`.
    #[instrument(skip(self), fields(product = %product))]
    pub async fn calendar(
        &self,
        month: u32,
        year: i32,
        product: &ProductId,
    ) -> Result<Vec<CalendarDay>, BookingError> {
        let raw: CalendarMonth = self
            .get_json(
                "ice-sports-calendar",
                &[
                    ("month", month.to_string()),
                    ("year", year.to_string()),
                    ("productId", product.to_string()),
                ],
            )
            .await?;
        Ok(raw.into_days())
    }

    /// Sessions of `product` on `date`.
    #[instrument(skip(self), fields(product = %product))]
    pub async fn event_records(
        &self,
        date: NaiveDate,
        product: &ProductId,
    ) -> Result<Vec<EventRecord>, BookingError> {
        self.get_json(
            "ice-sports-times",
            &[
                ("date", date.format("%Y-%m-%d").to_string()),
                ("productId", product.to_string()),
            ],
        )
        .await
    }
}

impl BookingService for BookingClient {
    type Error = BookingError;

    fn fetch_calendar(
        &self,
        month: u32,
        year: i32,
        product: &ProductId,
    ) -> BoxFuture<'_, Vec<CalendarDay>, Self::Error> {
        let product = product.clone();
        Box::pin(async move { self.calendar(month, year, &product).await })
    }

    fn fetch_event_records(
        &self,
        date: NaiveDate,
        product: &ProductId,
    ) -> BoxFuture<'_, Vec<EventRecord>, Self::Error> {
        let product = product.clone();
        Box::pin(async move { self.event_records(date, &product).await })
    }
}
