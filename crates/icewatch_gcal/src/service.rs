// --- File: crates/icewatch_gcal/src/service.rs ---
//! Google Calendar service implementation.
//!
//! Only the two event writes needed for mirroring are implemented, straight
//! over the REST API.

use icewatch_common::services::{BoxFuture, CalendarService, UpdateOutcome};
use icewatch_common::{describe_failure, CalendarEvent};
use icewatch_config::GcalConfig;
use reqwest::{Client, StatusCode, Url};
use std::sync::Arc;
use tracing::debug;

use crate::auth::TokenAuthenticator;
use crate::error::GcalError;

/// Google Calendar service implementation.
#[derive(Debug, Clone)]
pub struct GoogleCalendarService {
    http: Client,
    api_base: Url,
    auth: Arc<TokenAuthenticator>,
}

impl GoogleCalendarService {
    /// Create a new Google Calendar service.
    pub fn new(config: &GcalConfig, auth: Arc<TokenAuthenticator>) -> Result<Self, GcalError> {
        Self::with_client((*icewatch_common::HTTP_CLIENT).clone(), &config.api_base, auth)
    }

    pub fn with_client(
        http: Client,
        api_base: &str,
        auth: Arc<TokenAuthenticator>,
    ) -> Result<Self, GcalError> {
        let api_base = Url::parse(api_base).map_err(|e| GcalError::Url(format!("{api_base}: {e}")))?;
        if api_base.cannot_be_a_base() {
            return Err(GcalError::Url(format!("{api_base} cannot be a base URL")));
        }
        Ok(Self {
            http,
            api_base,
            auth,
        })
    }

    /// `{api_base}/calendars/{calendar_id}/events[/{event_id}]`, with each
    /// id percent-encoded as a single path segment.
    fn events_url(&self, calendar_id: &str, event_id: Option<&str>) -> Result<Url, GcalError> {
        let mut url = self.api_base.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| GcalError::Url(self.api_base.to_string()))?;
            segments.pop_if_empty().extend(["calendars", calendar_id, "events"]);
            if let Some(id) = event_id {
                segments.push(id);
            }
        }
        Ok(url)
    }

    /// Overwrites `event` in place. A missing event is reported as
    /// [`UpdateOutcome::NotFound`] rather than an error.
    pub async fn put_event(
        &self,
        calendar_id: &str,
        event: &CalendarEvent,
    ) -> Result<UpdateOutcome, GcalError> {
        let url = self.events_url(calendar_id, Some(&event.id))?;
        debug!("PUT {}", url);
        let request = self.auth.authorize(self.http.put(url).json(event)).await?;
        let response = request.send().await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(UpdateOutcome::NotFound),
            status if status.is_success() => Ok(UpdateOutcome::Updated),
            _ => Err(GcalError::Api(describe_failure(response).await)),
        }
    }

    /// Creates `event` under its own id.
    pub async fn post_event(&self, calendar_id: &str, event: &CalendarEvent) -> Result<(), GcalError> {
        let url = self.events_url(calendar_id, None)?;
        debug!("POST {}", url);
        let request = self.auth.authorize(self.http.post(url).json(event)).await?;
        let response = request.send().await?;

        if !response.status().is_success() {
            return Err(GcalError::Api(describe_failure(response).await));
        }
        Ok(())
    }
}

impl CalendarService for GoogleCalendarService {
    type Error = GcalError;

    fn update_event(
        &self,
        calendar_id: &str,
        event: &CalendarEvent,
    ) -> BoxFuture<'_, UpdateOutcome, Self::Error> {
        let calendar_id = calendar_id.to_string();
        let event = event.clone();
        Box::pin(async move { self.put_event(&calendar_id, &event).await })
    }

    fn insert_event(
        &self,
        calendar_id: &str,
        event: &CalendarEvent,
    ) -> BoxFuture<'_, (), Self::Error> {
        let calendar_id = calendar_id.to_string();
        let event = event.clone();
        Box::pin(async move { self.post_event(&calendar_id, &event).await })
    }
}
