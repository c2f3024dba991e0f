//! Stand-in provider for deployments without Google credentials

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use encore_core::CalendarProvider;
use encore_domain::constants::GOOGLE_PROVIDER;
use encore_domain::{
    AuthorizationRequest, CalendarEventDraft, EncoreError, ExternalEvent, Result, TokenGrant,
    WatchChannel,
};

const NOT_CONFIGURED: &str = "Google Calendar is not configured";

/// Every call fails with `EncoreError::Config`.
#[derive(Debug, Default)]
pub struct DisabledCalendarProvider;

fn not_configured<T>() -> Result<T> {
    Err(EncoreError::Config(NOT_CONFIGURED.to_string()))
}

#[async_trait]
impl CalendarProvider for DisabledCalendarProvider {
    fn name(&self) -> &str {
        GOOGLE_PROVIDER
    }

    fn authorization_url(&self) -> Result<AuthorizationRequest> {
        not_configured()
    }

    async fn exchange_code(&self, _code: &str, _pkce_verifier: &str) -> Result<TokenGrant> {
        not_configured()
    }

    async fn refresh_access_token(&self, _refresh_token: &str) -> Result<TokenGrant> {
        not_configured()
    }

    async fn list_events(
        &self,
        _access_token: &str,
        _calendar_id: &str,
        _time_min: DateTime<Utc>,
        _time_max: DateTime<Utc>,
    ) -> Result<Vec<ExternalEvent>> {
        not_configured()
    }

    async fn get_event(
        &self,
        _access_token: &str,
        _calendar_id: &str,
        _event_id: &str,
    ) -> Result<ExternalEvent> {
        not_configured()
    }

    async fn insert_event(
        &self,
        _access_token: &str,
        _calendar_id: &str,
        _draft: &CalendarEventDraft,
        _send_updates: bool,
    ) -> Result<ExternalEvent> {
        not_configured()
    }

    async fn patch_event(
        &self,
        _access_token: &str,
        _calendar_id: &str,
        _event_id: &str,
        _draft: &CalendarEventDraft,
        _send_updates: bool,
    ) -> Result<ExternalEvent> {
        not_configured()
    }

    async fn delete_event(
        &self,
        _access_token: &str,
        _calendar_id: &str,
        _event_id: &str,
    ) -> Result<()> {
        not_configured()
    }

    async fn watch_events(
        &self,
        _access_token: &str,
        _calendar_id: &str,
        _channel_id: &str,
        _address: &str,
    ) -> Result<WatchChannel> {
        not_configured()
    }

    async fn stop_watch(
        &self,
        _access_token: &str,
        _channel_id: &str,
        _resource_id: &str,
    ) -> Result<()> {
        not_configured()
    }
}
