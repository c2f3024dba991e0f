//! Calendar integration port interfaces
//!
//! The provider speaks in domain shapes (`ExternalEvent`, `TokenGrant`); the
//! adapter owns the wire format. Adapters report a missing or deleted event
//! (HTTP 404/410) as `EncoreError::NotFound` and an OAuth `invalid_grant` as
//! `EncoreError::TokenRevoked`.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use encore_domain::{
    AuthorizationRequest, CalendarConnection, CalendarEventDraft, ExternalEvent, Result,
    SyncLogEntry, TokenGrant, WatchChannel,
};

#[async_trait]
pub trait CalendarProvider: Send + Sync {
    /// Provider name stored on connections (e.g. `google`).
    fn name(&self) -> &str;

    /// Consent URL with a fresh state and PKCE verifier.
    fn authorization_url(&self) -> Result<AuthorizationRequest>;

    async fn exchange_code(&self, code: &str, pkce_verifier: &str) -> Result<TokenGrant>;

    async fn refresh_access_token(&self, refresh_token: &str) -> Result<TokenGrant>;

    /// Single events (recurrences expanded) between the two instants.
    async fn list_events(
        &self,
        access_token: &str,
        calendar_id: &str,
        time_min: DateTime<Utc>,
        time_max: DateTime<Utc>,
    ) -> Result<Vec<ExternalEvent>>;

    async fn get_event(
        &self,
        access_token: &str,
        calendar_id: &str,
        event_id: &str,
    ) -> Result<ExternalEvent>;

    async fn insert_event(
        &self,
        access_token: &str,
        calendar_id: &str,
        draft: &CalendarEventDraft,
        send_updates: bool,
    ) -> Result<ExternalEvent>;

    async fn patch_event(
        &self,
        access_token: &str,
        calendar_id: &str,
        event_id: &str,
        draft: &CalendarEventDraft,
        send_updates: bool,
    ) -> Result<ExternalEvent>;

    async fn delete_event(&self, access_token: &str, calendar_id: &str, event_id: &str)
        -> Result<()>;

    /// Register a push channel delivering change notifications to `address`.
    async fn watch_events(
        &self,
        access_token: &str,
        calendar_id: &str,
        channel_id: &str,
        address: &str,
    ) -> Result<WatchChannel>;

    async fn stop_watch(&self, access_token: &str, channel_id: &str, resource_id: &str)
        -> Result<()>;
}

#[async_trait]
pub trait CalendarConnectionRepository: Send + Sync {
    async fn find(&self, user_id: &str, provider: &str) -> Result<Option<CalendarConnection>>;

    /// Insert or replace the row for `(user_id, provider)`.
    async fn upsert(&self, connection: &CalendarConnection) -> Result<()>;

    async fn delete(&self, user_id: &str, provider: &str) -> Result<bool>;

    async fn find_by_watch_channel(&self, channel_id: &str) -> Result<Option<CalendarConnection>>;

    /// Connections whose watch expires before `before` (or has no expiry).
    async fn list_with_expiring_watch(
        &self,
        before: DateTime<Utc>,
    ) -> Result<Vec<CalendarConnection>>;

    async fn list_sync_enabled(&self) -> Result<Vec<CalendarConnection>>;
}

#[async_trait]
pub trait SyncLogRepository: Send + Sync {
    async fn insert(&self, entry: &SyncLogEntry) -> Result<()>;

    /// Newest first.
    async fn list_for_user(&self, user_id: &str, limit: u32) -> Result<Vec<SyncLogEntry>>;
}

/// Invitation e-mail used when calendar invites cannot be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvitationEmail {
    pub to: String,
    pub musician_name: Option<String>,
    pub role_name: String,
    pub gig_title: String,
    pub gig_date: NaiveDate,
    pub location: Option<String>,
    pub organizer_name: Option<String>,
    pub gig_id: String,
}

#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send_invitation(&self, email: &InvitationEmail) -> Result<()>;
}
