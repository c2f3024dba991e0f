//! External calendar types
//!
//! Provider-neutral shapes for calendar connections, events, attendees and
//! the sync log. The Google adapter translates its wire format into these.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::impl_domain_status_conversions;

/// Stored OAuth connection between a user and a calendar provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarConnection {
    pub id: String,
    pub user_id: String,
    pub provider: String,
    #[serde(skip_serializing)]
    pub access_token: String,
    #[serde(skip_serializing)]
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub calendar_id: String,
    pub provider_email: Option<String>,
    pub sync_enabled: bool,
    pub last_synced_at: Option<DateTime<Utc>>,
    pub watch_channel_id: Option<String>,
    pub watch_resource_id: Option<String>,
    pub watch_expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CalendarConnection {
    /// True when the access token is missing an expiry or expires within
    /// `threshold_secs`.
    pub fn needs_refresh(&self, now: DateTime<Utc>, threshold_secs: i64) -> bool {
        match self.expires_at {
            Some(expires_at) => expires_at - now <= Duration::seconds(threshold_secs),
            None => self.refresh_token.is_some(),
        }
    }

    pub fn has_active_watch(&self, now: DateTime<Utc>) -> bool {
        self.watch_channel_id.is_some() && self.watch_expires_at.is_some_and(|exp| exp > now)
    }

    pub fn clear_watch(&mut self) {
        self.watch_channel_id = None;
        self.watch_resource_id = None;
        self.watch_expires_at = None;
    }

    pub fn status(&self) -> CalendarConnectionStatus {
        CalendarConnectionStatus {
            provider: self.provider.clone(),
            connected: true,
            email: self.provider_email.clone(),
            calendar_id: Some(self.calendar_id.clone()),
            sync_enabled: self.sync_enabled,
            last_synced_at: self.last_synced_at,
        }
    }
}

/// Token-free view of a connection for the API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarConnectionStatus {
    pub provider: String,
    pub connected: bool,
    pub email: Option<String>,
    pub calendar_id: Option<String>,
    pub sync_enabled: bool,
    pub last_synced_at: Option<DateTime<Utc>>,
}

impl CalendarConnectionStatus {
    pub fn disconnected(provider: &str) -> Self {
        Self {
            provider: provider.to_string(),
            connected: false,
            email: None,
            calendar_id: None,
            sync_enabled: false,
            last_synced_at: None,
        }
    }
}

/// Tokens returned by a code exchange or refresh
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenGrant {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: Option<i64>,
    pub id_token: Option<String>,
    /// Account e-mail taken from the id_token, when one came back.
    pub email: Option<String>,
}

/// Consent URL plus the values needed to finish the code exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationRequest {
    pub url: String,
    pub state: String,
    pub pkce_verifier: String,
}

/// Start or end of an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum EventTime {
    /// All-day boundary; an all-day end date is exclusive.
    AllDay { date: NaiveDate },
    At { instant: DateTime<Utc> },
}

impl EventTime {
    pub fn is_all_day(&self) -> bool {
        matches!(self, Self::AllDay { .. })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExternalEventStatus {
    #[default]
    Confirmed,
    Tentative,
    Cancelled,
}

impl_domain_status_conversions!(ExternalEventStatus {
    Confirmed => "confirmed",
    Tentative => "tentative",
    Cancelled => "cancelled",
});

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AttendeeResponse {
    #[default]
    NeedsAction,
    Declined,
    Tentative,
    Accepted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventAttendee {
    pub email: String,
    pub display_name: Option<String>,
    pub response_status: AttendeeResponse,
    pub organizer: bool,
}

impl EventAttendee {
    pub fn invite(email: &str, display_name: Option<&str>) -> Self {
        Self {
            email: email.to_string(),
            display_name: display_name.map(ToOwned::to_owned),
            response_status: AttendeeResponse::NeedsAction,
            organizer: false,
        }
    }

    pub fn email_key(&self) -> String {
        self.email.trim().to_lowercase()
    }
}

/// Event as read from the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalEvent {
    pub id: String,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub status: ExternalEventStatus,
    pub start: EventTime,
    pub end: EventTime,
    pub attendees: Vec<EventAttendee>,
    pub html_link: Option<String>,
}

impl ExternalEvent {
    pub fn is_cancelled(&self) -> bool {
        self.status == ExternalEventStatus::Cancelled
    }
}

/// Event body Encore writes to the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarEventDraft {
    pub summary: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start: EventTime,
    pub end: EventTime,
    pub time_zone: String,
    /// `None` leaves the provider's attendee list untouched on patch.
    pub attendees: Option<Vec<EventAttendee>>,
}

/// Push-notification channel registered with the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchChannel {
    pub channel_id: String,
    pub resource_id: String,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Headers of an incoming provider push notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushNotification {
    pub channel_id: String,
    pub resource_id: Option<String>,
    pub resource_state: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncDirection {
    Import,
    Export,
}

impl_domain_status_conversions!(SyncDirection {
    Import => "import",
    Export => "export",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncAction {
    Imported,
    SkippedDuplicate,
    Created,
    Updated,
    Recreated,
    LegacyUpdated,
    Deleted,
    InvitesSent,
    RsvpRefreshed,
    CancelledFromCalendar,
    WatchRegistered,
    WatchStopped,
}

impl_domain_status_conversions!(SyncAction {
    Imported => "imported",
    SkippedDuplicate => "skipped_duplicate",
    Created => "created",
    Updated => "updated",
    Recreated => "recreated",
    LegacyUpdated => "legacy_updated",
    Deleted => "deleted",
    InvitesSent => "invites_sent",
    RsvpRefreshed => "rsvp_refreshed",
    CancelledFromCalendar => "cancelled_from_calendar",
    WatchRegistered => "watch_registered",
    WatchStopped => "watch_stopped",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    Success,
    Failed,
    Skipped,
}

impl_domain_status_conversions!(SyncStatus {
    Success => "success",
    Failed => "failed",
    Skipped => "skipped",
});

/// Row of `calendar_sync_log`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncLogEntry {
    pub id: String,
    pub user_id: String,
    pub gig_id: Option<String>,
    pub direction: SyncDirection,
    pub action: SyncAction,
    pub status: SyncStatus,
    pub external_event_id: Option<String>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl SyncLogEntry {
    pub fn new(
        user_id: &str,
        gig_id: Option<&str>,
        direction: SyncDirection,
        action: SyncAction,
        status: SyncStatus,
    ) -> Self {
        Self {
            id: super::new_id(),
            user_id: user_id.to_string(),
            gig_id: gig_id.map(ToOwned::to_owned),
            direction,
            action,
            status,
            external_event_id: None,
            error_message: None,
            created_at: Utc::now(),
        }
    }

    pub fn event(mut self, event_id: Option<&str>) -> Self {
        self.external_event_id = event_id.map(ToOwned::to_owned);
        self
    }

    pub fn error(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }
}

/// An internal gig overlapping an external event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarConflict {
    pub gig_id: String,
    pub gig_title: String,
    pub gig_date: NaiveDate,
    pub event_id: String,
    pub event_summary: Option<String>,
}

/// Provider event annotated for the import picker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportableEvent {
    pub event: ExternalEvent,
    pub already_imported: bool,
    pub existing_gig_id: Option<String>,
    pub conflicts: Vec<CalendarConflict>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportOutcome {
    pub gig_id: String,
    /// False when the event had already been imported.
    pub created: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarPushOutcome {
    pub event_id: Option<String>,
    pub action: SyncAction,
    pub legacy_events_updated: u32,
    pub watch_registered: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InviteChannel {
    Calendar,
    Email,
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InviteOutcome {
    pub role_id: String,
    pub musician_email: Option<String>,
    pub channel: InviteChannel,
    pub invited: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendInvitesReport {
    pub event_id: Option<String>,
    /// Calendar failure that triggered the e-mail fallback, if any.
    pub calendar_error: Option<String>,
    pub outcomes: Vec<InviteOutcome>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RsvpRefreshReport {
    pub updated_role_ids: Vec<String>,
    pub unchanged: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelEventOutcome {
    pub event_deleted: bool,
    pub legacy_events_deleted: u32,
    pub watch_stopped: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportedSyncReport {
    pub checked: u32,
    pub updated: u32,
    pub cancelled: u32,
}
