//! Calendar provider and e-mail fakes
//!
//! `FakeCalendarProvider` keeps events in a map and records every write so
//! tests can assert on the provider traffic.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use encore_core::{CalendarProvider, EmailSender, InvitationEmail};
use encore_domain::{
    AuthorizationRequest, CalendarConnection, CalendarEventDraft, EncoreError, EventTime,
    ExternalEvent, ExternalEventStatus, Result as DomainResult, TokenGrant, WatchChannel,
};

#[derive(Default)]
pub struct FakeCalendarProvider {
    events: Mutex<HashMap<String, ExternalEvent>>,
    calls: Mutex<Vec<String>>,
    next_id: AtomicU32,
    pub revoke_refresh: AtomicBool,
    pub fail_inserts: AtomicBool,
}

impl FakeCalendarProvider {
    pub fn add_event(&self, event: ExternalEvent) {
        self.events.lock().unwrap().insert(event.id.clone(), event);
    }

    pub fn event(&self, id: &str) -> Option<ExternalEvent> {
        self.events.lock().unwrap().get(id).cloned()
    }

    pub fn remove_event(&self, id: &str) {
        self.events.lock().unwrap().remove(id);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn revoke(&self) {
        self.revoke_refresh.store(true, Ordering::SeqCst);
    }

    pub fn break_inserts(&self) {
        self.fail_inserts.store(true, Ordering::SeqCst);
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }
}

#[async_trait]
impl CalendarProvider for FakeCalendarProvider {
    fn name(&self) -> &str {
        "google"
    }

    fn authorization_url(&self) -> DomainResult<AuthorizationRequest> {
        Ok(AuthorizationRequest {
            url: "https://accounts.test/auth?state=state-1".into(),
            state: "state-1".into(),
            pkce_verifier: "verifier-1".into(),
        })
    }

    async fn exchange_code(&self, code: &str, _pkce_verifier: &str) -> DomainResult<TokenGrant> {
        self.record(format!("exchange:{code}"));
        Ok(TokenGrant {
            access_token: "access-1".into(),
            refresh_token: Some("refresh-1".into()),
            expires_in: Some(3_600),
            id_token: None,
            email: Some("leader@example.com".into()),
        })
    }

    async fn refresh_access_token(&self, _refresh_token: &str) -> DomainResult<TokenGrant> {
        self.record("refresh");
        if self.revoke_refresh.load(Ordering::SeqCst) {
            return Err(EncoreError::TokenRevoked("invalid_grant".into()));
        }
        Ok(TokenGrant {
            access_token: "access-2".into(),
            refresh_token: None,
            expires_in: Some(3_600),
            id_token: None,
            email: None,
        })
    }

    async fn list_events(
        &self,
        _access_token: &str,
        _calendar_id: &str,
        _time_min: DateTime<Utc>,
        _time_max: DateTime<Utc>,
    ) -> DomainResult<Vec<ExternalEvent>> {
        let mut events: Vec<_> = self.events.lock().unwrap().values().cloned().collect();
        events.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(events)
    }

    async fn get_event(
        &self,
        _access_token: &str,
        _calendar_id: &str,
        event_id: &str,
    ) -> DomainResult<ExternalEvent> {
        self.event(event_id).ok_or_else(|| EncoreError::NotFound("Event not found".into()))
    }

    async fn insert_event(
        &self,
        _access_token: &str,
        _calendar_id: &str,
        draft: &CalendarEventDraft,
        send_updates: bool,
    ) -> DomainResult<ExternalEvent> {
        self.record(format!("insert:send_updates={send_updates}"));
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(EncoreError::Provider("Calendar usage limits exceeded".into()));
        }
        let id = format!("created-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        let event = from_draft(&id, draft);
        self.add_event(event.clone());
        Ok(event)
    }

    async fn patch_event(
        &self,
        _access_token: &str,
        _calendar_id: &str,
        event_id: &str,
        draft: &CalendarEventDraft,
        send_updates: bool,
    ) -> DomainResult<ExternalEvent> {
        self.record(format!("patch:{event_id}:send_updates={send_updates}"));
        let mut events = self.events.lock().unwrap();
        let Some(existing) = events.get_mut(event_id) else {
            return Err(EncoreError::NotFound("Event not found".into()));
        };
        let attendees = draft.attendees.clone().unwrap_or_else(|| existing.attendees.clone());
        *existing = ExternalEvent { attendees, ..from_draft(event_id, draft) };
        Ok(existing.clone())
    }

    async fn delete_event(
        &self,
        _access_token: &str,
        _calendar_id: &str,
        event_id: &str,
    ) -> DomainResult<()> {
        self.record(format!("delete:{event_id}"));
        match self.events.lock().unwrap().remove(event_id) {
            Some(_) => Ok(()),
            None => Err(EncoreError::NotFound("Event not found".into())),
        }
    }

    async fn watch_events(
        &self,
        _access_token: &str,
        _calendar_id: &str,
        channel_id: &str,
        _address: &str,
    ) -> DomainResult<WatchChannel> {
        self.record("watch");
        Ok(WatchChannel {
            channel_id: channel_id.to_string(),
            resource_id: "resource-1".into(),
            expires_at: Some(Utc::now() + Duration::days(7)),
        })
    }

    async fn stop_watch(
        &self,
        _access_token: &str,
        channel_id: &str,
        _resource_id: &str,
    ) -> DomainResult<()> {
        self.record(format!("stop:{channel_id}"));
        Ok(())
    }
}

fn from_draft(id: &str, draft: &CalendarEventDraft) -> ExternalEvent {
    ExternalEvent {
        id: id.to_string(),
        summary: Some(draft.summary.clone()),
        description: draft.description.clone(),
        location: draft.location.clone(),
        status: ExternalEventStatus::Confirmed,
        start: draft.start,
        end: draft.end,
        attendees: draft.attendees.clone().unwrap_or_default(),
        html_link: None,
    }
}

/// Confirmed two-hour event starting at `start`.
pub fn event(id: &str, summary: &str, start: DateTime<Utc>) -> ExternalEvent {
    ExternalEvent {
        id: id.to_string(),
        summary: Some(summary.to_string()),
        description: None,
        location: Some("Cellar Bar".into()),
        status: ExternalEventStatus::Confirmed,
        start: EventTime::At { instant: start },
        end: EventTime::At { instant: start + Duration::hours(2) },
        attendees: Vec::new(),
        html_link: None,
    }
}

/// A connection whose access token is good for another hour.
pub fn connection(user_id: &str) -> CalendarConnection {
    let now = Utc::now();
    CalendarConnection {
        id: format!("conn-{user_id}"),
        user_id: user_id.to_string(),
        provider: "google".into(),
        access_token: "access-1".into(),
        refresh_token: Some("refresh-1".into()),
        expires_at: Some(now + Duration::hours(1)),
        calendar_id: "primary".into(),
        provider_email: Some("leader@example.com".into()),
        sync_enabled: true,
        last_synced_at: None,
        watch_channel_id: None,
        watch_resource_id: None,
        watch_expires_at: None,
        created_at: now,
        updated_at: now,
    }
}

#[derive(Default)]
pub struct RecordingEmailSender {
    sent: Mutex<Vec<InvitationEmail>>,
}

impl RecordingEmailSender {
    pub fn sent(&self) -> Vec<InvitationEmail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl EmailSender for RecordingEmailSender {
    async fn send_invitation(&self, email: &InvitationEmail) -> DomainResult<()> {
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}
