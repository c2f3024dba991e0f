//! Calendar service - Google Calendar two-way sync
//!
//! Calls to the provider are sequential awaits. Failures are either
//! propagated, or (for watches, legacy events and side effects) logged and
//! absorbed; there is no retry policy. Every operation that reaches the
//! provider leaves a row in the sync log.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use encore_common::privacy::{redact_email, redact_optional_email};
use encore_domain::constants::{
    DEFAULT_CALENDAR_ID, IMPORTED_OWNER_ROLE, TOKEN_REFRESH_THRESHOLD_SECS,
    WATCH_RENEWAL_WINDOW_HOURS,
};
use encore_domain::{
    new_id, ActivityType, AttendeeResponse, AuthorizationRequest, CalendarConflict,
    CalendarConnection, CalendarConnectionStatus, CalendarEventDraft, CalendarPushOutcome,
    CancelEventOutcome, EncoreError, Gig, GigRole, GigStatus, ImportOutcome, ImportableEvent,
    ImportedSyncReport, InvitationStatus, InviteChannel, InviteOutcome, NewNotification,
    NewRole, NotificationKind, PushNotification, Result, RsvpRefreshReport, SendInvitesReport,
    SyncAction, SyncDirection, SyncLogEntry, SyncStatus,
};
use serde_json::json;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::conflicts::find_conflicts;
use super::events::{apply_event_changes, event_draft_for_gig, gig_from_event, gig_window};
use super::ports::{
    CalendarConnectionRepository, CalendarProvider, EmailSender, InvitationEmail,
    SyncLogRepository,
};
use super::reconcile::reconcile_attendees;
use crate::access::{gig_audience, GigAccess};
use crate::activity::ActivityLogger;
use crate::bands::ports::ProfileRepository;
use crate::notifications::NotificationService;

/// Push notifications with this state only confirm channel creation.
const SYNC_STATE: &str = "sync";

/// Calendar behaviour knobs.
#[derive(Debug, Clone)]
pub struct CalendarSettings {
    /// IANA zone used to turn gig wall-clock times into instants.
    pub time_zone: String,
    /// Public HTTPS address for push notifications; no watches without it.
    pub webhook_url: Option<String>,
    pub refresh_threshold_secs: i64,
}

impl Default for CalendarSettings {
    fn default() -> Self {
        Self {
            time_zone: "UTC".to_string(),
            webhook_url: None,
            refresh_threshold_secs: TOKEN_REFRESH_THRESHOLD_SECS,
        }
    }
}

pub struct CalendarService {
    provider: Arc<dyn CalendarProvider>,
    connections: Arc<dyn CalendarConnectionRepository>,
    sync_log: Arc<dyn SyncLogRepository>,
    access: GigAccess,
    activity: ActivityLogger,
    notifications: NotificationService,
    profiles: Option<Arc<dyn ProfileRepository>>,
    email: Option<Arc<dyn EmailSender>>,
    settings: CalendarSettings,
    tz: Tz,
}

impl CalendarService {
    pub fn new(
        provider: Arc<dyn CalendarProvider>,
        connections: Arc<dyn CalendarConnectionRepository>,
        sync_log: Arc<dyn SyncLogRepository>,
        access: GigAccess,
        activity: ActivityLogger,
        notifications: NotificationService,
    ) -> Self {
        let settings = CalendarSettings::default();
        let tz = super::events::parse_time_zone(&settings.time_zone);
        Self {
            provider,
            connections,
            sync_log,
            access,
            activity,
            notifications,
            profiles: None,
            email: None,
            settings,
            tz,
        }
    }

    pub fn with_settings(mut self, settings: CalendarSettings) -> Self {
        self.tz = super::events::parse_time_zone(&settings.time_zone);
        self.settings = settings;
        self
    }

    /// Profiles supply the organizer's e-mail and display name.
    pub fn with_profiles(mut self, profiles: Arc<dyn ProfileRepository>) -> Self {
        self.profiles = Some(profiles);
        self
    }

    /// Fallback channel for invitations when the calendar is unavailable.
    pub fn with_email_sender(mut self, email: Arc<dyn EmailSender>) -> Self {
        self.email = Some(email);
        self
    }

    pub fn time_zone(&self) -> Tz {
        self.tz
    }

    // ------------------------------------------------------------------
    // Connection lifecycle
    // ------------------------------------------------------------------

    pub fn authorization_url(&self, user_id: &str) -> Result<AuthorizationRequest> {
        let request = self.provider.authorization_url()?;
        debug!(user_id, provider = self.provider.name(), "calendar authorization started");
        Ok(request)
    }

    /// Finish the OAuth flow and store (or refresh) the user's connection.
    #[instrument(skip(self, code, pkce_verifier), fields(user_id = %user_id))]
    pub async fn complete_connection(
        &self,
        user_id: &str,
        code: &str,
        pkce_verifier: &str,
    ) -> Result<CalendarConnectionStatus> {
        if code.trim().is_empty() {
            return Err(EncoreError::InvalidInput("Authorization code is required".to_string()));
        }

        let grant = self.provider.exchange_code(code, pkce_verifier).await?;
        let now = Utc::now();
        let expires_at = expiry(now, grant.expires_in);

        let connection = match self.connections.find(user_id, self.provider.name()).await? {
            Some(mut existing) => {
                existing.access_token = grant.access_token;
                if grant.refresh_token.is_some() {
                    existing.refresh_token = grant.refresh_token;
                }
                existing.expires_at = expires_at;
                if grant.email.is_some() {
                    existing.provider_email = grant.email;
                }
                existing.sync_enabled = true;
                existing.updated_at = now;
                existing
            }
            None => CalendarConnection {
                id: new_id(),
                user_id: user_id.to_string(),
                provider: self.provider.name().to_string(),
                access_token: grant.access_token,
                refresh_token: grant.refresh_token,
                expires_at,
                calendar_id: DEFAULT_CALENDAR_ID.to_string(),
                provider_email: grant.email,
                sync_enabled: true,
                last_synced_at: None,
                watch_channel_id: None,
                watch_resource_id: None,
                watch_expires_at: None,
                created_at: now,
                updated_at: now,
            },
        };

        self.connections.upsert(&connection).await?;
        info!(
            account = %redact_optional_email(connection.provider_email.as_deref()),
            "calendar connected"
        );
        Ok(connection.status())
    }

    pub async fn connection_status(&self, user_id: &str) -> Result<CalendarConnectionStatus> {
        Ok(match self.connections.find(user_id, self.provider.name()).await? {
            Some(connection) => connection.status(),
            None => CalendarConnectionStatus::disconnected(self.provider.name()),
        })
    }

    /// Remove the connection; an active watch is stopped best-effort first.
    pub async fn disconnect(&self, user_id: &str) -> Result<bool> {
        let Some(mut connection) = self.connections.find(user_id, self.provider.name()).await?
        else {
            return Ok(false);
        };
        if connection.watch_channel_id.is_some() {
            self.stop_watch_best_effort(&mut connection).await;
        }
        let deleted = self.connections.delete(user_id, self.provider.name()).await?;
        info!(user_id, "calendar disconnected");
        Ok(deleted)
    }

    /// The user's connection with a usable access token, or `None` when the
    /// user never connected.
    ///
    /// Tokens expiring within the refresh threshold are refreshed first. A
    /// revoked grant deletes the connection and yields `TokenRevoked`.
    pub async fn active_connection(&self, user_id: &str) -> Result<Option<CalendarConnection>> {
        match self.connections.find(user_id, self.provider.name()).await? {
            Some(connection) => self.ensure_fresh(connection).await.map(Some),
            None => Ok(None),
        }
    }

    async fn require_connection(&self, user_id: &str) -> Result<CalendarConnection> {
        self.active_connection(user_id)
            .await?
            .ok_or_else(|| EncoreError::NotFound("No calendar is connected".to_string()))
    }

    async fn ensure_fresh(&self, mut connection: CalendarConnection) -> Result<CalendarConnection> {
        let now = Utc::now();
        if !connection.needs_refresh(now, self.settings.refresh_threshold_secs) {
            return Ok(connection);
        }
        let Some(refresh_token) = connection.refresh_token.clone() else {
            return Err(EncoreError::Auth(
                "Calendar access expired; reconnect your calendar".to_string(),
            ));
        };

        match self.provider.refresh_access_token(&refresh_token).await {
            Ok(grant) => {
                connection.access_token = grant.access_token;
                if grant.refresh_token.is_some() {
                    connection.refresh_token = grant.refresh_token;
                }
                connection.expires_at = expiry(now, grant.expires_in);
                connection.updated_at = now;
                self.connections.upsert(&connection).await?;
                debug!(user_id = %connection.user_id, "calendar token refreshed");
                Ok(connection)
            }
            Err(err) if err.is_token_revoked() => {
                warn!(user_id = %connection.user_id, "calendar grant revoked; removing connection");
                if let Err(delete_err) =
                    self.connections.delete(&connection.user_id, &connection.provider).await
                {
                    warn!(error = %delete_err, "failed to delete revoked calendar connection");
                }
                Err(EncoreError::TokenRevoked(
                    "Calendar access was revoked; reconnect your calendar".to_string(),
                ))
            }
            Err(err) => Err(err),
        }
    }

    // ------------------------------------------------------------------
    // Import
    // ------------------------------------------------------------------

    /// Events in the window that could become gigs, annotated with whether
    /// they were already imported and which gigs they clash with.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn list_importable_events(
        &self,
        user_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<ImportableEvent>> {
        if to <= from {
            return Err(EncoreError::InvalidInput("The time window is empty".to_string()));
        }
        let connection = self.require_connection(user_id).await?;
        let events = self
            .provider
            .list_events(&connection.access_token, &connection.calendar_id, from, to)
            .await?;

        let gigs = self
            .access
            .gigs()
            .list_for_user_between(
                user_id,
                from.with_timezone(&self.tz).date_naive(),
                to.with_timezone(&self.tz).date_naive(),
            )
            .await?;

        let mut importable = Vec::new();
        for event in events.into_iter().filter(|e| !e.is_cancelled()) {
            let existing = self.access.gigs().find_by_external_event(user_id, &event.id).await?;
            let conflicts = find_conflicts(std::slice::from_ref(&event), &gigs, self.tz);
            importable.push(ImportableEvent {
                already_imported: existing.is_some(),
                existing_gig_id: existing.map(|g| g.id),
                conflicts,
                event,
            });
        }
        debug!(count = importable.len(), "importable events listed");
        Ok(importable)
    }

    /// Create a gig from a calendar event. Importing the same event twice
    /// returns the gig created the first time.
    #[instrument(skip(self), fields(user_id = %user_id, event_id = %event_id))]
    pub async fn import_event(&self, user_id: &str, event_id: &str) -> Result<ImportOutcome> {
        if let Some(existing) = self.access.gigs().find_by_external_event(user_id, event_id).await? {
            self.log_sync(
                SyncLogEntry::new(
                    user_id,
                    Some(&existing.id),
                    SyncDirection::Import,
                    SyncAction::SkippedDuplicate,
                    SyncStatus::Skipped,
                )
                .event(Some(event_id)),
            )
            .await;
            return Ok(ImportOutcome { gig_id: existing.id, created: false });
        }

        let connection = self.require_connection(user_id).await?;
        let event = match self
            .provider
            .get_event(&connection.access_token, &connection.calendar_id, event_id)
            .await
        {
            Ok(event) => event,
            Err(err) => {
                self.log_sync(
                    SyncLogEntry::new(
                        user_id,
                        None,
                        SyncDirection::Import,
                        SyncAction::Imported,
                        SyncStatus::Failed,
                    )
                    .event(Some(event_id))
                    .error(err.message()),
                )
                .await;
                return Err(err);
            }
        };
        if event.is_cancelled() {
            return Err(EncoreError::InvalidInput(
                "Cancelled events cannot be imported".to_string(),
            ));
        }

        let gig = gig_from_event(user_id, &event, self.tz, Utc::now());
        if let Err(err) = self.access.gigs().insert(&gig).await {
            // A concurrent import of the same event won the race.
            if matches!(err, EncoreError::Conflict(_)) {
                if let Some(existing) =
                    self.access.gigs().find_by_external_event(user_id, event_id).await?
                {
                    return Ok(ImportOutcome { gig_id: existing.id, created: false });
                }
            }
            return Err(err);
        }

        self.insert_owner_role(user_id, &gig, connection.provider_email.as_deref()).await;

        self.activity
            .record(
                &gig.id,
                user_id,
                ActivityType::GigImported,
                format!("Imported \"{}\" from calendar", gig.title),
                json!({ "eventId": event.id, "provider": self.provider.name() }),
            )
            .await;
        self.log_sync(
            SyncLogEntry::new(
                user_id,
                Some(&gig.id),
                SyncDirection::Import,
                SyncAction::Imported,
                SyncStatus::Success,
            )
            .event(Some(&event.id)),
        )
        .await;

        info!(gig_id = %gig.id, "calendar event imported");
        Ok(ImportOutcome { gig_id: gig.id, created: true })
    }

    /// Give the importing user an accepted leader role. Failure is logged.
    async fn insert_owner_role(&self, user_id: &str, gig: &Gig, account_email: Option<&str>) {
        let profile = self.profile(user_id).await;
        let email = profile
            .as_ref()
            .and_then(|p| p.email.clone())
            .or_else(|| account_email.map(ToOwned::to_owned));
        let name = profile.map(|p| p.display_name).filter(|n| !n.trim().is_empty());

        let now = Utc::now();
        let mut role = GigRole::from_new(
            &gig.id,
            NewRole {
                musician_id: Some(user_id.to_string()),
                musician_name: name,
                musician_email: email,
                role_name: IMPORTED_OWNER_ROLE.to_string(),
                agreed_fee_cents: None,
                notes: None,
            },
            now,
        );
        role.invitation_status = InvitationStatus::Accepted;
        role.responded_at = Some(now);

        if let Err(err) = self.access.roles().insert(&role).await {
            warn!(gig_id = %gig.id, error = %err, "failed to add owner role to imported gig");
        }
    }

    // ------------------------------------------------------------------
    // Export
    // ------------------------------------------------------------------

    /// Push a gig to the owner's calendar.
    ///
    /// A linked event is patched (and recreated when it has vanished);
    /// otherwise an event is created. When creation fails but older per-role
    /// events exist, those are patched instead.
    #[instrument(skip(self), fields(owner_id = %owner_id, gig_id = %gig_id))]
    pub async fn sync_gig_to_calendar(
        &self,
        owner_id: &str,
        gig_id: &str,
    ) -> Result<CalendarPushOutcome> {
        let mut gig = self.access.owned(owner_id, gig_id).await?;
        if gig.is_cancelled() {
            return Err(EncoreError::InvalidInput(
                "Cancelled gigs cannot be synced to the calendar".to_string(),
            ));
        }
        let mut connection = self.require_connection(owner_id).await?;
        let token = connection.access_token.clone();
        let calendar_id = connection.calendar_id.clone();
        let draft = event_draft_for_gig(&gig, self.tz, None);

        let mut legacy_events_updated = 0;
        let (event_id, action) = match linked_event_id(&gig) {
            Some(event_id) => {
                match self.provider.patch_event(&token, &calendar_id, &event_id, &draft, false).await
                {
                    Ok(event) => (Some(event.id), SyncAction::Updated),
                    Err(err) if err.is_not_found() => {
                        debug!(event_id = %event_id, "linked event is gone; recreating");
                        match self.provider.insert_event(&token, &calendar_id, &draft, false).await {
                            Ok(event) => (Some(event.id), SyncAction::Recreated),
                            Err(err) => {
                                self.log_export_failure(owner_id, &gig, SyncAction::Recreated, &err)
                                    .await;
                                return Err(err);
                            }
                        }
                    }
                    Err(err) => {
                        self.log_export_failure(owner_id, &gig, SyncAction::Updated, &err).await;
                        return Err(err);
                    }
                }
            }
            None => match self.provider.insert_event(&token, &calendar_id, &draft, false).await {
                Ok(event) => (Some(event.id), SyncAction::Created),
                Err(err) => {
                    legacy_events_updated =
                        self.patch_legacy_events(&token, &calendar_id, &gig, &draft).await?;
                    if legacy_events_updated == 0 {
                        self.log_export_failure(owner_id, &gig, SyncAction::Created, &err).await;
                        return Err(err);
                    }
                    warn!(error = %err, "event creation failed; updated legacy role events");
                    (None, SyncAction::LegacyUpdated)
                }
            },
        };

        if let Some(event_id) = event_id.as_deref() {
            if gig.calendar_event_id.as_deref() != Some(event_id) {
                gig.calendar_event_id = Some(event_id.to_string());
                gig.updated_at = Utc::now();
                self.access.gigs().update(&gig).await?;
            }
        }

        let watch_registered = self.ensure_watch(&mut connection).await;

        self.log_sync(
            SyncLogEntry::new(
                owner_id,
                Some(&gig.id),
                SyncDirection::Export,
                action,
                SyncStatus::Success,
            )
            .event(event_id.as_deref()),
        )
        .await;
        self.activity
            .record(
                &gig.id,
                owner_id,
                ActivityType::CalendarSynced,
                format!("Synced to calendar ({action})"),
                json!({ "eventId": event_id, "legacyEventsUpdated": legacy_events_updated }),
            )
            .await;

        Ok(CalendarPushOutcome { event_id, action, legacy_events_updated, watch_registered })
    }

    /// Patch every per-role event still attached to the gig. Returns how many
    /// were updated.
    async fn patch_legacy_events(
        &self,
        token: &str,
        calendar_id: &str,
        gig: &Gig,
        draft: &CalendarEventDraft,
    ) -> Result<u32> {
        let roles = self.access.roles().list_by_gig(&gig.id).await?;
        let mut updated = 0;
        for role in &roles {
            let Some(event_id) = role.calendar_event_id.as_deref() else { continue };
            match self.provider.patch_event(token, calendar_id, event_id, draft, false).await {
                Ok(_) => updated += 1,
                Err(err) => warn!(role_id = %role.id, error = %err, "legacy event update failed"),
            }
        }
        if updated > 0 {
            self.log_sync(
                SyncLogEntry::new(
                    &gig.owner_id,
                    Some(&gig.id),
                    SyncDirection::Export,
                    SyncAction::LegacyUpdated,
                    SyncStatus::Success,
                )
                .error(format!("{updated} legacy event(s) updated")),
            )
            .await;
        }
        Ok(updated)
    }

    // ------------------------------------------------------------------
    // Invitations
    // ------------------------------------------------------------------

    /// Invite the lineup through the calendar event's attendee list, or by
    /// e-mail when the calendar is unavailable.
    #[instrument(skip(self), fields(owner_id = %owner_id, gig_id = %gig_id))]
    pub async fn send_invites(&self, owner_id: &str, gig_id: &str) -> Result<SendInvitesReport> {
        let mut gig = self.access.owned(owner_id, gig_id).await?;
        if gig.is_cancelled() {
            return Err(EncoreError::InvalidInput(
                "Cannot send invites for a cancelled gig".to_string(),
            ));
        }
        let mut roles = self.access.roles().list_by_gig(&gig.id).await?;

        let calendar = match self.active_connection(owner_id).await {
            Ok(Some(connection)) => {
                let organizer = self.organizer_email(owner_id, Some(&connection)).await;
                self.invite_via_calendar(&connection, &mut gig, &roles, organizer.as_deref())
                    .await
            }
            Ok(None) => Err(EncoreError::NotFound("No calendar is connected".to_string())),
            Err(err) => Err(err),
        };

        let now = Utc::now();
        let mut outcomes = Vec::with_capacity(roles.len());
        let mut newly_invited: Vec<usize> = Vec::new();

        let (event_id, calendar_error) = match calendar {
            Ok(event_id) => {
                for (index, role) in roles.iter_mut().enumerate() {
                    let outcome = match skip_reason(role, false) {
                        Some(reason) => skipped(role, reason),
                        None => {
                            if mark_invited(role, now) {
                                newly_invited.push(index);
                            }
                            InviteOutcome {
                                role_id: role.id.clone(),
                                musician_email: role.musician_email.clone(),
                                channel: InviteChannel::Calendar,
                                invited: true,
                                error: None,
                            }
                        }
                    };
                    outcomes.push(outcome);
                }
                (Some(event_id), None)
            }
            Err(err) => {
                warn!(error = %err, "calendar invites unavailable; falling back to e-mail");
                let organizer_name = self.profile(owner_id).await.map(|p| p.display_name);
                for (index, role) in roles.iter_mut().enumerate() {
                    let outcome = match skip_reason(role, true) {
                        Some(reason) => skipped(role, reason),
                        None => {
                            let result = self.email_invite(&gig, role, organizer_name.clone()).await;
                            let invited = result.is_ok();
                            if invited && mark_invited(role, now) {
                                newly_invited.push(index);
                            }
                            InviteOutcome {
                                role_id: role.id.clone(),
                                musician_email: role.musician_email.clone(),
                                channel: InviteChannel::Email,
                                invited,
                                error: result.err().map(|e| e.message().to_string()),
                            }
                        }
                    };
                    outcomes.push(outcome);
                }
                (None, Some(err.message().to_string()))
            }
        };

        for &index in &newly_invited {
            let role = &roles[index];
            if let Err(err) = self.access.roles().update(role).await {
                warn!(role_id = %role.id, error = %err, "failed to mark role invited");
            }
            if let Some(musician_id) = role.musician_id.as_deref().filter(|m| *m != owner_id) {
                self.notifications
                    .notify(
                        NewNotification::new(
                            musician_id,
                            NotificationKind::GigInvitation,
                            format!("You're invited to {}", gig.title),
                        )
                        .with_body(format!("{} on {}", role.role_name, gig.date))
                        .for_gig(&gig.id)
                        .dedupe_key(format!("gig_invitation:{}:{}", gig.id, role.id)),
                    )
                    .await;
            }
        }

        let invited = outcomes.iter().filter(|o| o.invited).count();
        let status = if calendar_error.is_none() { SyncStatus::Success } else { SyncStatus::Failed };
        let mut entry = SyncLogEntry::new(
            owner_id,
            Some(&gig.id),
            SyncDirection::Export,
            SyncAction::InvitesSent,
            status,
        )
        .event(event_id.as_deref());
        if let Some(error) = calendar_error.as_deref() {
            entry = entry.error(error);
        }
        self.log_sync(entry).await;

        self.activity
            .record(
                &gig.id,
                owner_id,
                ActivityType::InvitesSent,
                format!("Sent {invited} invitation(s)"),
                json!({ "invited": invited, "viaCalendar": calendar_error.is_none() }),
            )
            .await;

        info!(invited, via_calendar = calendar_error.is_none(), "invites sent");
        Ok(SendInvitesReport { event_id, calendar_error, outcomes })
    }

    /// Reconcile the gig event's attendees with the lineup and let the
    /// provider e-mail the changes. Returns the event id.
    async fn invite_via_calendar(
        &self,
        connection: &CalendarConnection,
        gig: &mut Gig,
        roles: &[GigRole],
        organizer_email: Option<&str>,
    ) -> Result<String> {
        let token = connection.access_token.as_str();
        let calendar_id = connection.calendar_id.as_str();

        let current = match linked_event_id(gig) {
            Some(event_id) => match self.provider.get_event(token, calendar_id, &event_id).await {
                Ok(event) => Some(event),
                Err(err) if err.is_not_found() => None,
                Err(err) => return Err(err),
            },
            None => None,
        };

        let existing = current.as_ref().map(|e| e.attendees.as_slice()).unwrap_or_default();
        let attendees = reconcile_attendees(existing, roles, organizer_email);
        let draft = event_draft_for_gig(gig, self.tz, Some(attendees));

        let event = match current {
            Some(event) => {
                self.provider.patch_event(token, calendar_id, &event.id, &draft, true).await?
            }
            None => self.provider.insert_event(token, calendar_id, &draft, true).await?,
        };

        if gig.calendar_event_id.as_deref() != Some(event.id.as_str()) {
            gig.calendar_event_id = Some(event.id.clone());
            gig.updated_at = Utc::now();
            self.access.gigs().update(gig).await?;
        }
        Ok(event.id)
    }

    async fn email_invite(
        &self,
        gig: &Gig,
        role: &GigRole,
        organizer_name: Option<String>,
    ) -> Result<()> {
        let Some(sender) = self.email.as_ref() else {
            return Err(EncoreError::Config("E-mail delivery is not configured".to_string()));
        };
        let Some(to) = role.musician_email.clone() else {
            return Err(EncoreError::InvalidInput("No e-mail address".to_string()));
        };
        let email = InvitationEmail {
            to,
            musician_name: role.musician_name.clone(),
            role_name: role.role_name.clone(),
            gig_title: gig.title.clone(),
            gig_date: gig.date,
            location: super::events::gig_location(gig),
            organizer_name: organizer_name.filter(|n| !n.trim().is_empty()),
            gig_id: gig.id.clone(),
        };
        let result = sender.send_invitation(&email).await;
        match &result {
            Ok(()) => debug!(to = %redact_email(&email.to), "invitation e-mailed"),
            Err(err) => warn!(to = %redact_email(&email.to), error = %err, "invitation e-mail failed"),
        }
        result
    }

    /// Copy attendee RSVPs from the calendar event onto the matching roles.
    #[instrument(skip(self), fields(owner_id = %owner_id, gig_id = %gig_id))]
    pub async fn refresh_rsvps(&self, owner_id: &str, gig_id: &str) -> Result<RsvpRefreshReport> {
        let gig = self.access.owned(owner_id, gig_id).await?;
        let Some(event_id) = linked_event_id(&gig) else {
            return Err(EncoreError::InvalidInput(
                "The gig has no calendar event yet".to_string(),
            ));
        };
        let connection = self.require_connection(owner_id).await?;

        let event = match self
            .provider
            .get_event(&connection.access_token, &connection.calendar_id, &event_id)
            .await
        {
            Ok(event) => event,
            Err(err) => {
                self.log_sync(
                    SyncLogEntry::new(
                        owner_id,
                        Some(&gig.id),
                        SyncDirection::Import,
                        SyncAction::RsvpRefreshed,
                        SyncStatus::Failed,
                    )
                    .event(Some(&event_id))
                    .error(err.message()),
                )
                .await;
                return Err(err);
            }
        };

        let roles = self.access.roles().list_by_gig(&gig.id).await?;
        let now = Utc::now();
        let mut updated_role_ids = Vec::new();
        let mut unchanged = 0;

        for mut role in roles {
            let Some(email) = role.email_key() else { continue };
            let Some(attendee) = event.attendees.iter().find(|a| a.email_key() == email) else {
                continue;
            };
            let target = match attendee.response_status {
                AttendeeResponse::Accepted => InvitationStatus::Accepted,
                AttendeeResponse::Declined => InvitationStatus::Declined,
                AttendeeResponse::NeedsAction | AttendeeResponse::Tentative => {
                    unchanged += 1;
                    continue;
                }
            };
            let previous = role.invitation_status;
            if previous == target || !previous.can_transition_to(target) {
                unchanged += 1;
                continue;
            }

            role.invitation_status = target;
            role.responded_at = Some(now);
            role.updated_at = now;
            self.access.roles().update(&role).await?;
            updated_role_ids.push(role.id.clone());

            self.activity
                .record(
                    &gig.id,
                    role.musician_id.as_deref().unwrap_or(owner_id),
                    ActivityType::StatusChanged,
                    format!("{} RSVP'd {target} in the calendar", role.display_name()),
                    json!({ "roleId": role.id, "from": previous, "to": target }),
                )
                .await;
            self.notifications
                .notify(
                    NewNotification::new(
                        &gig.owner_id,
                        NotificationKind::RsvpUpdated,
                        format!("{} {target} {}", role.display_name(), gig.title),
                    )
                    .for_gig(&gig.id)
                    .dedupe_key(format!("rsvp_updated:{}:{}", gig.id, role.id)),
                )
                .await;
        }

        self.log_sync(
            SyncLogEntry::new(
                owner_id,
                Some(&gig.id),
                SyncDirection::Import,
                SyncAction::RsvpRefreshed,
                SyncStatus::Success,
            )
            .event(Some(&event.id)),
        )
        .await;

        Ok(RsvpRefreshReport { updated_role_ids, unchanged })
    }

    // ------------------------------------------------------------------
    // Cancellation
    // ------------------------------------------------------------------

    /// Remove a gig's calendar presence: its event, any legacy per-role
    /// events and, once nothing else is linked, the push watch.
    #[instrument(skip(self), fields(owner_id = %owner_id, gig_id = %gig_id))]
    pub async fn cancel_gig_event(&self, owner_id: &str, gig_id: &str) -> Result<CancelEventOutcome> {
        let mut gig = self.access.owned(owner_id, gig_id).await?;
        let Some(mut connection) = self.active_connection(owner_id).await? else {
            return Ok(CancelEventOutcome::default());
        };
        let token = connection.access_token.clone();
        let calendar_id = connection.calendar_id.clone();
        let mut outcome = CancelEventOutcome::default();
        let event_id = gig.calendar_event_id.clone();

        if let Some(event_id) = event_id.as_deref() {
            match self.provider.delete_event(&token, &calendar_id, event_id).await {
                Ok(()) => outcome.event_deleted = true,
                Err(err) if err.is_not_found() => {
                    debug!(event_id, "calendar event already gone");
                    outcome.event_deleted = true;
                }
                Err(err) => {
                    self.log_export_failure(owner_id, &gig, SyncAction::Deleted, &err).await;
                    return Err(err);
                }
            }
        }

        let roles = self.access.roles().list_by_gig(&gig.id).await?;
        for mut role in roles.into_iter().filter(|r| r.calendar_event_id.is_some()) {
            let Some(event_id) = role.calendar_event_id.clone() else { continue };
            match self.provider.delete_event(&token, &calendar_id, &event_id).await {
                Ok(()) => {}
                Err(err) if err.is_not_found() => {}
                Err(err) => {
                    warn!(role_id = %role.id, error = %err, "failed to delete legacy event");
                    continue;
                }
            }
            outcome.legacy_events_deleted += 1;
            role.calendar_event_id = None;
            role.updated_at = Utc::now();
            if let Err(err) = self.access.roles().update(&role).await {
                warn!(role_id = %role.id, error = %err, "failed to clear legacy event id");
            }
        }

        if gig.calendar_event_id.is_some() {
            gig.calendar_event_id = None;
            gig.updated_at = Utc::now();
            self.access.gigs().update(&gig).await?;
        }

        if connection.watch_channel_id.is_some() {
            match self.access.gigs().count_calendar_linked(owner_id).await {
                Ok(0) => {
                    outcome.watch_stopped = self.stop_watch_best_effort(&mut connection).await;
                    if let Err(err) = self.connections.upsert(&connection).await {
                        warn!(error = %err, "failed to clear watch on connection");
                    }
                }
                Ok(_) => {}
                Err(err) => warn!(error = %err, "could not count linked gigs; keeping watch"),
            }
        }

        self.log_sync(
            SyncLogEntry::new(
                owner_id,
                Some(&gig.id),
                SyncDirection::Export,
                SyncAction::Deleted,
                SyncStatus::Success,
            )
            .event(event_id.as_deref()),
        )
        .await;

        Ok(outcome)
    }

    // ------------------------------------------------------------------
    // Conflicts
    // ------------------------------------------------------------------

    /// Calendar events overlapping a gig. Empty when no calendar is connected.
    pub async fn gig_conflicts(&self, user_id: &str, gig_id: &str) -> Result<Vec<CalendarConflict>> {
        let membership = self.access.visible(user_id, gig_id).await?;
        let Some(connection) = self.active_connection(user_id).await? else {
            return Ok(Vec::new());
        };
        let (start, end) = gig_window(&membership.gig, self.tz);
        let events = self
            .provider
            .list_events(&connection.access_token, &connection.calendar_id, start, end)
            .await?;
        Ok(find_conflicts(&events, std::slice::from_ref(&membership.gig), self.tz))
    }

    // ------------------------------------------------------------------
    // Inbound sync
    // ------------------------------------------------------------------

    /// Handle a push notification from the provider.
    ///
    /// The initial `sync` message is ignored; anything else re-syncs the
    /// channel owner's imported gigs.
    #[instrument(skip(self, notification), fields(channel_id = %notification.channel_id, state = %notification.resource_state))]
    pub async fn handle_push_notification(
        &self,
        notification: PushNotification,
    ) -> Result<ImportedSyncReport> {
        if notification.resource_state.eq_ignore_ascii_case(SYNC_STATE) {
            debug!("watch channel confirmed");
            return Ok(ImportedSyncReport::default());
        }

        let Some(connection) = self.connections.find_by_watch_channel(&notification.channel_id).await?
        else {
            warn!("push notification for unknown channel");
            return Ok(ImportedSyncReport::default());
        };
        if let (Some(expected), Some(actual)) =
            (connection.watch_resource_id.as_deref(), notification.resource_id.as_deref())
        {
            if expected != actual {
                warn!("push notification resource mismatch; ignoring");
                return Ok(ImportedSyncReport::default());
            }
        }

        self.sync_imported_gigs(&connection.user_id).await
    }

    /// Pull changes for every imported gig of the user: cancelled or deleted
    /// events cancel the gig, edits are copied across.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn sync_imported_gigs(&self, user_id: &str) -> Result<ImportedSyncReport> {
        let Some(mut connection) = self.active_connection(user_id).await? else {
            return Ok(ImportedSyncReport::default());
        };
        let gigs = self.access.gigs().list_imported(user_id).await?;
        let mut report = ImportedSyncReport::default();

        for mut gig in gigs {
            let Some(event_id) = gig.external_calendar_event_id.clone() else { continue };
            report.checked += 1;

            let event = match self
                .provider
                .get_event(&connection.access_token, &connection.calendar_id, &event_id)
                .await
            {
                Ok(event) => Some(event),
                Err(err) if err.is_not_found() => None,
                Err(err) if err.is_token_revoked() => return Err(err),
                Err(err) => {
                    warn!(gig_id = %gig.id, error = %err, "failed to fetch imported event");
                    self.log_sync(
                        SyncLogEntry::new(
                            user_id,
                            Some(&gig.id),
                            SyncDirection::Import,
                            SyncAction::Updated,
                            SyncStatus::Failed,
                        )
                        .event(Some(&event_id))
                        .error(err.message()),
                    )
                    .await;
                    continue;
                }
            };

            match event {
                Some(event) if !event.is_cancelled() => {
                    if apply_event_changes(&mut gig, &event, self.tz, Utc::now()) {
                        self.access.gigs().update(&gig).await?;
                        report.updated += 1;
                        self.after_inbound_change(&gig, &event_id, false).await?;
                    }
                }
                _ => {
                    gig.status = GigStatus::Cancelled;
                    gig.updated_at = Utc::now();
                    self.access.gigs().update(&gig).await?;
                    report.cancelled += 1;
                    self.after_inbound_change(&gig, &event_id, true).await?;
                }
            }
        }

        connection.last_synced_at = Some(Utc::now());
        connection.updated_at = Utc::now();
        self.connections.upsert(&connection).await?;

        debug!(
            checked = report.checked,
            updated = report.updated,
            cancelled = report.cancelled,
            "imported gigs synced"
        );
        Ok(report)
    }

    async fn after_inbound_change(&self, gig: &Gig, event_id: &str, cancelled: bool) -> Result<()> {
        let (action, activity_type, kind, title) = if cancelled {
            (
                SyncAction::CancelledFromCalendar,
                ActivityType::GigCancelled,
                NotificationKind::GigCancelled,
                "Gig cancelled",
            )
        } else {
            (SyncAction::Updated, ActivityType::GigUpdated, NotificationKind::GigUpdated, "Gig updated")
        };

        self.log_sync(
            SyncLogEntry::new(
                &gig.owner_id,
                Some(&gig.id),
                SyncDirection::Import,
                action,
                SyncStatus::Success,
            )
            .event(Some(event_id)),
        )
        .await;
        self.activity
            .record(
                &gig.id,
                &gig.owner_id,
                activity_type,
                format!("{title} from calendar"),
                json!({ "eventId": event_id }),
            )
            .await;

        let roles = self.access.roles().list_by_gig(&gig.id).await?;
        let audience = gig_audience(gig, &roles, &gig.owner_id);
        let body = format!("{} on {}", gig.title, gig.date);
        self.notifications
            .fan_out(&gig.owner_id, &audience, |recipient| {
                NewNotification::new(recipient, kind, title)
                    .with_body(body.clone())
                    .for_gig(&gig.id)
                    .dedupe_key(format!("{kind}:{}:{recipient}", gig.id))
            })
            .await;
        Ok(())
    }

    /// Run [`sync_imported_gigs`](Self::sync_imported_gigs) for every
    /// connection with sync enabled. Returns how many users synced cleanly.
    pub async fn sync_all_connections(&self) -> Result<u32> {
        let connections = self.connections.list_sync_enabled().await?;
        let mut synced = 0;
        for connection in connections {
            match self.sync_imported_gigs(&connection.user_id).await {
                Ok(_) => synced += 1,
                Err(err) => warn!(user_id = %connection.user_id, error = %err, "calendar sync failed"),
            }
        }
        Ok(synced)
    }

    /// Re-register push watches expiring within the renewal window.
    pub async fn renew_expiring_watches(&self) -> Result<u32> {
        if self.settings.webhook_url.is_none() {
            return Ok(0);
        }
        let before = Utc::now() + Duration::hours(WATCH_RENEWAL_WINDOW_HOURS);
        let expiring = self.connections.list_with_expiring_watch(before).await?;

        let mut renewed = 0;
        for connection in expiring {
            let user_id = connection.user_id.clone();
            let mut connection = match self.ensure_fresh(connection).await {
                Ok(connection) => connection,
                Err(err) => {
                    warn!(user_id = %user_id, error = %err, "skipping watch renewal");
                    continue;
                }
            };
            if connection.watch_channel_id.is_some() {
                self.stop_watch_best_effort(&mut connection).await;
            }
            if self.ensure_watch(&mut connection).await {
                renewed += 1;
            }
        }
        info!(renewed, "calendar watches renewed");
        Ok(renewed)
    }

    pub async fn sync_log(&self, user_id: &str, limit: Option<u32>) -> Result<Vec<SyncLogEntry>> {
        self.sync_log.list_for_user(user_id, limit.filter(|l| *l > 0).unwrap_or(50)).await
    }

    // ------------------------------------------------------------------
    // Watches
    // ------------------------------------------------------------------

    /// Register a push watch when a webhook is configured and none is
    /// active. Never fails the caller.
    async fn ensure_watch(&self, connection: &mut CalendarConnection) -> bool {
        let Some(address) = self.settings.webhook_url.as_deref() else { return false };
        let now = Utc::now();
        if connection.has_active_watch(now) {
            return false;
        }

        let channel_id = Uuid::new_v4().to_string();
        match self
            .provider
            .watch_events(&connection.access_token, &connection.calendar_id, &channel_id, address)
            .await
        {
            Ok(channel) => {
                connection.watch_channel_id = Some(channel.channel_id);
                connection.watch_resource_id = Some(channel.resource_id);
                connection.watch_expires_at = channel.expires_at;
                connection.updated_at = now;
                if let Err(err) = self.connections.upsert(connection).await {
                    warn!(error = %err, "failed to store watch channel");
                }
                self.log_sync(SyncLogEntry::new(
                    &connection.user_id,
                    None,
                    SyncDirection::Import,
                    SyncAction::WatchRegistered,
                    SyncStatus::Success,
                ))
                .await;
                true
            }
            Err(err) => {
                warn!(error = %err, "failed to register calendar watch");
                self.log_sync(
                    SyncLogEntry::new(
                        &connection.user_id,
                        None,
                        SyncDirection::Import,
                        SyncAction::WatchRegistered,
                        SyncStatus::Failed,
                    )
                    .error(err.message()),
                )
                .await;
                false
            }
        }
    }

    /// Stop the connection's watch and clear it locally whatever happens.
    async fn stop_watch_best_effort(&self, connection: &mut CalendarConnection) -> bool {
        let (Some(channel_id), Some(resource_id)) =
            (connection.watch_channel_id.clone(), connection.watch_resource_id.clone())
        else {
            connection.clear_watch();
            return false;
        };

        let result =
            self.provider.stop_watch(&connection.access_token, &channel_id, &resource_id).await;
        connection.clear_watch();
        connection.updated_at = Utc::now();

        let (stopped, error_message) = match result {
            Ok(()) => (true, None),
            Err(err) if err.is_not_found() => (true, None),
            Err(err) => {
                warn!(error = %err, "failed to stop calendar watch");
                (false, Some(err.message().to_string()))
            }
        };
        let mut log = SyncLogEntry::new(
            &connection.user_id,
            None,
            SyncDirection::Import,
            SyncAction::WatchStopped,
            if stopped { SyncStatus::Success } else { SyncStatus::Failed },
        );
        if let Some(error) = error_message {
            log = log.error(error);
        }
        self.log_sync(log).await;
        stopped
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    async fn log_sync(&self, entry: SyncLogEntry) {
        if let Err(err) = self.sync_log.insert(&entry).await {
            warn!(action = %entry.action, error = %err, "failed to write sync log");
        }
    }

    async fn log_export_failure(&self, user_id: &str, gig: &Gig, action: SyncAction, err: &EncoreError) {
        self.log_sync(
            SyncLogEntry::new(user_id, Some(&gig.id), SyncDirection::Export, action, SyncStatus::Failed)
                .event(linked_event_id(gig).as_deref())
                .error(err.message()),
        )
        .await;
    }

    async fn profile(&self, user_id: &str) -> Option<encore_domain::Profile> {
        let profiles = self.profiles.as_ref()?;
        match profiles.find(user_id).await {
            Ok(profile) => profile,
            Err(err) => {
                warn!(error = %err, "failed to load profile");
                None
            }
        }
    }

    /// The owner's identity on the event: profile e-mail, else the calendar
    /// account's e-mail.
    async fn organizer_email(
        &self,
        owner_id: &str,
        connection: Option<&CalendarConnection>,
    ) -> Option<String> {
        self.profile(owner_id)
            .await
            .and_then(|p| p.email)
            .or_else(|| connection.and_then(|c| c.provider_email.clone()))
    }
}

/// Event the gig is linked to: the pushed event, else the imported one.
fn linked_event_id(gig: &Gig) -> Option<String> {
    gig.calendar_event_id.clone().or_else(|| gig.external_calendar_event_id.clone())
}

fn expiry(now: DateTime<Utc>, expires_in: Option<i64>) -> Option<DateTime<Utc>> {
    expires_in.map(|secs| now + Duration::seconds(secs))
}

/// Why a role gets no invitation, if it doesn't. By e-mail only roles that
/// have not answered yet are contacted.
fn skip_reason(role: &GigRole, email_only: bool) -> Option<&'static str> {
    if !role.invitation_status.is_active() {
        return Some("Role is no longer active");
    }
    if role.email_key().is_none() {
        return Some("No e-mail address");
    }
    if email_only
        && !matches!(role.invitation_status, InvitationStatus::Pending | InvitationStatus::Invited)
    {
        return Some("Musician already responded");
    }
    None
}

fn skipped(role: &GigRole, reason: &str) -> InviteOutcome {
    InviteOutcome {
        role_id: role.id.clone(),
        musician_email: role.musician_email.clone(),
        channel: InviteChannel::Skipped,
        invited: false,
        error: Some(reason.to_string()),
    }
}

/// Pending roles become invited. Returns whether the role changed.
fn mark_invited(role: &mut GigRole, now: DateTime<Utc>) -> bool {
    if role.invitation_status != InvitationStatus::Pending {
        return false;
    }
    role.invitation_status = InvitationStatus::Invited;
    role.invited_at = Some(now);
    role.updated_at = now;
    true
}
