//! Google Calendar commands: connection, import, export, invites, RSVPs and
//! the push-notification webhook.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use chrono::{DateTime, Duration, Utc};
use encore_domain::{
    CalendarConflict, CalendarConnectionStatus, CalendarPushOutcome, CancelEventOutcome,
    EncoreError, ImportOutcome, ImportableEvent, ImportedSyncReport, PushNotification,
    RsvpRefreshReport, SendInvitesReport, SyncLogEntry,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::commands::readiness::LimitQuery;
use crate::context::AppContext;
use crate::error::{ApiError, ApiResult};
use crate::extract::CurrentUser;
use crate::utils::command_helpers::execute_command;

/// Default import window when the caller gives no `to`.
const DEFAULT_IMPORT_WINDOW_DAYS: i64 = 90;

const CHANNEL_ID_HEADER: &str = "x-goog-channel-id";
const RESOURCE_ID_HEADER: &str = "x-goog-resource-id";
const RESOURCE_STATE_HEADER: &str = "x-goog-resource-state";

#[derive(Debug, Serialize)]
pub struct ConnectResponse {
    pub url: String,
    pub state: String,
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WindowQuery {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct DisconnectResponse {
    pub disconnected: bool,
}

pub fn routes() -> Router<Arc<AppContext>> {
    Router::new()
        .route("/calendar/status", get(connection_status))
        .route("/calendar/connect", post(start_connection))
        .route("/calendar/oauth/callback", get(oauth_callback))
        .route("/calendar/connection", delete(disconnect))
        .route("/calendar/events", get(list_importable_events))
        .route("/calendar/events/{event_id}/import", post(import_event))
        .route("/calendar/sync", post(sync_imported_gigs))
        .route("/calendar/sync-log", get(sync_log))
        .route("/gigs/{gig_id}/calendar", delete(cancel_gig_event))
        .route("/gigs/{gig_id}/calendar/sync", post(sync_gig_to_calendar))
        .route("/gigs/{gig_id}/calendar/invites", post(send_invites))
        .route("/gigs/{gig_id}/calendar/rsvps", post(refresh_rsvps))
        .route("/gigs/{gig_id}/conflicts", get(gig_conflicts))
        .route("/webhooks/google-calendar", post(push_notification))
}

async fn connection_status(
    State(ctx): State<Arc<AppContext>>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<CalendarConnectionStatus>> {
    execute_command("calendar::connection_status", ctx.calendar.connection_status(&user))
        .await
        .map(Json)
}

async fn start_connection(
    State(ctx): State<Arc<AppContext>>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<ConnectResponse>> {
    let request = execute_command("calendar::start_connection", async {
        ctx.begin_calendar_authorization(&user)
    })
    .await?;
    Ok(Json(ConnectResponse { url: request.url, state: request.state }))
}

/// OAuth redirect target. The user is identified by the `state` issued in
/// [`start_connection`], not by a header.
async fn oauth_callback(
    State(ctx): State<Arc<AppContext>>,
    Query(query): Query<CallbackQuery>,
) -> ApiResult<Json<CalendarConnectionStatus>> {
    execute_command("calendar::oauth_callback", async {
        if let Some(error) = query.error {
            return Err(EncoreError::Auth(format!("Authorization was not granted: {error}")));
        }
        let (Some(code), Some(state)) = (query.code, query.state) else {
            return Err(EncoreError::InvalidInput("Missing code or state".into()));
        };
        let pending = ctx.redeem_calendar_authorization(&state)?;
        ctx.calendar.complete_connection(&pending.user_id, &code, &pending.pkce_verifier).await
    })
    .await
    .map(Json)
}

async fn disconnect(
    State(ctx): State<Arc<AppContext>>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<DisconnectResponse>> {
    let disconnected =
        execute_command("calendar::disconnect", ctx.calendar.disconnect(&user)).await?;
    Ok(Json(DisconnectResponse { disconnected }))
}

async fn list_importable_events(
    State(ctx): State<Arc<AppContext>>,
    CurrentUser(user): CurrentUser,
    Query(window): Query<WindowQuery>,
) -> ApiResult<Json<Vec<ImportableEvent>>> {
    let from = window.from.unwrap_or_else(Utc::now);
    let to = window.to.unwrap_or_else(|| from + Duration::days(DEFAULT_IMPORT_WINDOW_DAYS));
    if to <= from {
        return Err(ApiError(EncoreError::InvalidInput("`to` must be after `from`".into())));
    }

    execute_command(
        "calendar::list_importable_events",
        ctx.calendar.list_importable_events(&user, from, to),
    )
    .await
    .map(Json)
}

async fn import_event(
    State(ctx): State<Arc<AppContext>>,
    CurrentUser(user): CurrentUser,
    Path(event_id): Path<String>,
) -> ApiResult<(StatusCode, Json<ImportOutcome>)> {
    let outcome =
        execute_command("calendar::import_event", ctx.calendar.import_event(&user, &event_id))
            .await?;
    let status = if outcome.created { StatusCode::CREATED } else { StatusCode::OK };
    Ok((status, Json(outcome)))
}

async fn sync_gig_to_calendar(
    State(ctx): State<Arc<AppContext>>,
    CurrentUser(user): CurrentUser,
    Path(gig_id): Path<String>,
) -> ApiResult<Json<CalendarPushOutcome>> {
    execute_command(
        "calendar::sync_gig_to_calendar",
        ctx.calendar.sync_gig_to_calendar(&user, &gig_id),
    )
    .await
    .map(Json)
}

async fn send_invites(
    State(ctx): State<Arc<AppContext>>,
    CurrentUser(user): CurrentUser,
    Path(gig_id): Path<String>,
) -> ApiResult<Json<SendInvitesReport>> {
    execute_command("calendar::send_invites", ctx.calendar.send_invites(&user, &gig_id))
        .await
        .map(Json)
}

async fn refresh_rsvps(
    State(ctx): State<Arc<AppContext>>,
    CurrentUser(user): CurrentUser,
    Path(gig_id): Path<String>,
) -> ApiResult<Json<RsvpRefreshReport>> {
    execute_command("calendar::refresh_rsvps", ctx.calendar.refresh_rsvps(&user, &gig_id))
        .await
        .map(Json)
}

async fn cancel_gig_event(
    State(ctx): State<Arc<AppContext>>,
    CurrentUser(user): CurrentUser,
    Path(gig_id): Path<String>,
) -> ApiResult<Json<CancelEventOutcome>> {
    execute_command("calendar::cancel_gig_event", ctx.calendar.cancel_gig_event(&user, &gig_id))
        .await
        .map(Json)
}

async fn gig_conflicts(
    State(ctx): State<Arc<AppContext>>,
    CurrentUser(user): CurrentUser,
    Path(gig_id): Path<String>,
) -> ApiResult<Json<Vec<CalendarConflict>>> {
    execute_command("calendar::gig_conflicts", ctx.calendar.gig_conflicts(&user, &gig_id))
        .await
        .map(Json)
}

async fn sync_imported_gigs(
    State(ctx): State<Arc<AppContext>>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<ImportedSyncReport>> {
    execute_command("calendar::sync_imported_gigs", ctx.calendar.sync_imported_gigs(&user))
        .await
        .map(Json)
}

async fn sync_log(
    State(ctx): State<Arc<AppContext>>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<LimitQuery>,
) -> ApiResult<Json<Vec<SyncLogEntry>>> {
    execute_command("calendar::sync_log", ctx.calendar.sync_log(&user, query.limit))
        .await
        .map(Json)
}

/// Google push notification. Acknowledged immediately; the re-sync runs in
/// the background so the provider never waits on it.
async fn push_notification(
    State(ctx): State<Arc<AppContext>>,
    headers: HeaderMap,
) -> ApiResult<StatusCode> {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    };

    let notification = execute_command("calendar::push_notification", async {
        let channel_id = header(CHANNEL_ID_HEADER).ok_or_else(|| {
            EncoreError::InvalidInput("Missing X-Goog-Channel-ID header".into())
        })?;
        Ok(PushNotification {
            channel_id,
            resource_id: header(RESOURCE_ID_HEADER),
            resource_state: header(RESOURCE_STATE_HEADER).unwrap_or_default(),
        })
    })
    .await?;

    debug!(
        channel_id = %notification.channel_id,
        state = %notification.resource_state,
        "calendar push notification received"
    );
    let calendar = ctx.calendar.clone();
    tokio::spawn(async move {
        match calendar.handle_push_notification(notification).await {
            Ok(report) => info!(
                checked = report.checked,
                updated = report.updated,
                cancelled = report.cancelled,
                "push notification processed"
            ),
            Err(err) => warn!(error = %err, "push notification processing failed"),
        }
    });

    Ok(StatusCode::OK)
}
