//! Gig commands

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use encore_domain::{CancelEventOutcome, Gig, GigRole, GigUpdate, NewGig};
use serde::Serialize;
use tracing::warn;

use crate::context::AppContext;
use crate::error::ApiResult;
use crate::extract::CurrentUser;
use crate::utils::command_helpers::execute_command;

/// A gig as seen by the acting user.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GigView {
    pub gig: Gig,
    pub is_owner: bool,
    pub my_role: Option<GigRole>,
}

/// Result of cancelling a gig; `calendar` is present when the linked event
/// was processed.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelledGig {
    pub gig: Gig,
    pub calendar: Option<CancelEventOutcome>,
}

pub fn routes() -> Router<Arc<AppContext>> {
    Router::new()
        .route("/gigs", get(list_owned_gigs).post(create_gig))
        .route("/gigs/{gig_id}", get(get_gig).patch(update_gig).delete(delete_gig))
        .route("/gigs/{gig_id}/cancel", post(cancel_gig))
}

async fn create_gig(
    State(ctx): State<Arc<AppContext>>,
    CurrentUser(user): CurrentUser,
    Json(input): Json<NewGig>,
) -> ApiResult<(StatusCode, Json<Gig>)> {
    let gig = execute_command("gigs::create_gig", ctx.gigs.create_gig(&user, input)).await?;
    Ok((StatusCode::CREATED, Json(gig)))
}

async fn list_owned_gigs(
    State(ctx): State<Arc<AppContext>>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<Vec<Gig>>> {
    execute_command("gigs::list_owned_gigs", ctx.gigs.list_owned_gigs(&user)).await.map(Json)
}

async fn get_gig(
    State(ctx): State<Arc<AppContext>>,
    CurrentUser(user): CurrentUser,
    Path(gig_id): Path<String>,
) -> ApiResult<Json<GigView>> {
    let membership = execute_command("gigs::get_gig", ctx.gigs.get_gig(&user, &gig_id)).await?;
    Ok(Json(GigView {
        gig: membership.gig,
        is_owner: membership.is_owner,
        my_role: membership.role,
    }))
}

async fn update_gig(
    State(ctx): State<Arc<AppContext>>,
    CurrentUser(user): CurrentUser,
    Path(gig_id): Path<String>,
    Json(update): Json<GigUpdate>,
) -> ApiResult<Json<Gig>> {
    execute_command("gigs::update_gig", ctx.gigs.update_gig(&user, &gig_id, update))
        .await
        .map(Json)
}

/// Cancel the gig, then remove its calendar event. The calendar step is
/// best-effort: its failure is logged and the cancellation still stands.
async fn cancel_gig(
    State(ctx): State<Arc<AppContext>>,
    CurrentUser(user): CurrentUser,
    Path(gig_id): Path<String>,
) -> ApiResult<Json<CancelledGig>> {
    let gig = execute_command("gigs::cancel_gig", ctx.gigs.cancel_gig(&user, &gig_id)).await?;

    let calendar = if gig.external_calendar_event_id.is_some() || gig.calendar_event_id.is_some() {
        match ctx.calendar.cancel_gig_event(&user, &gig_id).await {
            Ok(outcome) => Some(outcome),
            Err(err) => {
                warn!(gig_id = %gig_id, error = %err, "calendar cancellation failed");
                None
            }
        }
    } else {
        None
    };

    Ok(Json(CancelledGig { gig, calendar }))
}

async fn delete_gig(
    State(ctx): State<Arc<AppContext>>,
    CurrentUser(user): CurrentUser,
    Path(gig_id): Path<String>,
) -> ApiResult<StatusCode> {
    execute_command("gigs::delete_gig", ctx.gigs.delete_gig(&user, &gig_id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
