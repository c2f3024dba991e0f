//! Lineup, invitation and payment commands

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use encore_domain::{
    GigRole, Invitation, InvitationStatus, MusicianEarnings, NewRole, PaymentSummary, RoleUpdate,
};
use serde::Deserialize;

use crate::context::AppContext;
use crate::error::ApiResult;
use crate::extract::CurrentUser;
use crate::utils::command_helpers::execute_command;

#[derive(Debug, Deserialize)]
pub struct RespondRequest {
    pub status: InvitationStatus,
}

#[derive(Debug, Deserialize)]
pub struct PaymentRequest {
    pub paid: bool,
}

pub fn routes() -> Router<Arc<AppContext>> {
    Router::new()
        .route("/gigs/{gig_id}/roles", get(list_roles).post(add_role))
        .route("/roles/{role_id}", patch(update_role).delete(remove_role))
        .route("/roles/{role_id}/respond", post(respond))
        .route("/roles/{role_id}/payment", post(mark_role_payment))
        .route("/gigs/{gig_id}/payments", get(gig_payment_summary))
        .route("/invitations", get(list_invitations))
        .route("/me/earnings", get(my_earnings))
}

async fn list_roles(
    State(ctx): State<Arc<AppContext>>,
    CurrentUser(user): CurrentUser,
    Path(gig_id): Path<String>,
) -> ApiResult<Json<Vec<GigRole>>> {
    execute_command("roles::list_roles", ctx.roles.list_roles(&user, &gig_id)).await.map(Json)
}

async fn add_role(
    State(ctx): State<Arc<AppContext>>,
    CurrentUser(user): CurrentUser,
    Path(gig_id): Path<String>,
    Json(input): Json<NewRole>,
) -> ApiResult<(StatusCode, Json<GigRole>)> {
    let role = execute_command("roles::add_role", ctx.roles.add_role(&user, &gig_id, input)).await?;
    Ok((StatusCode::CREATED, Json(role)))
}

async fn update_role(
    State(ctx): State<Arc<AppContext>>,
    CurrentUser(user): CurrentUser,
    Path(role_id): Path<String>,
    Json(update): Json<RoleUpdate>,
) -> ApiResult<Json<GigRole>> {
    execute_command("roles::update_role", ctx.roles.update_role(&user, &role_id, update))
        .await
        .map(Json)
}

async fn remove_role(
    State(ctx): State<Arc<AppContext>>,
    CurrentUser(user): CurrentUser,
    Path(role_id): Path<String>,
) -> ApiResult<StatusCode> {
    execute_command("roles::remove_role", ctx.roles.remove_role(&user, &role_id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn respond(
    State(ctx): State<Arc<AppContext>>,
    CurrentUser(user): CurrentUser,
    Path(role_id): Path<String>,
    Json(request): Json<RespondRequest>,
) -> ApiResult<Json<GigRole>> {
    execute_command("roles::respond", ctx.roles.respond(&user, &role_id, request.status))
        .await
        .map(Json)
}

async fn list_invitations(
    State(ctx): State<Arc<AppContext>>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<Vec<Invitation>>> {
    execute_command("roles::list_invitations", ctx.roles.list_invitations(&user)).await.map(Json)
}

async fn mark_role_payment(
    State(ctx): State<Arc<AppContext>>,
    CurrentUser(user): CurrentUser,
    Path(role_id): Path<String>,
    Json(request): Json<PaymentRequest>,
) -> ApiResult<Json<GigRole>> {
    execute_command(
        "payments::mark_role_payment",
        ctx.payments.mark_role_payment(&user, &role_id, request.paid),
    )
    .await
    .map(Json)
}

async fn gig_payment_summary(
    State(ctx): State<Arc<AppContext>>,
    CurrentUser(user): CurrentUser,
    Path(gig_id): Path<String>,
) -> ApiResult<Json<PaymentSummary>> {
    execute_command(
        "payments::gig_payment_summary",
        ctx.payments.gig_payment_summary(&user, &gig_id),
    )
    .await
    .map(Json)
}

async fn my_earnings(
    State(ctx): State<Arc<AppContext>>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<MusicianEarnings>> {
    execute_command("payments::my_earnings", ctx.payments.my_earnings(&user)).await.map(Json)
}
