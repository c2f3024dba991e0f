//! Readiness and activity commands

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use encore_domain::{ActivityEntry, ReadinessReport, ReadinessUpdate};
use serde::Deserialize;

use crate::context::AppContext;
use crate::error::ApiResult;
use crate::extract::CurrentUser;
use crate::utils::command_helpers::execute_command;

#[derive(Debug, Default, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<u32>,
}

pub fn routes() -> Router<Arc<AppContext>> {
    Router::new()
        .route("/gigs/{gig_id}/readiness", get(list_gig_readiness))
        .route("/gigs/{gig_id}/readiness/me", get(get_my_readiness).put(update_my_readiness))
        .route("/gigs/{gig_id}/activity", get(list_activity))
}

async fn get_my_readiness(
    State(ctx): State<Arc<AppContext>>,
    CurrentUser(user): CurrentUser,
    Path(gig_id): Path<String>,
) -> ApiResult<Json<ReadinessReport>> {
    execute_command("readiness::get_my_readiness", ctx.readiness.get_my_readiness(&user, &gig_id))
        .await
        .map(Json)
}

async fn update_my_readiness(
    State(ctx): State<Arc<AppContext>>,
    CurrentUser(user): CurrentUser,
    Path(gig_id): Path<String>,
    Json(update): Json<ReadinessUpdate>,
) -> ApiResult<Json<ReadinessReport>> {
    execute_command(
        "readiness::update_my_readiness",
        ctx.readiness.update_my_readiness(&user, &gig_id, update),
    )
    .await
    .map(Json)
}

async fn list_gig_readiness(
    State(ctx): State<Arc<AppContext>>,
    CurrentUser(user): CurrentUser,
    Path(gig_id): Path<String>,
) -> ApiResult<Json<Vec<ReadinessReport>>> {
    execute_command(
        "readiness::list_gig_readiness",
        ctx.readiness.list_gig_readiness(&user, &gig_id),
    )
    .await
    .map(Json)
}

async fn list_activity(
    State(ctx): State<Arc<AppContext>>,
    CurrentUser(user): CurrentUser,
    Path(gig_id): Path<String>,
    Query(query): Query<LimitQuery>,
) -> ApiResult<Json<Vec<ActivityEntry>>> {
    execute_command("activity::list_activity", ctx.activity.list_activity(&user, &gig_id, query.limit))
        .await
        .map(Json)
}
