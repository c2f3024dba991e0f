//! Dashboard commands

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use encore_domain::{DashboardGig, PastGigsPage};
use serde::Deserialize;

use crate::context::AppContext;
use crate::error::ApiResult;
use crate::extract::CurrentUser;
use crate::utils::command_helpers::execute_command;

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

pub fn routes() -> Router<Arc<AppContext>> {
    Router::new()
        .route("/dashboard", get(list_dashboard_gigs))
        .route("/dashboard/past", get(list_past_gigs))
}

async fn list_dashboard_gigs(
    State(ctx): State<Arc<AppContext>>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<Vec<DashboardGig>>> {
    execute_command("dashboard::list_dashboard_gigs", ctx.dashboard.list_dashboard_gigs(&user))
        .await
        .map(Json)
}

async fn list_past_gigs(
    State(ctx): State<Arc<AppContext>>,
    CurrentUser(user): CurrentUser,
    Query(page): Query<PageQuery>,
) -> ApiResult<Json<PastGigsPage>> {
    execute_command(
        "dashboard::list_past_gigs",
        ctx.dashboard.list_past_gigs(&user, page.limit, page.offset),
    )
    .await
    .map(Json)
}
