//! Notification commands

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use encore_domain::Notification;
use serde::{Deserialize, Serialize};

use crate::context::AppContext;
use crate::error::ApiResult;
use crate::extract::CurrentUser;
use crate::utils::command_helpers::execute_command;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NotificationQuery {
    pub unread_only: bool,
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct CountResponse {
    pub count: u32,
}

pub fn routes() -> Router<Arc<AppContext>> {
    Router::new()
        .route("/notifications", get(list_notifications))
        .route("/notifications/unread-count", get(unread_count))
        .route("/notifications/read-all", post(mark_all_read))
        .route("/notifications/{notification_id}/read", post(mark_read))
}

async fn list_notifications(
    State(ctx): State<Arc<AppContext>>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<NotificationQuery>,
) -> ApiResult<Json<Vec<Notification>>> {
    execute_command(
        "notifications::list",
        ctx.notifications.list(&user, query.unread_only, query.limit),
    )
    .await
    .map(Json)
}

async fn unread_count(
    State(ctx): State<Arc<AppContext>>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<CountResponse>> {
    let count =
        execute_command("notifications::unread_count", ctx.notifications.unread_count(&user))
            .await?;
    Ok(Json(CountResponse { count }))
}

async fn mark_read(
    State(ctx): State<Arc<AppContext>>,
    CurrentUser(user): CurrentUser,
    Path(notification_id): Path<String>,
) -> ApiResult<StatusCode> {
    execute_command(
        "notifications::mark_read",
        ctx.notifications.mark_read(&user, &notification_id),
    )
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn mark_all_read(
    State(ctx): State<Arc<AppContext>>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<CountResponse>> {
    let count =
        execute_command("notifications::mark_all_read", ctx.notifications.mark_all_read(&user))
            .await?;
    Ok(Json(CountResponse { count }))
}
