//! Band and profile commands

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, patch};
use axum::{Json, Router};
use encore_domain::{Band, BandInput, Profile, ProfileUpdate};

use crate::context::AppContext;
use crate::error::ApiResult;
use crate::extract::CurrentUser;
use crate::utils::command_helpers::execute_command;

pub fn routes() -> Router<Arc<AppContext>> {
    Router::new()
        .route("/bands", get(list_bands).post(create_band))
        .route("/bands/{band_id}", patch(update_band).delete(delete_band))
        .route("/me/profile", get(get_profile).put(upsert_profile))
}

async fn list_bands(
    State(ctx): State<Arc<AppContext>>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<Vec<Band>>> {
    execute_command("bands::list_bands", ctx.bands.list_bands(&user)).await.map(Json)
}

async fn create_band(
    State(ctx): State<Arc<AppContext>>,
    CurrentUser(user): CurrentUser,
    Json(input): Json<BandInput>,
) -> ApiResult<(StatusCode, Json<Band>)> {
    let band = execute_command("bands::create_band", ctx.bands.create_band(&user, input)).await?;
    Ok((StatusCode::CREATED, Json(band)))
}

async fn update_band(
    State(ctx): State<Arc<AppContext>>,
    CurrentUser(user): CurrentUser,
    Path(band_id): Path<String>,
    Json(input): Json<BandInput>,
) -> ApiResult<Json<Band>> {
    execute_command("bands::update_band", ctx.bands.update_band(&user, &band_id, input))
        .await
        .map(Json)
}

async fn delete_band(
    State(ctx): State<Arc<AppContext>>,
    CurrentUser(user): CurrentUser,
    Path(band_id): Path<String>,
) -> ApiResult<StatusCode> {
    execute_command("bands::delete_band", ctx.bands.delete_band(&user, &band_id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn get_profile(
    State(ctx): State<Arc<AppContext>>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<Profile>> {
    execute_command("profiles::get_profile", ctx.profiles.get_profile(&user)).await.map(Json)
}

async fn upsert_profile(
    State(ctx): State<Arc<AppContext>>,
    CurrentUser(user): CurrentUser,
    Json(update): Json<ProfileUpdate>,
) -> ApiResult<Json<Profile>> {
    execute_command("profiles::upsert_profile", ctx.profiles.upsert_profile(&user, update))
        .await
        .map(Json)
}
