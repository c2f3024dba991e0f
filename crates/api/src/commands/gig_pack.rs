//! Gig pack commands: schedule, setlist, materials, contacts and the
//! setlist PDF upload.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, Path, Query, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use encore_domain::constants::SETLIST_PDF_MAX_BYTES;
use encore_domain::{
    GigContact, GigMaterial, GigPack, NewContact, NewMaterial, NewScheduleItem, ScheduleItem,
    SetlistEntry, SetlistItem,
};
use serde::Deserialize;

use crate::context::AppContext;
use crate::error::ApiResult;
use crate::extract::CurrentUser;
use crate::utils::command_helpers::execute_command;

/// Headroom over the PDF cap so oversized files reach validation instead of
/// being cut off by the transport limit.
const UPLOAD_BODY_LIMIT: usize = SETLIST_PDF_MAX_BYTES + 1024 * 1024;

#[derive(Debug, Default, Deserialize)]
pub struct UploadQuery {
    pub filename: Option<String>,
}

pub fn routes() -> Router<Arc<AppContext>> {
    Router::new()
        .route("/gigs/{gig_id}/pack", get(get_gig_pack))
        .route("/gigs/{gig_id}/setlist", put(replace_setlist))
        .route(
            "/gigs/{gig_id}/setlist/pdf",
            post(upload_setlist_pdf).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route("/gigs/{gig_id}/schedule", post(add_schedule_item))
        .route("/gigs/{gig_id}/schedule/{item_id}", delete(remove_schedule_item))
        .route("/gigs/{gig_id}/contacts", post(add_contact))
        .route("/gigs/{gig_id}/contacts/{contact_id}", delete(remove_contact))
        .route("/gigs/{gig_id}/materials", post(add_material))
        .route("/gigs/{gig_id}/materials/{material_id}", delete(remove_material))
}

async fn get_gig_pack(
    State(ctx): State<Arc<AppContext>>,
    CurrentUser(user): CurrentUser,
    Path(gig_id): Path<String>,
) -> ApiResult<Json<GigPack>> {
    execute_command("gig_pack::get_gig_pack", ctx.gig_pack.get_gig_pack(&user, &gig_id))
        .await
        .map(Json)
}

async fn replace_setlist(
    State(ctx): State<Arc<AppContext>>,
    CurrentUser(user): CurrentUser,
    Path(gig_id): Path<String>,
    Json(entries): Json<Vec<SetlistEntry>>,
) -> ApiResult<Json<Vec<SetlistItem>>> {
    execute_command(
        "gig_pack::replace_setlist",
        ctx.gig_pack.replace_setlist(&user, &gig_id, entries),
    )
    .await
    .map(Json)
}

async fn upload_setlist_pdf(
    State(ctx): State<Arc<AppContext>>,
    CurrentUser(user): CurrentUser,
    Path(gig_id): Path<String>,
    Query(query): Query<UploadQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<GigMaterial>)> {
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let filename = query.filename.unwrap_or_else(|| "setlist.pdf".to_string());

    let material = execute_command(
        "gig_pack::upload_setlist_pdf",
        ctx.gig_pack.upload_setlist_pdf(&user, &gig_id, &filename, &content_type, body.to_vec()),
    )
    .await?;
    Ok((StatusCode::CREATED, Json(material)))
}

async fn add_schedule_item(
    State(ctx): State<Arc<AppContext>>,
    CurrentUser(user): CurrentUser,
    Path(gig_id): Path<String>,
    Json(input): Json<NewScheduleItem>,
) -> ApiResult<(StatusCode, Json<ScheduleItem>)> {
    let item = execute_command(
        "gig_pack::add_schedule_item",
        ctx.gig_pack.add_schedule_item(&user, &gig_id, input),
    )
    .await?;
    Ok((StatusCode::CREATED, Json(item)))
}

async fn remove_schedule_item(
    State(ctx): State<Arc<AppContext>>,
    CurrentUser(user): CurrentUser,
    Path((gig_id, item_id)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    execute_command(
        "gig_pack::remove_schedule_item",
        ctx.gig_pack.remove_schedule_item(&user, &gig_id, &item_id),
    )
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn add_contact(
    State(ctx): State<Arc<AppContext>>,
    CurrentUser(user): CurrentUser,
    Path(gig_id): Path<String>,
    Json(input): Json<NewContact>,
) -> ApiResult<(StatusCode, Json<GigContact>)> {
    let contact =
        execute_command("gig_pack::add_contact", ctx.gig_pack.add_contact(&user, &gig_id, input))
            .await?;
    Ok((StatusCode::CREATED, Json(contact)))
}

async fn remove_contact(
    State(ctx): State<Arc<AppContext>>,
    CurrentUser(user): CurrentUser,
    Path((gig_id, contact_id)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    execute_command(
        "gig_pack::remove_contact",
        ctx.gig_pack.remove_contact(&user, &gig_id, &contact_id),
    )
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn add_material(
    State(ctx): State<Arc<AppContext>>,
    CurrentUser(user): CurrentUser,
    Path(gig_id): Path<String>,
    Json(input): Json<NewMaterial>,
) -> ApiResult<(StatusCode, Json<GigMaterial>)> {
    let material =
        execute_command("gig_pack::add_material", ctx.gig_pack.add_material(&user, &gig_id, input))
            .await?;
    Ok((StatusCode::CREATED, Json(material)))
}

async fn remove_material(
    State(ctx): State<Arc<AppContext>>,
    CurrentUser(user): CurrentUser,
    Path((gig_id, material_id)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    execute_command(
        "gig_pack::remove_material",
        ctx.gig_pack.remove_material(&user, &gig_id, &material_id),
    )
    .await?;
    Ok(StatusCode::NO_CONTENT)
}
