//! Gig pack routes: setlist, schedule, contacts and the setlist PDF upload.

mod support;

use axum::http::{Method, StatusCode};
use serde_json::json;
use support::setup_app;

const OWNER: &str = "owner-1";

#[tokio::test]
async fn setlist_is_renumbered_in_request_order() {
    let app = setup_app().await;
    let gig_id = app.create_gig(OWNER, "Jazz Brunch").await;

    let (status, body) = app
        .send(
            Method::PUT,
            &format!("/gigs/{gig_id}/setlist"),
            Some(OWNER),
            Some(json!([
                { "title": "So What", "songKey": "Dm" },
                { "title": "Blue in Green" },
                { "title": "Freddie Freeloader", "bpm": 132 },
            ])),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let positions: Vec<u64> =
        body.as_array().unwrap().iter().map(|item| item["position"].as_u64().unwrap()).collect();
    assert_eq!(positions, vec![1, 2, 3]);

    let (status, body) = app
        .send(
            Method::PUT,
            &format!("/gigs/{gig_id}/setlist"),
            Some(OWNER),
            Some(json!([{ "title": "All Blues" }])),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().map(Vec::len), Some(1));

    let (_, pack) = app.send(Method::GET, &format!("/gigs/{gig_id}/pack"), Some(OWNER), None).await;
    let setlist = pack["setlist"].as_array().unwrap();
    assert_eq!(setlist.len(), 1);
    assert_eq!(setlist[0]["title"], "All Blues");
    assert_eq!(setlist[0]["position"], 1);
}

#[tokio::test]
async fn setlist_entry_without_title_is_rejected() {
    let app = setup_app().await;
    let gig_id = app.create_gig(OWNER, "Jazz Brunch").await;

    let (status, body) = app
        .send(
            Method::PUT,
            &format!("/gigs/{gig_id}/setlist"),
            Some(OWNER),
            Some(json!([{ "title": "Take Five" }, { "title": "" }])),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_input");
}

#[tokio::test]
async fn pack_collects_schedule_and_contacts() {
    let app = setup_app().await;
    let gig_id = app.create_gig(OWNER, "Theatre Run").await;

    let (status, item) = app
        .send(
            Method::POST,
            &format!("/gigs/{gig_id}/schedule"),
            Some(OWNER),
            Some(json!({ "time": "18:30:00", "label": "Soundcheck" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let item_id = item["id"].as_str().unwrap().to_string();

    let (status, _) = app
        .send(
            Method::POST,
            &format!("/gigs/{gig_id}/contacts"),
            Some(OWNER),
            Some(json!({ "name": "Alex", "role": "Venue manager", "phone": "555-0100" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, pack) =
        app.send(Method::GET, &format!("/gigs/{gig_id}/pack"), Some(OWNER), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(pack["gig"]["id"], gig_id.as_str());
    assert_eq!(pack["schedule"][0]["label"], "Soundcheck");
    assert_eq!(pack["contacts"][0]["name"], "Alex");

    let (status, _) = app
        .send(Method::DELETE, &format!("/gigs/{gig_id}/schedule/{item_id}"), Some(OWNER), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, pack) = app.send(Method::GET, &format!("/gigs/{gig_id}/pack"), Some(OWNER), None).await;
    assert_eq!(pack["schedule"].as_array().map(Vec::len), Some(0));
}

#[tokio::test]
async fn setlist_pdf_upload_is_stored_as_material() {
    let app = setup_app().await;
    let gig_id = app.create_gig(OWNER, "Recital").await;

    let (status, material) = app
        .send_bytes(
            &format!("/gigs/{gig_id}/setlist/pdf?filename=recital.pdf"),
            OWNER,
            "application/pdf",
            b"%PDF-1.7\n%fake but well-formed enough\n".to_vec(),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "upload failed: {material}");
    assert_eq!(material["kind"], "setlist_pdf");
    assert_eq!(material["label"], "recital.pdf");

    let storage_path = material["storagePath"].as_str().unwrap();
    assert!(storage_path.starts_with(&format!("{gig_id}/setlist-")));
    assert!(app.ctx.storage.root().join(storage_path).exists());

    let (_, pack) = app.send(Method::GET, &format!("/gigs/{gig_id}/pack"), Some(OWNER), None).await;
    assert_eq!(pack["materials"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn setlist_upload_rejects_non_pdf_content() {
    let app = setup_app().await;
    let gig_id = app.create_gig(OWNER, "Recital").await;
    let uri = format!("/gigs/{gig_id}/setlist/pdf");

    let (status, body) = app.send_bytes(&uri, OWNER, "image/png", b"%PDF-1.7".to_vec()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_input");

    let (status, _) =
        app.send_bytes(&uri, OWNER, "application/pdf", b"PK\x03\x04zip".to_vec()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, pack) = app.send(Method::GET, &format!("/gigs/{gig_id}/pack"), Some(OWNER), None).await;
    assert_eq!(pack["materials"].as_array().map(Vec::len), Some(0));
}

#[tokio::test]
async fn only_owner_uploads_setlist() {
    let app = setup_app().await;
    let gig_id = app.create_gig(OWNER, "Recital").await;

    let (status, _) = app
        .send_bytes(
            &format!("/gigs/{gig_id}/setlist/pdf"),
            "someone-else",
            "application/pdf",
            b"%PDF-1.7".to_vec(),
        )
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}
