//! Calendar routes, with Google either unconfigured or stood in for by a
//! mock server.

mod support;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use encore_domain::GoogleCalendarConfig;
use serde_json::{json, Value};
use support::{setup_app, setup_app_with_google, TestApp};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const USER: &str = "leader-1";

fn google_config(server: &MockServer) -> GoogleCalendarConfig {
    GoogleCalendarConfig {
        client_id: "encore-test-client".to_string(),
        client_secret: Some("encore-test-secret".to_string()),
        token_url: format!("{}/token", server.uri()),
        api_base_url: format!("{}/calendar/v3", server.uri()),
        ..GoogleCalendarConfig::default()
    }
}

fn id_token(email: &str) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256"}"#);
    let payload = URL_SAFE_NO_PAD.encode(json!({ "email": email, "sub": "42" }).to_string());
    format!("{header}.{payload}.signature")
}

fn google_event() -> Value {
    json!({
        "id": "evt-1",
        "summary": "Jazz at the Lake",
        "location": "Lakeside Pavilion",
        "status": "confirmed",
        "start": { "dateTime": "2030-06-01T19:00:00Z" },
        "end": { "dateTime": "2030-06-01T22:00:00Z" },
    })
}

async fn mount_token_endpoint(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "access-1",
            "refresh_token": "refresh-1",
            "expires_in": 3600,
            "token_type": "Bearer",
            "id_token": id_token("leader@example.com"),
        })))
        .mount(server)
        .await;
}

/// Run the consent round trip and return the connection status body.
async fn connect(app: &TestApp) -> Value {
    let (status, started) = app.send(Method::POST, "/calendar/connect", Some(USER), None).await;
    assert_eq!(status, StatusCode::OK, "connect failed: {started}");
    let state = started["state"].as_str().unwrap().to_string();
    assert!(started["url"].as_str().unwrap().contains(&state));

    let (status, connected) = app
        .send(Method::GET, &format!("/calendar/oauth/callback?code=auth-code&state={state}"), None, None)
        .await;
    assert_eq!(status, StatusCode::OK, "callback failed: {connected}");
    connected
}

#[tokio::test]
async fn unconfigured_calendar_reports_disconnected() {
    let app = setup_app().await;

    let (status, body) = app.send(Method::GET, "/calendar/status", Some(USER), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["connected"], false);

    let (status, body) = app.send(Method::POST, "/calendar/connect", Some(USER), None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["code"], "config");
}

#[tokio::test]
async fn callback_with_unknown_state_is_rejected() {
    let app = setup_app().await;

    let (status, body) = app
        .send(Method::GET, "/calendar/oauth/callback?code=abc&state=never-issued", None, None)
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "auth");
}

#[tokio::test]
async fn callback_reports_denied_consent() {
    let app = setup_app().await;

    let (status, _) =
        app.send(Method::GET, "/calendar/oauth/callback?error=access_denied", None, None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn webhook_requires_channel_header() {
    let app = setup_app().await;

    let (status, body) = app.send(Method::POST, "/webhooks/google-calendar", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_input");

    let request = Request::builder()
        .method(Method::POST)
        .uri("/webhooks/google-calendar")
        .header("x-goog-channel-id", "unknown-channel")
        .header("x-goog-resource-id", "resource-1")
        .header("x-goog-resource-state", "exists")
        .body(Body::empty())
        .unwrap();
    let (status, _) = app.dispatch(request).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn import_window_must_not_be_empty() {
    let app = setup_app().await;

    let (status, _) = app
        .send(
            Method::GET,
            "/calendar/events?from=2030-06-02T00:00:00Z&to=2030-06-01T00:00:00Z",
            Some(USER),
            None,
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn listing_without_connection_is_not_found() {
    let server = MockServer::start().await;
    let app = setup_app_with_google(google_config(&server)).await;

    let (status, body) = app.send(Method::GET, "/calendar/events", Some(USER), None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");
}

#[tokio::test]
async fn oauth_state_is_single_use() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;
    let app = setup_app_with_google(google_config(&server)).await;

    let (_, started) = app.send(Method::POST, "/calendar/connect", Some(USER), None).await;
    let callback = format!("/calendar/oauth/callback?code=auth-code&state={}", started["state"].as_str().unwrap());

    let (first, _) = app.send(Method::GET, &callback, None, None).await;
    let (second, _) = app.send(Method::GET, &callback, None, None).await;

    assert_eq!(first, StatusCode::OK);
    assert_eq!(second, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn connect_list_and_import_event() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;
    Mock::given(method("GET"))
        .and(path("/calendar/v3/calendars/primary/events"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "items": [google_event()] })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/calendar/v3/calendars/primary/events/evt-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(google_event()))
        .mount(&server)
        .await;
    let app = setup_app_with_google(google_config(&server)).await;

    let connected = connect(&app).await;
    assert_eq!(connected["connected"], true);
    assert_eq!(connected["email"], "leader@example.com");

    let (_, status) = app.send(Method::GET, "/calendar/status", Some(USER), None).await;
    assert_eq!(status["connected"], true);
    assert_eq!(status["syncEnabled"], true);

    let window = "from=2030-05-01T00:00:00Z&to=2030-07-01T00:00:00Z";
    let (status, events) =
        app.send(Method::GET, &format!("/calendar/events?{window}"), Some(USER), None).await;
    assert_eq!(status, StatusCode::OK, "listing failed: {events}");
    assert_eq!(events[0]["event"]["id"], "evt-1");
    assert_eq!(events[0]["alreadyImported"], false);

    let (status, first) =
        app.send(Method::POST, "/calendar/events/evt-1/import", Some(USER), None).await;
    assert_eq!(status, StatusCode::CREATED, "import failed: {first}");
    assert_eq!(first["created"], true);
    let gig_id = first["gigId"].as_str().unwrap().to_string();

    let (status, again) =
        app.send(Method::POST, "/calendar/events/evt-1/import", Some(USER), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(again["created"], false);
    assert_eq!(again["gigId"], gig_id.as_str());

    let (_, gig) = app.send(Method::GET, &format!("/gigs/{gig_id}"), Some(USER), None).await;
    assert_eq!(gig["gig"]["title"], "Jazz at the Lake");
    assert_eq!(gig["gig"]["externalCalendarEventId"], "evt-1");
    assert_eq!(gig["isOwner"], true);

    let (_, events) =
        app.send(Method::GET, &format!("/calendar/events?{window}"), Some(USER), None).await;
    assert_eq!(events[0]["alreadyImported"], true);
    assert_eq!(events[0]["existingGigId"], gig_id.as_str());

    let (status, log) = app.send(Method::GET, "/calendar/sync-log", Some(USER), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(log.as_array().unwrap().len() >= 2);

    let (status, body) = app.send(Method::DELETE, "/calendar/connection", Some(USER), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["disconnected"], true);
    let (_, status) = app.send(Method::GET, "/calendar/status", Some(USER), None).await;
    assert_eq!(status["connected"], false);
}
