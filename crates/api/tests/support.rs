#![allow(dead_code)]

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use encore_api::{router, AppContext, USER_ID_HEADER};
use encore_common::testing::TempDir;
use encore_domain::{Config, GoogleCalendarConfig};
use serde_json::Value;
use tower::ServiceExt;

/// Router plus the state it runs against.
pub struct TestApp {
    pub router: Router,
    pub ctx: Arc<AppContext>,
    /// Keep the temporary directory alive for the lifetime of the app.
    _temp_dir: TempDir,
}

/// App with Google Calendar left unconfigured.
pub async fn setup_app() -> TestApp {
    setup_app_with_google(GoogleCalendarConfig::default()).await
}

/// App with a fresh database and storage root.
pub async fn setup_app_with_google(google: GoogleCalendarConfig) -> TestApp {
    let temp_dir = TempDir::new("encore-api-tests").expect("failed to create temporary directory");

    let mut config = Config::default();
    config.database.path = temp_dir.path().join("encore.db").to_string_lossy().into_owned();
    config.database.pool_size = 4;
    config.storage.root_dir = temp_dir.path().join("uploads").to_string_lossy().into_owned();
    config.scheduler.enabled = false;
    config.google = google;

    let ctx = Arc::new(AppContext::new(config).await.expect("failed to build app context"));
    TestApp { router: router(Arc::clone(&ctx)), ctx, _temp_dir: temp_dir }
}

impl TestApp {
    /// Send a JSON request, returning the status and parsed body (`Null`
    /// when the body is empty).
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        user: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user) = user {
            builder = builder.header(USER_ID_HEADER, user);
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .expect("valid request"),
            None => builder.body(Body::empty()).expect("valid request"),
        };
        self.dispatch(request).await
    }

    /// Send raw bytes with an explicit content type.
    pub async fn send_bytes(
        &self,
        uri: &str,
        user: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(USER_ID_HEADER, user)
            .header(header::CONTENT_TYPE, content_type)
            .body(Body::from(bytes))
            .expect("valid request");
        self.dispatch(request).await
    }

    pub async fn dispatch(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response =
            self.router.clone().oneshot(request).await.expect("router is infallible");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("readable body");
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("response body is JSON")
        };
        (status, json)
    }

    /// Create a gig a month from now and return its id.
    pub async fn create_gig(&self, owner: &str, title: &str) -> String {
        let date = (chrono::Utc::now() + chrono::Duration::days(30)).date_naive();
        let (status, body) = self
            .send(
                Method::POST,
                "/gigs",
                Some(owner),
                Some(serde_json::json!({
                    "title": title,
                    "date": date,
                    "startTime": "20:00:00",
                    "endTime": "23:00:00",
                    "locationName": "The Blue Room",
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create gig failed: {body}");
        body["id"].as_str().expect("gig id").to_string()
    }
}
