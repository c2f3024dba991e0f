//! Health check endpoint for load balancers and monitoring

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};

use crate::context::AppContext;
use crate::utils::health::HealthStatus;

pub fn routes() -> Router<Arc<AppContext>> {
    Router::new().route("/health", get(get_health))
}

/// Returns 503 when the overall score falls below the healthy threshold.
///
/// # Example Response
/// ```json
/// {
///   "isHealthy": true,
///   "score": 1.0,
///   "message": null,
///   "components": [
///     { "name": "database", "isHealthy": true, "message": null },
///     { "name": "calendar", "isHealthy": true, "message": "not configured" }
///   ],
///   "timestamp": 1760572800
/// }
/// ```
async fn get_health(State(ctx): State<Arc<AppContext>>) -> (StatusCode, Json<HealthStatus>) {
    let health = ctx.health_check().await;
    let status = if health.is_healthy { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status, Json(health))
}
