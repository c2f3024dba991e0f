//! HTTP error mapping

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use encore_domain::EncoreError;
use serde::Serialize;
use tracing::error;

use crate::utils::logging::error_label;

pub type ApiResult<T> = Result<T, ApiError>;

/// Domain error rendered as `{"error": message, "code": label}`.
#[derive(Debug)]
pub struct ApiError(pub EncoreError);

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    code: &'static str,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            EncoreError::NotFound(_) => StatusCode::NOT_FOUND,
            EncoreError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            EncoreError::PermissionDenied(_) => StatusCode::FORBIDDEN,
            EncoreError::Auth(_) | EncoreError::TokenRevoked(_) => StatusCode::UNAUTHORIZED,
            EncoreError::Conflict(_) => StatusCode::CONFLICT,
            EncoreError::Network(_) | EncoreError::Provider(_) => StatusCode::BAD_GATEWAY,
            EncoreError::Database(_)
            | EncoreError::Config(_)
            | EncoreError::Storage(_)
            | EncoreError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<EncoreError> for ApiError {
    fn from(err: EncoreError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(status = status.as_u16(), error = %self.0, "request failed");
        }
        let body = ErrorBody { error: self.0.message(), code: error_label(&self.0) };
        (status, Json(body)).into_response()
    }
}
