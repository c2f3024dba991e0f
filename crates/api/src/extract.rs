//! Request extractors

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use encore_domain::EncoreError;

use crate::error::ApiError;

/// Header carrying the authenticated user id, set by the fronting gateway.
pub const USER_ID_HEADER: &str = "x-user-id";

/// The acting user's id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser(pub String);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| ApiError(EncoreError::Auth("Missing x-user-id header".into())))?;
        Ok(Self(user_id.to_string()))
    }
}
