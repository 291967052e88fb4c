use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
};
use tracing::warn;

use crate::auth::claims::Claims;
use crate::error::ApiError;
use crate::state::AppState;

/// Extracts and validates the bearer token, exposing its claims.
#[derive(Debug)]
pub struct CurrentUser(pub Claims);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| ApiError::unauthorized("missing Authorization header"))?;

        // Expect "Bearer <token>"
        let token = auth
            .strip_prefix("Bearer ")
            .or_else(|| auth.strip_prefix("bearer "))
            .ok_or_else(|| ApiError::unauthorized("invalid auth scheme"))?;

        let claims = state.jwt.verify(token).map_err(|_| {
            warn!("invalid or expired token");
            ApiError::unauthorized("invalid or expired token")
        })?;

        Ok(CurrentUser(claims))
    }
}
