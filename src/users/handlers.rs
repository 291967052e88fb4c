use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use crate::auth::{Claims, CurrentUser};
use crate::error::ApiError;
use crate::state::AppState;
use crate::users::dto::{
    CreateUserRequest, LoginRequest, LoginResponse, UpdateUserRequest, UserResponse,
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(create_user))
        .route("/users/login", post(login))
        .route("/users/validate", get(validate))
        .route(
            "/users/profile",
            get(profile).put(update_profile).delete(delete_profile),
        )
}

#[instrument(skip(state, payload))]
async fn create_user(
    State(state): State<AppState>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let user = state.users.create(payload, None).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

#[instrument(skip(state, payload))]
async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let login = state.users.login(payload).await?;
    Ok(Json(login))
}

/// Echoes the verified claims; reaching here at all means the token is good.
#[instrument(skip_all)]
async fn validate(CurrentUser(claims): CurrentUser) -> Json<Claims> {
    Json(claims)
}

#[instrument(skip_all)]
async fn profile(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state.users.resolve_by_username(&claims.username).await?;
    Ok(Json(user))
}

#[instrument(skip_all)]
async fn update_profile(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state.users.update(&claims.username, payload).await?;
    Ok(Json(user))
}

#[instrument(skip_all)]
async fn delete_profile(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state.users.delete(&claims.username, claims.sub).await?;
    Ok(Json(user))
}
