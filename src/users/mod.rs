use crate::state::AppState;
use axum::Router;

pub mod dto;
pub mod handlers;
mod model;
pub mod repo;
pub mod services;

pub fn router() -> Router<AppState> {
    handlers::user_routes()
}
