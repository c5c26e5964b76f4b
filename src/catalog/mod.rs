use crate::state::AppState;
use axum::Router;

pub mod dto;
pub mod handlers;
pub mod normalize;
pub mod repo;

pub fn router() -> Router<AppState> {
    handlers::router()
}
