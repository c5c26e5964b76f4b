use crate::state::AppState;
use axum::Router;

mod dto;
pub mod handlers;
pub mod password;
pub mod session;
pub(crate) mod validate;

pub fn router() -> Router<AppState> {
    handlers::auth_routes()
}
