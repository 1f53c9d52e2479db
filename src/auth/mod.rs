use crate::state::AppState;
use axum::Router;

mod dto;
pub mod extractors;
pub mod handlers;
pub mod services;

pub use extractors::CurrentSession;

pub fn router() -> Router<AppState> {
    handlers::auth_routes()
}
