use crate::state::AppState;
use axum::Router;

mod dto;
pub mod handlers;
pub mod llm;
mod parse;
mod prompts;
pub mod services;

pub use llm::AnthropicClient;
pub use services::Solver;

#[cfg(test)]
pub(crate) use services::fakes;

pub fn router() -> Router<AppState> {
    handlers::solver_routes()
}
