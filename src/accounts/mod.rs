use crate::state::AppState;
use axum::Router;

pub mod dto;
pub mod errors;
pub mod handlers;
pub mod password;
pub mod repo;
pub mod repo_types;
pub mod services;
pub mod tokens;
pub mod validation;
#[cfg(test)]
pub(crate) mod memory;

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::account_routes())
}
