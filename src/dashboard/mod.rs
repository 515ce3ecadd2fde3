use crate::state::AppState;
use axum::Router;

pub mod clock;
pub mod error;
pub mod handlers;
pub mod profile;
pub mod repo;
pub mod repo_types;
pub mod surveillance;
pub mod view;

pub fn router() -> Router<AppState> {
    handlers::dashboard_routes()
}
