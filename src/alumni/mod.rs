use axum::{
    routing::{get, put},
    Router,
};

use crate::state::AppState;

pub mod dto;
pub mod handlers;
pub mod repo;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/alumni", get(handlers::list_directory))
        // literal segment, must not be captured by /alumni/:id
        .route("/alumni/profile", put(handlers::update_profile))
        .route("/alumni/:id", get(handlers::get_alumni))
}
