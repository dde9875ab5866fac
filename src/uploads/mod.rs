use axum::{extract::DefaultBodyLimit, routing::post, Router};

use crate::state::AppState;

pub mod handlers;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/upload/avatar", post(handlers::upload_avatar))
        .layer(DefaultBodyLimit::max(2 * 1024 * 1024)) // 2MB
}
