use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::state::AppState;

pub mod handlers;

/// Admin console routes. Every handler takes the [`AdminAccount`]
/// extractor, so authentication and the role gate run before any of them.
///
/// [`AdminAccount`]: crate::auth::extractors::AdminAccount
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/admin/unverified", get(handlers::list_unverified))
        .route("/admin/verify/:id", post(handlers::verify_account))
        .route("/admin/premium", get(handlers::list_premium))
        .route("/admin/users/:id", delete(handlers::delete_account))
}
