pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::state::AppState;
use crate::workflow::handlers;

/// Upload cap for the two résumé/JD files together.
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health::index_handler))
        .route("/health", get(health::health_handler))
        .route("/api/v1/sessions", post(handlers::handle_create_session))
        .route(
            "/api/v1/sessions/:id",
            get(handlers::handle_get_session).delete(handlers::handle_delete_session),
        )
        .route(
            "/api/v1/sessions/:id/method",
            post(handlers::handle_select_method).delete(handlers::handle_choose_different_method),
        )
        .route(
            "/api/v1/sessions/:id/analyze/text",
            post(handlers::handle_analyze_text),
        )
        .route(
            "/api/v1/sessions/:id/analyze/files",
            post(handlers::handle_analyze_files).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .with_state(state)
}
