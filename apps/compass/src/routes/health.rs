use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /
/// Service banner listing the public endpoints.
pub async fn index_handler() -> Json<Value> {
    Json(json!({
        "message": "Welcome to Career Compass API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "sessions": "/api/v1/sessions",
            "analyze_files": "/api/v1/sessions/:id/analyze/files",
            "analyze_text": "/api/v1/sessions/:id/analyze/text",
            "health": "/health"
        }
    }))
}

/// GET /health
/// Returns a simple status object with service version.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "career-compass",
        "analysis_service": state.config.analysis_service_url,
        "active_sessions": state.sessions.len().await
    }))
}
