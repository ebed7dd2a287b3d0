use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartError, Multipart, Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::analysis::{AnalysisInput, InputMethod, UploadedFile};
use crate::report::{build_report, AnalysisReport};
use crate::state::AppState;
use crate::workflow::machine::WorkflowState;
use crate::workflow::orchestrator;
use crate::workflow::session::Session;

#[derive(Deserialize)]
pub struct SelectMethodRequest {
    pub method: InputMethod,
}

#[derive(Deserialize)]
pub struct AnalyzeTextBody {
    #[serde(default)]
    pub resume_text: String,
    #[serde(default)]
    pub job_description: String,
}

/// What a client needs to render the current screen.
#[derive(Debug, Serialize)]
pub struct SessionView {
    pub session_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub status: &'static str,
    pub method: Option<InputMethod>,
    pub can_submit: bool,
    pub error: Option<String>,
    pub report: Option<AnalysisReport>,
}

async fn render_view(session: &Session) -> SessionView {
    let workflow = session.workflow.lock().await;
    let state = workflow.state();

    let (error, report) = match state {
        WorkflowState::Failed { message, .. } => (Some(message.clone()), None),
        WorkflowState::Succeeded { result, .. } => (None, Some(build_report(result))),
        _ => (None, None),
    };

    SessionView {
        session_id: session.id,
        created_at: session.created_at,
        updated_at: workflow.updated_at(),
        status: state.name(),
        method: state.method(),
        can_submit: workflow.can_submit(),
        error,
        report,
    }
}

async fn find_session(state: &AppState, id: Uuid) -> Result<Arc<Session>, AppError> {
    state
        .sessions
        .get(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Session {id} not found")))
}

/// POST /api/v1/sessions
pub async fn handle_create_session(
    State(state): State<AppState>,
) -> (StatusCode, Json<SessionView>) {
    let session = state.sessions.create().await;
    (StatusCode::CREATED, Json(render_view(&session).await))
}

/// GET /api/v1/sessions/:id
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let session = find_session(&state, id).await?;
    Ok(Json(render_view(&session).await))
}

/// DELETE /api/v1/sessions/:id
pub async fn handle_delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if state.sessions.remove(id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("Session {id} not found")))
    }
}

/// POST /api/v1/sessions/:id/method
pub async fn handle_select_method(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<SelectMethodRequest>,
) -> Result<Json<SessionView>, AppError> {
    let session = find_session(&state, id).await?;
    orchestrator::select_method(&session, req.method).await?;
    Ok(Json(render_view(&session).await))
}

/// DELETE /api/v1/sessions/:id/method
pub async fn handle_choose_different_method(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let session = find_session(&state, id).await?;
    orchestrator::choose_different_method(&session).await?;
    Ok(Json(render_view(&session).await))
}

/// POST /api/v1/sessions/:id/analyze/text
pub async fn handle_analyze_text(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<AnalyzeTextBody>,
) -> Result<Json<SessionView>, AppError> {
    let session = find_session(&state, id).await?;
    let input = AnalysisInput::Text {
        resume: req.resume_text,
        job_description: req.job_description,
    };
    orchestrator::submit(session.clone(), input, Arc::clone(&state.analysis)).await?;
    Ok(Json(render_view(&session).await))
}

/// POST /api/v1/sessions/:id/analyze/files
/// Multipart body with `resume` and `job_description` file parts.
pub async fn handle_analyze_files(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<Json<SessionView>, AppError> {
    let session = find_session(&state, id).await?;

    let mut resume = None;
    let mut job_description = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| upload_error(e, "Malformed multipart body"))?
    {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| upload_error(e, &format!("Failed to read part '{name}'")))?;

        let file = UploadedFile::new(file_name, content_type, bytes);
        match name.as_str() {
            "resume" => resume = Some(file),
            "job_description" => job_description = Some(file),
            other => debug!("Ignoring multipart field '{other}'"),
        }
    }

    let input = AnalysisInput::File {
        resume,
        job_description,
    };
    orchestrator::submit(session.clone(), input, Arc::clone(&state.analysis)).await?;
    Ok(Json(render_view(&session).await))
}

fn upload_error(e: MultipartError, context: &str) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(e.body_text())
    } else {
        AppError::Validation(format!("{context}: {e}"))
    }
}
