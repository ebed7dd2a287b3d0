//! Analysis request orchestration. This is the only writer of a session's workflow.
//!
//! A submit validates and opens the cycle under the session lock. The scoring
//! call and the closing transition then run on a spawned task, with the lock
//! released, and quote the ticket issued when the cycle opened.

use std::sync::Arc;

use thiserror::Error;
use tracing::{error, info, warn};

use crate::analysis_client::{AnalysisFailure, AnalysisService};
use crate::models::analysis::{AnalysisInput, AnalysisResult, InputMethod, UploadedFile};
use crate::workflow::machine::{SubmissionId, TransitionError, WorkflowEvent, WorkflowState};
use crate::workflow::session::Session;

const ACCEPTED_EXTENSIONS: &[&str] = &["pdf", "txt"];

/// Input problems caught before anything is sent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please upload both resume and job description files.")]
    MissingFiles,

    #[error("Please provide both resume and job description text.")]
    MissingText,

    #[error("Please upload only PDF or TXT files.")]
    UnsupportedFileType { file_name: String },
}

/// Checks that both parts are present, non-empty and of an accepted type.
pub fn validate_input(input: &AnalysisInput) -> Result<(), ValidationError> {
    match input {
        AnalysisInput::File {
            resume,
            job_description,
        } => {
            let (Some(resume), Some(job_description)) = (resume, job_description) else {
                return Err(ValidationError::MissingFiles);
            };
            if resume.bytes.is_empty() || job_description.bytes.is_empty() {
                return Err(ValidationError::MissingFiles);
            }
            check_file_type(resume)?;
            check_file_type(job_description)
        }
        AnalysisInput::Text {
            resume,
            job_description,
        } => {
            if resume.trim().is_empty() || job_description.trim().is_empty() {
                Err(ValidationError::MissingText)
            } else {
                Ok(())
            }
        }
    }
}

fn check_file_type(file: &UploadedFile) -> Result<(), ValidationError> {
    match file.extension() {
        Some(ext) if ACCEPTED_EXTENSIONS.contains(&ext.as_str()) => Ok(()),
        _ => Err(ValidationError::UnsupportedFileType {
            file_name: file.file_name.clone(),
        }),
    }
}

pub async fn select_method(
    session: &Session,
    method: InputMethod,
) -> Result<WorkflowState, TransitionError> {
    let mut workflow = session.workflow.lock().await;
    let state = workflow.apply(WorkflowEvent::SelectMethod(method))?.clone();
    info!("Session {} selected {} input", session.id, method.as_str());
    Ok(state)
}

pub async fn choose_different_method(session: &Session) -> Result<WorkflowState, TransitionError> {
    let mut workflow = session.workflow.lock().await;
    let state = workflow.apply(WorkflowEvent::ChooseDifferentMethod)?.clone();
    info!("Session {} reset to method choice", session.id);
    Ok(state)
}

/// Runs one analysis cycle and returns the terminal state it ended in.
///
/// Errors only when the submit itself is not allowed (no method chosen, wrong
/// method, or a cycle already in flight). Validation and service failures end
/// in `Failed` and are returned as `Ok`.
///
/// The call and the closing transition run on their own task, so the session
/// still reaches a terminal state if the caller goes away mid-call.
pub async fn submit(
    session: Arc<Session>,
    input: AnalysisInput,
    service: Arc<dyn AnalysisService>,
) -> Result<WorkflowState, TransitionError> {
    let submission = {
        let mut workflow = session.workflow.lock().await;
        workflow.check_submit(input.method())?;

        if let Err(e) = validate_input(&input) {
            warn!("Session {} rejected input: {e:?}", session.id);
            return Ok(workflow.apply(WorkflowEvent::Reject(e.to_string()))?.clone());
        }

        workflow.begin_submission(input.method())?
    };

    info!(
        "Session {} submission {} sent ({} input)",
        session.id,
        submission.0,
        input.method().as_str()
    );

    let cycle = tokio::spawn(run_submission(
        Arc::clone(&session),
        submission,
        input,
        service,
    ));

    match cycle.await {
        Ok(state) => state,
        Err(e) => {
            error!(
                "Session {} submission {} task aborted: {e}",
                session.id, submission.0
            );
            let mut workflow = session.workflow.lock().await;
            Ok(workflow
                .apply(WorkflowEvent::Fail {
                    submission,
                    message: AnalysisFailure::NoResponse.user_message(),
                })?
                .clone())
        }
    }
}

async fn run_submission(
    session: Arc<Session>,
    submission: SubmissionId,
    input: AnalysisInput,
    service: Arc<dyn AnalysisService>,
) -> Result<WorkflowState, TransitionError> {
    let outcome = service
        .analyze(&input)
        .await
        .and_then(|reply| {
            AnalysisResult::try_from(reply).map_err(|e| AnalysisFailure::ServerError {
                status: 502,
                detail: Some(format!("Invalid analysis result: {e}")),
            })
        });

    let event = match outcome {
        Ok(result) => {
            info!(
                "Session {} submission {} scored {}",
                session.id, submission.0, result.fit_score
            );
            WorkflowEvent::Complete { submission, result }
        }
        Err(failure) => {
            warn!(
                "Session {} submission {} failed: {failure}",
                session.id, submission.0
            );
            WorkflowEvent::Fail {
                submission,
                message: failure.user_message(),
            }
        }
    };

    let mut workflow = session.workflow.lock().await;
    Ok(workflow.apply(event)?.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::analysis::AnalysisReply;
    use async_trait::async_trait;
    use bytes::Bytes;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::Notify;

    /// Scoring stub that returns a canned outcome and counts calls.
    struct StubService {
        outcome: Result<serde_json::Value, AnalysisFailure>,
        calls: AtomicUsize,
        gate: Option<Arc<Notify>>,
    }

    impl StubService {
        fn replying(value: serde_json::Value) -> Self {
            Self {
                outcome: Ok(value),
                calls: AtomicUsize::new(0),
                gate: None,
            }
        }

        fn failing(failure: AnalysisFailure) -> Self {
            Self {
                outcome: Err(failure),
                calls: AtomicUsize::new(0),
                gate: None,
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl AnalysisService for StubService {
        async fn analyze(&self, _input: &AnalysisInput) -> Result<AnalysisReply, AnalysisFailure> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            match &self.outcome {
                Ok(value) => Ok(serde_json::from_value(value.clone()).unwrap()),
                Err(failure) => Err(failure.clone()),
            }
        }
    }

    fn text_input(resume: &str, jd: &str) -> AnalysisInput {
        AnalysisInput::Text {
            resume: resume.to_string(),
            job_description: jd.to_string(),
        }
    }

    fn file(name: &str, content: &'static [u8]) -> UploadedFile {
        UploadedFile::new(name, None, Bytes::from_static(content))
    }

    fn bare_session() -> Arc<Session> {
        Arc::new(Session {
            id: uuid::Uuid::new_v4(),
            created_at: chrono::Utc::now(),
            workflow: Default::default(),
        })
    }

    async fn text_session() -> Arc<Session> {
        let session = bare_session();
        select_method(&session, InputMethod::Text).await.unwrap();
        session
    }

    #[test]
    fn test_validation_messages() {
        assert_eq!(
            validate_input(&text_input("resume", "  \n\t ")).unwrap_err().to_string(),
            "Please provide both resume and job description text."
        );
        let missing = AnalysisInput::File {
            resume: Some(file("cv.pdf", b"%PDF")),
            job_description: None,
        };
        assert_eq!(
            validate_input(&missing).unwrap_err().to_string(),
            "Please upload both resume and job description files."
        );
    }

    #[test]
    fn test_file_type_and_emptiness_checks() {
        let wrong_type = AnalysisInput::File {
            resume: Some(file("cv.docx", b"PK")),
            job_description: Some(file("jd.txt", b"Senior engineer")),
        };
        assert_eq!(
            validate_input(&wrong_type).unwrap_err(),
            ValidationError::UnsupportedFileType {
                file_name: "cv.docx".to_string()
            }
        );

        let empty = AnalysisInput::File {
            resume: Some(file("cv.pdf", b"")),
            job_description: Some(file("jd.txt", b"Senior engineer")),
        };
        assert_eq!(validate_input(&empty).unwrap_err(), ValidationError::MissingFiles);

        let ok = AnalysisInput::File {
            resume: Some(file("CV.PDF", b"%PDF")),
            job_description: Some(file("jd.txt", b"Senior engineer")),
        };
        assert!(validate_input(&ok).is_ok());
    }

    #[tokio::test]
    async fn test_blank_job_description_fails_without_calling_service() {
        let session = text_session().await;
        let service = Arc::new(StubService::replying(serde_json::json!({"fit_score": 90, "feedback": "x"})));

        let state = submit(Arc::clone(&session), text_input("My resume", "   "), service.clone())
            .await
            .unwrap();

        assert_eq!(
            state,
            WorkflowState::Failed {
                method: InputMethod::Text,
                message: "Please provide both resume and job description text.".to_string()
            }
        );
        assert_eq!(service.calls(), 0);
    }

    #[tokio::test]
    async fn test_successful_cycle_ends_succeeded() {
        let session = text_session().await;
        let service = Arc::new(StubService::replying(serde_json::json!({
            "fit_score": 85,
            "feedback": "The candidate demonstrates strong experience. However the candidate lacks cloud skills.",
            "skills_match": {"matched": ["Python"], "missing": ["AWS"]},
        })));

        let state = submit(Arc::clone(&session), text_input("resume", "jd"), service.clone())
            .await
            .unwrap();

        match state {
            WorkflowState::Succeeded { method, result } => {
                assert_eq!(method, InputMethod::Text);
                assert_eq!(result.fit_score, 85);
                assert_eq!(result.percentage, "85%");
            }
            other => panic!("expected succeeded, got {other:?}"),
        }
        assert_eq!(service.calls(), 1);
    }

    #[tokio::test]
    async fn test_server_failure_surfaces_detail() {
        let session = text_session().await;
        let service = Arc::new(StubService::failing(AnalysisFailure::ServerError {
            status: 500,
            detail: Some("Analysis failed: model overloaded".to_string()),
        }));

        let state = submit(Arc::clone(&session), text_input("resume", "jd"), service.clone())
            .await
            .unwrap();

        assert_eq!(
            state,
            WorkflowState::Failed {
                method: InputMethod::Text,
                message: "Analysis failed: model overloaded".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_out_of_range_score_is_server_class_failure() {
        let session = text_session().await;
        let service = Arc::new(StubService::replying(serde_json::json!({"fit_score": 140, "feedback": "x"})));

        let state = submit(Arc::clone(&session), text_input("resume", "jd"), service.clone())
            .await
            .unwrap();

        match state {
            WorkflowState::Failed { message, .. } => {
                assert!(message.starts_with("Invalid analysis result"), "{message}");
            }
            other => panic!("expected failed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_submit_without_method_is_rejected() {
        let session = bare_session();
        let service = Arc::new(StubService::replying(serde_json::json!({"fit_score": 50, "feedback": "x"})));

        let err = submit(Arc::clone(&session), text_input("resume", "jd"), service.clone())
            .await
            .unwrap_err();

        assert!(matches!(err, TransitionError::InvalidTransition { .. }));
        assert_eq!(service.calls(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_submit_rejected_while_in_flight() {
        let session = Arc::new(text_session().await);
        let gate = Arc::new(Notify::new());
        let service = Arc::new(StubService {
            outcome: Ok(serde_json::json!({"fit_score": 72, "feedback": "Fine."})),
            calls: AtomicUsize::new(0),
            gate: Some(Arc::clone(&gate)),
        });

        let first = tokio::spawn(submit(
            Arc::clone(&session),
            text_input("resume", "jd"),
            service.clone(),
        ));

        // wait until the first submission is parked inside the service
        while service.calls() == 0 {
            tokio::task::yield_now().await;
        }
        assert_eq!(session.workflow.lock().await.state().name(), "submitting");

        let second = submit(Arc::clone(&session), text_input("resume", "jd"), service.clone()).await;
        assert_eq!(second.unwrap_err(), TransitionError::AlreadySubmitting);

        gate.notify_one();
        let state = first.await.unwrap().unwrap();
        assert_eq!(state.name(), "succeeded");
        assert_eq!(service.calls(), 1);
    }

    #[tokio::test]
    async fn test_cycle_completes_after_caller_is_dropped() {
        let session = text_session().await;
        let gate = Arc::new(Notify::new());
        let service = Arc::new(StubService {
            outcome: Ok(serde_json::json!({"fit_score": 64, "feedback": "Fine."})),
            calls: AtomicUsize::new(0),
            gate: Some(Arc::clone(&gate)),
        });

        // the caller gives up while the service is still working
        let abandoned = tokio::time::timeout(
            Duration::from_millis(50),
            submit(Arc::clone(&session), text_input("resume", "jd"), service.clone()),
        )
        .await;
        assert!(abandoned.is_err());
        assert_eq!(session.workflow.lock().await.state().name(), "submitting");

        gate.notify_one();
        tokio::time::timeout(Duration::from_secs(5), async {
            while session.workflow.lock().await.state().name() != "succeeded" {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("cycle never reached a terminal state");

        // the session is usable again
        let state = choose_different_method(&session).await.unwrap();
        assert_eq!(state, WorkflowState::Idle);
        assert_eq!(service.calls(), 1);
    }
}
