//! HTTP API over the reference backend.
//!
//! Routes mirror the content/progress surface the lesson session talks to:
//!
//! - `GET  /lessons/:lesson_id` - Fetch the composite lesson document
//! - `POST /lessons/questions/:question_id/submit_answer` - Grade one answer
//! - `POST /users/me/progress/lessons/:lesson_id/complete` - Record a completion
//!
//! # Example
//!
//! ```no_run
//! use lexquest_scoring::{create_router, AppState, LocalBackend};
//!
//! # async fn example() {
//! let state = AppState::new(LocalBackend::new());
//! let router = create_router(state);
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8000").await.unwrap();
//! axum::serve(listener, router).await.unwrap();
//! # }
//! ```

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use lexquest_content::{
    AnswerSubmission, CompletionResult, Lesson, LessonId, QuestionId, SubmissionResult,
};
use lexquest_session::{LessonBackend, SessionError};
use serde::{Deserialize, Serialize};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

use crate::backend::LocalBackend;

// ============================================================================
// Response Types
// ============================================================================

/// Error response body returned on failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Description of the error.
    pub detail: String,
}

// ============================================================================
// Application State
// ============================================================================

/// Shared application state for the HTTP server.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The backend serving content and grading answers.
    pub backend: LocalBackend,
}

impl AppState {
    /// Creates a new `AppState` over the given backend.
    #[must_use]
    pub const fn new(backend: LocalBackend) -> Self {
        Self { backend }
    }
}

// ============================================================================
// API Error Type
// ============================================================================

/// Internal error type for API handlers.
#[derive(Debug)]
enum ApiError {
    /// The requested resource does not exist.
    NotFound(String),
    /// The request payload was rejected.
    Unprocessable(String),
    /// The stored content is broken or the backend failed.
    Internal(String),
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::NotFound { .. } => Self::NotFound(err.to_string()),
            SessionError::Validation { .. } | SessionError::Content(_) => {
                Self::Unprocessable(err.to_string())
            }
            _ => Self::Internal(err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            Self::NotFound(detail) => (StatusCode::NOT_FOUND, detail),
            Self::Unprocessable(detail) => (StatusCode::UNPROCESSABLE_ENTITY, detail),
            Self::Internal(detail) => (StatusCode::INTERNAL_SERVER_ERROR, detail),
        };

        let body = Json(ErrorResponse { detail });
        (status, body).into_response()
    }
}

// ============================================================================
// Router Setup
// ============================================================================

/// Creates the HTTP router with all API endpoints.
///
/// The router carries permissive CORS for development and request tracing.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/lessons/:lesson_id", get(handle_get_lesson))
        .route(
            "/lessons/questions/:question_id/submit_answer",
            post(handle_submit_answer),
        )
        .route(
            "/users/me/progress/lessons/:lesson_id/complete",
            post(handle_complete_lesson),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

// ============================================================================
// Handlers
// ============================================================================

/// Handler for `GET /lessons/:lesson_id`.
async fn handle_get_lesson(
    State(state): State<AppState>,
    Path(lesson_id): Path<LessonId>,
) -> Result<Json<Lesson>, ApiError> {
    let lesson = state.backend.fetch_lesson(lesson_id).await.map_err(|err| {
        warn!(lesson_id, error = %err, "lesson fetch rejected");
        ApiError::from(err)
    })?;
    Ok(Json(lesson))
}

/// Handler for `POST /lessons/questions/:question_id/submit_answer`.
async fn handle_submit_answer(
    State(state): State<AppState>,
    Path(question_id): Path<QuestionId>,
    Json(submission): Json<AnswerSubmission>,
) -> Result<Json<SubmissionResult>, ApiError> {
    let result = state
        .backend
        .submit_answer(question_id, submission)
        .await
        .map_err(|err| {
            warn!(question_id, error = %err, "answer submission rejected");
            ApiError::from(err)
        })?;
    info!(
        question_id,
        is_correct = result.is_correct,
        xp = result.xp_awarded,
        "answer graded"
    );
    Ok(Json(result))
}

/// Handler for `POST /users/me/progress/lessons/:lesson_id/complete`.
async fn handle_complete_lesson(
    State(state): State<AppState>,
    Path(lesson_id): Path<LessonId>,
) -> Result<Json<CompletionResult>, ApiError> {
    let result = state
        .backend
        .complete_lesson(lesson_id)
        .await
        .map_err(|err| {
            warn!(lesson_id, error = %err, "completion rejected");
            ApiError::from(err)
        })?;
    info!(
        lesson_id,
        xp = result.xp_earned_for_this_completion,
        first = result.is_first_completion,
        "lesson completed"
    );
    Ok(Json(result))
}

// ============================================================================
// Tests
// ============================================================================
