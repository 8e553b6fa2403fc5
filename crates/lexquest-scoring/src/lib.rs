//! Lexquest Scoring Backend
//!
//! The authoritative side of the lesson lifecycle: lesson storage, answer
//! grading, XP accounting, an in-process backend for sessions, and an HTTP
//! API exposing the same surface.

pub mod api;
pub mod backend;
pub mod error;
pub mod score;
pub mod store;

pub use api::{create_router, AppState, ErrorResponse};
pub use backend::LocalBackend;
pub use error::{Result, ScoringError};
pub use score::{
    score_answer, XP_FOR_CORRECT_ANSWER, XP_FOR_FIRST_COMPLETION, XP_FOR_REPEAT_COMPLETION,
};
pub use store::{AnsweredRecord, ContentStore, ProgressLedger};
