//! Lexquest Content Model
//!
//! Typed representation of the learning content hierarchy (lessons, blocks,
//! questions, options), the answer payloads exchanged with the scoring
//! backend, and editor-side document validation.

pub mod answer;
pub mod model;
pub mod validate;

pub use answer::{
    AnswerSubmission, AnswerValue, CompletionResult, CorrectAnswerDetails, SubmissionResult,
};
pub use model::{
    BlockKind, Lesson, LessonBlock, LessonId, ModuleId, OptionId, Question, QuestionId,
    QuestionKind, QuestionOption, FALSE_LABEL, TRUE_LABEL,
};
pub use validate::{validate_lesson, ContentError};
