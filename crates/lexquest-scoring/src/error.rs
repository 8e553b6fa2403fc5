//! Error types for the scoring backend.

/// A specialized `Result` type for scoring operations.
pub type Result<T> = std::result::Result<T, ScoringError>;

/// Errors produced by the content store, grader, and progress ledger.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ScoringError {
    /// No lesson with this id is loaded.
    #[error("Lesson {lesson_id} not found")]
    LessonNotFound {
        /// Id that failed to resolve.
        lesson_id: i64,
    },

    /// No question with this id exists in any loaded lesson.
    #[error("Question {question_id} not found")]
    QuestionNotFound {
        /// Id that failed to resolve.
        question_id: i64,
    },

    /// The answer payload shape does not match the question kind.
    #[error("Malformed answer for question {question_id}: expected a {expected} payload")]
    MalformedAnswer {
        /// The question being answered.
        question_id: i64,
        /// The payload shape the question kind requires.
        expected: &'static str,
    },

    /// The question document carries no usable canonical answer.
    #[error("Question {question_id} has no canonical answer")]
    MissingCanonicalAnswer {
        /// The broken question.
        question_id: i64,
    },

    /// A lesson document failed validation on insert.
    #[error(transparent)]
    Content(#[from] lexquest_content::ContentError),
}
