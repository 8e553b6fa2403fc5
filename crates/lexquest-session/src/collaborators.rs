//! Collaborator traits of the lesson session.
//!
//! The session never reaches for ambient context: everything it talks to is
//! an explicit handle injected at construction. The backend carries the
//! authoritative scoring; the profile sink, notifier, and navigator are
//! fire-and-forget surfaces whose failures never affect session state.

use futures::future::BoxFuture;
use lexquest_content::{
    AnswerSubmission, CompletionResult, Lesson, LessonId, ModuleId, QuestionId, SubmissionResult,
};

use crate::error::Result;

/// Severity of a user-facing notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Positive outcome (correct answer, completion).
    Success,
    /// A failed action the learner should retry or fix.
    Error,
    /// Neutral information.
    Info,
    /// Something worth attention that is not a failure.
    Warning,
}

/// The authoritative backend: lesson documents, answer scoring, completion.
///
/// All verdicts and XP amounts originate here; the session treats every
/// response as truth and never second-guesses it locally.
pub trait LessonBackend: Send + Sync {
    /// Fetches the full lesson document with nested blocks and questions.
    fn fetch_lesson(&self, lesson_id: LessonId) -> BoxFuture<'_, Result<Lesson>>;

    /// Submits one answer for scoring and returns the graded result.
    fn submit_answer(
        &self,
        question_id: QuestionId,
        submission: AnswerSubmission,
    ) -> BoxFuture<'_, Result<SubmissionResult>>;

    /// Records a lesson completion and returns the XP outcome.
    fn complete_lesson(&self, lesson_id: LessonId) -> BoxFuture<'_, Result<CompletionResult>>;
}

/// Receiver of global XP deltas.
///
/// Called with positive deltas only, immediately after the backend confirms
/// an award. Fire-and-forget: the session does not await acknowledgement.
pub trait ProfileSink: Send + Sync {
    /// Adds `delta` experience points to the learner's running total.
    fn add_xp(&self, delta: u32);
}

/// Receiver of user-facing notifications (toasts).
pub trait Notifier: Send + Sync {
    /// Raises one notification.
    fn notify(&self, message: &str, severity: Severity);
}

/// Receiver of navigation requests.
pub trait Navigator: Send + Sync {
    /// Navigates to the overview of the given module.
    fn go_to_module(&self, module_id: ModuleId);
}
