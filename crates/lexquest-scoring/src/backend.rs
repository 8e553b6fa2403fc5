//! In-process `LessonBackend` over the content store and progress ledger.

use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use lexquest_content::{
    AnswerSubmission, CompletionResult, Lesson, LessonId, QuestionId, SubmissionResult,
};
use lexquest_session::{LessonBackend, SessionError};
use tokio::sync::Mutex;
use tracing::info;

use crate::error::ScoringError;
use crate::score::{score_answer, XP_FOR_CORRECT_ANSWER};
use crate::store::{ContentStore, ProgressLedger};

#[derive(Debug, Default)]
struct Inner {
    store: ContentStore,
    ledger: ProgressLedger,
}

/// The reference backend: grades answers and tracks progress in memory.
///
/// Clones share the same store and ledger, so one instance can serve a
/// session and an HTTP API at the same time.
#[derive(Debug, Clone, Default)]
pub struct LocalBackend {
    inner: Arc<Mutex<Inner>>,
}

impl LocalBackend {
    /// Creates a backend with an empty store and ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a backend preloaded with the given lessons.
    ///
    /// # Errors
    ///
    /// Returns the first validation failure among the documents.
    pub fn with_lessons(
        lessons: impl IntoIterator<Item = Lesson>,
    ) -> crate::error::Result<Self> {
        let mut store = ContentStore::new();
        for lesson in lessons {
            store.insert(lesson)?;
        }
        info!(lessons = store.len(), "backend loaded");
        Ok(Self {
            inner: Arc::new(Mutex::new(Inner {
                store,
                ledger: ProgressLedger::new(),
            })),
        })
    }

    /// The learner's running XP total.
    pub async fn total_xp(&self) -> u64 {
        self.inner.lock().await.ledger.total_xp()
    }
}

impl From<ScoringError> for SessionError {
    fn from(err: ScoringError) -> Self {
        match err {
            ScoringError::LessonNotFound { lesson_id } => Self::not_found("lesson", lesson_id),
            ScoringError::QuestionNotFound { question_id } => {
                Self::not_found("question", question_id)
            }
            ScoringError::MalformedAnswer { .. } => Self::validation(err.to_string()),
            ScoringError::MissingCanonicalAnswer { .. } => Self::server(500, err.to_string()),
            ScoringError::Content(content) => Self::Content(content),
        }
    }
}

impl LessonBackend for LocalBackend {
    fn fetch_lesson(&self, lesson_id: LessonId) -> BoxFuture<'_, lexquest_session::Result<Lesson>> {
        async move {
            let inner = self.inner.lock().await;
            let mut lesson = inner.store.lesson(lesson_id)?.clone();
            lesson.is_completed_by_user = inner.ledger.has_completed(lesson_id);
            Ok(lesson)
        }
        .boxed()
    }

    fn submit_answer(
        &self,
        question_id: QuestionId,
        submission: AnswerSubmission,
    ) -> BoxFuture<'_, lexquest_session::Result<SubmissionResult>> {
        async move {
            let mut inner = self.inner.lock().await;
            let question = inner.store.question(question_id)?;
            let (is_correct, correct_answer_details) =
                score_answer(question, &submission.user_answer)?;
            let explanation = question.general_explanation.clone();
            let xp_awarded =
                inner
                    .ledger
                    .record_answer(question_id, is_correct, XP_FOR_CORRECT_ANSWER);
            Ok(SubmissionResult {
                is_correct,
                explanation,
                correct_answer_details,
                xp_awarded,
            })
        }
        .boxed()
    }

    fn complete_lesson(
        &self,
        lesson_id: LessonId,
    ) -> BoxFuture<'_, lexquest_session::Result<CompletionResult>> {
        async move {
            let mut inner = self.inner.lock().await;
            inner.store.lesson(lesson_id)?;
            Ok(inner.ledger.record_completion(lesson_id))
        }
        .boxed()
    }
}
