//! Lesson storage and learner progress accounting.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use lexquest_content::{
    validate_lesson, CompletionResult, Lesson, LessonId, Question, QuestionId,
};
use serde::Serialize;
use tracing::debug;

use crate::error::{Result, ScoringError};
use crate::score::{XP_FOR_FIRST_COMPLETION, XP_FOR_REPEAT_COMPLETION};

// ============================================================================
// ContentStore
// ============================================================================

/// Validated lesson documents, keyed by lesson id.
#[derive(Debug, Clone, Default)]
pub struct ContentStore {
    lessons: HashMap<LessonId, Lesson>,
}

impl ContentStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates and inserts a lesson, replacing any document with the
    /// same id.
    ///
    /// # Errors
    ///
    /// Returns the underlying `ContentError` when the document violates a
    /// content invariant.
    pub fn insert(&mut self, lesson: Lesson) -> Result<()> {
        validate_lesson(&lesson)?;
        debug!(lesson_id = lesson.id, title = %lesson.title, "lesson stored");
        self.lessons.insert(lesson.id, lesson);
        Ok(())
    }

    /// Looks up a lesson by id.
    ///
    /// # Errors
    ///
    /// Returns `ScoringError::LessonNotFound` for an unknown id.
    pub fn lesson(&self, lesson_id: LessonId) -> Result<&Lesson> {
        self.lessons
            .get(&lesson_id)
            .ok_or(ScoringError::LessonNotFound { lesson_id })
    }

    /// Finds a question by id across all stored lessons.
    ///
    /// # Errors
    ///
    /// Returns `ScoringError::QuestionNotFound` for an unknown id.
    pub fn question(&self, question_id: QuestionId) -> Result<&Question> {
        self.lessons
            .values()
            .find_map(|lesson| lesson.question(question_id))
            .ok_or(ScoringError::QuestionNotFound { question_id })
    }

    /// Number of stored lessons.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lessons.len()
    }

    /// Whether the store holds no lessons.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lessons.is_empty()
    }
}

// ============================================================================
// ProgressLedger
// ============================================================================

/// One graded answer on record.
#[derive(Debug, Clone, Serialize)]
pub struct AnsweredRecord {
    /// The answered question.
    pub question_id: QuestionId,
    /// Verdict of the latest grading.
    pub is_correct: bool,
    /// When the latest grading happened.
    pub answered_at: DateTime<Utc>,
}

/// Per-learner progress: answered questions, completion counts, XP total.
///
/// XP for a question is awarded once, on the first correct grading;
/// re-answering after block navigation updates the record without farming
/// further XP. Repeat lesson completions succeed idempotently at zero delta.
#[derive(Debug, Clone, Default)]
pub struct ProgressLedger {
    answered: HashMap<QuestionId, AnsweredRecord>,
    completions: HashMap<LessonId, u32>,
    total_xp: u64,
}

impl ProgressLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a graded answer and returns the XP awarded for it.
    ///
    /// `xp_per_correct` is granted only when this grading is correct and no
    /// earlier grading of the same question was.
    pub fn record_answer(
        &mut self,
        question_id: QuestionId,
        is_correct: bool,
        xp_per_correct: u32,
    ) -> u32 {
        let previously_correct = self
            .answered
            .get(&question_id)
            .is_some_and(|r| r.is_correct);
        self.answered.insert(
            question_id,
            AnsweredRecord {
                question_id,
                is_correct,
                answered_at: Utc::now(),
            },
        );
        let awarded = if is_correct && !previously_correct {
            xp_per_correct
        } else {
            0
        };
        self.total_xp += u64::from(awarded);
        debug!(question_id, is_correct, awarded, "answer recorded");
        awarded
    }

    /// Records a lesson completion and returns the outcome.
    ///
    /// The first completion awards the first-completion bonus; every later
    /// one succeeds with a zero delta.
    pub fn record_completion(&mut self, lesson_id: LessonId) -> CompletionResult {
        let attempts = self.completions.entry(lesson_id).or_insert(0);
        *attempts += 1;
        let is_first_completion = *attempts == 1;
        let awarded = if is_first_completion {
            XP_FOR_FIRST_COMPLETION
        } else {
            XP_FOR_REPEAT_COMPLETION
        };
        self.total_xp += u64::from(awarded);
        debug!(lesson_id, attempts = *attempts, awarded, "completion recorded");
        CompletionResult {
            lesson_id,
            xp_earned_for_this_completion: awarded,
            current_total_user_xp: self.total_xp,
            is_first_completion,
        }
    }

    /// Whether the learner has completed the lesson at least once.
    #[must_use]
    pub fn has_completed(&self, lesson_id: LessonId) -> bool {
        self.completions.get(&lesson_id).copied().unwrap_or(0) > 0
    }

    /// The latest record for a question, if it was ever graded.
    #[must_use]
    pub fn answered(&self, question_id: QuestionId) -> Option<&AnsweredRecord> {
        self.answered.get(&question_id)
    }

    /// The learner's running XP total.
    #[must_use]
    pub const fn total_xp(&self) -> u64 {
        self.total_xp
    }
}
