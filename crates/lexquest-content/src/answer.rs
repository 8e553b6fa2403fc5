//! Answer payloads and scoring results.
//!
//! `AnswerValue` is the client-side, ephemeral representation of a learner's
//! answer. Option ids are the canonical answer key for both choice kinds;
//! display text is always derived by lookup on the question. On the wire the
//! value serializes untagged, matching the backend's `user_answer` field
//! (number, array of numbers, boolean, or string depending on the question
//! kind).

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::model::{LessonId, OptionId, QuestionId, QuestionKind};

// ============================================================================
// AnswerValue
// ============================================================================

/// A learner's (possibly partial) answer to one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    /// Selected option id for a single-choice question.
    Option(OptionId),
    /// Selected option ids for a multiple-choice question.
    Options(BTreeSet<OptionId>),
    /// Chosen truth value for a true/false question.
    Bool(bool),
    /// Free text for a fill-in-blank question.
    Text(String),
}

impl AnswerValue {
    /// Whether this value has the shape the given question kind expects.
    #[must_use]
    pub const fn matches_kind(&self, kind: QuestionKind) -> bool {
        matches!(
            (self, kind),
            (Self::Option(_), QuestionKind::SingleChoice)
                | (Self::Options(_), QuestionKind::MultipleChoice)
                | (Self::Bool(_), QuestionKind::TrueFalse)
                | (Self::Text(_), QuestionKind::FillInBlank)
        )
    }

    /// Whether the value is substantive enough to submit.
    ///
    /// A multiple-choice selection must be non-empty and free text must
    /// contain at least one non-whitespace character.
    #[must_use]
    pub fn is_submittable(&self) -> bool {
        match self {
            Self::Option(_) | Self::Bool(_) => true,
            Self::Options(ids) => !ids.is_empty(),
            Self::Text(text) => !text.trim().is_empty(),
        }
    }
}

/// Request body for the answer submission endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerSubmission {
    /// Identifier of the answered question.
    pub question_id: QuestionId,
    /// The learner's answer, shaped per the question kind.
    pub user_answer: AnswerValue,
}

// ============================================================================
// SubmissionResult
// ============================================================================

/// Canonical-answer details returned alongside a scored submission.
///
/// The shape depends on the originating question kind. Serialized untagged;
/// the field names discriminate the variants, matching the backend payloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CorrectAnswerDetails {
    /// Single-choice: the one correct option.
    SingleChoice {
        /// Id of the correct option.
        correct_option_id: OptionId,
        /// Display text of the correct option.
        correct_option_text: String,
    },
    /// Multiple-choice: all correct options.
    MultipleChoice {
        /// Ids of the correct options.
        correct_option_ids: Vec<OptionId>,
        /// Display texts of the correct options.
        correct_option_texts: Vec<String>,
    },
    /// True/false: the canonical truth value.
    TrueFalse {
        /// The canonical truth value.
        correct_bool_answer: bool,
    },
    /// Fill-in-blank: the canonical text.
    FillInBlank {
        /// The canonical answer text.
        correct_text_answer: String,
    },
}

/// Authoritative result of scoring one submitted answer.
///
/// Client-only and ephemeral: once present for a question, that question's
/// input is locked until the block is left and re-entered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionResult {
    /// Whether the answer was judged correct by the server.
    pub is_correct: bool,
    /// Explanation text shown post-submission.
    pub explanation: String,
    /// Canonical answer details, shaped per the question kind.
    pub correct_answer_details: CorrectAnswerDetails,
    /// Experience points awarded for this submission (0 when incorrect).
    pub xp_awarded: u32,
}

// ============================================================================
// CompletionResult
// ============================================================================

/// Result of marking a lesson as completed.
///
/// Repeat completions succeed idempotently with a zero XP delta and
/// `is_first_completion` false.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionResult {
    /// Identifier of the completed lesson.
    pub lesson_id: LessonId,
    /// XP earned by this specific completion (0 on repeats).
    pub xp_earned_for_this_completion: u32,
    /// The learner's running XP total after this completion.
    pub current_total_user_xp: u64,
    /// Whether this was the learner's first completion of the lesson.
    pub is_first_completion: bool,
}

// ============================================================================
// Tests
// ============================================================================
