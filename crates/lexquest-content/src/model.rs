//! Learning content entities.
//!
//! These types mirror the composite lesson document returned by the content
//! API: a lesson owns an ordered list of blocks, exercise blocks own
//! questions, and choice questions own options. The document is read-only
//! for the duration of a learning session.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier for a lesson.
pub type LessonId = i64;
/// Identifier for a module (the lesson's parent).
pub type ModuleId = i64;
/// Identifier for a question.
pub type QuestionId = i64;
/// Identifier for an answer option.
pub type OptionId = i64;

/// Display label for the affirmative true/false choice.
pub const TRUE_LABEL: &str = "Верно";
/// Display label for the negative true/false choice.
pub const FALSE_LABEL: &str = "Неверно";

// ============================================================================
// BlockKind and QuestionKind
// ============================================================================

/// The two kinds of lesson block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    /// Explanatory text the learner reads.
    Theory,
    /// Interactive block carrying one or more questions.
    Exercise,
}

impl std::fmt::Display for BlockKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Theory => write!(f, "theory"),
            Self::Exercise => write!(f, "exercise"),
        }
    }
}

/// The four supported question interaction kinds.
///
/// This enum is deliberately closed: the input-widget and review match sites
/// in `lexquest-session` match exhaustively over it, so adding a fifth kind
/// is a compile-time event at every point that must handle it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    /// Exactly one option may be selected.
    SingleChoice,
    /// Any subset of options may be selected.
    MultipleChoice,
    /// A fixed true/false pair.
    TrueFalse,
    /// Free-text input compared against a canonical answer.
    FillInBlank,
}

impl std::fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SingleChoice => write!(f, "single_choice"),
            Self::MultipleChoice => write!(f, "multiple_choice"),
            Self::TrueFalse => write!(f, "true_false"),
            Self::FillInBlank => write!(f, "fill_in_blank"),
        }
    }
}

// ============================================================================
// QuestionOption and Question
// ============================================================================

/// A selectable answer option belonging to a choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionOption {
    /// Identifier of the option.
    pub id: OptionId,
    /// Display text shown to the learner.
    pub text: String,
    /// Whether this option is part of the canonical answer.
    pub is_correct: bool,
    /// Identifier of the owning question.
    pub question_id: QuestionId,
}

/// A single quiz question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    /// Identifier of the question.
    pub id: QuestionId,
    /// Prompt text shown to the learner.
    pub text: String,
    /// Interaction kind of the question.
    pub question_type: QuestionKind,
    /// Explanation shown after the answer is scored.
    #[serde(default)]
    pub general_explanation: String,
    /// Canonical answer text. Authoritative for fill-in-blank and true/false;
    /// display-only for the choice kinds.
    #[serde(default)]
    pub correct_answer_text: String,
    /// Answer options. Empty for fill-in-blank.
    #[serde(default)]
    pub options: Vec<QuestionOption>,
}

impl Question {
    /// Returns the unique correct option, if exactly one is flagged.
    ///
    /// For validated `single_choice` and `true_false` questions this is
    /// always `Some`; for other kinds it may be `None`.
    #[must_use]
    pub fn correct_option(&self) -> Option<&QuestionOption> {
        let mut correct = self.options.iter().filter(|o| o.is_correct);
        match (correct.next(), correct.next()) {
            (Some(option), None) => Some(option),
            _ => None,
        }
    }

    /// Returns the ids of all options flagged correct.
    #[must_use]
    pub fn correct_option_ids(&self) -> BTreeSet<OptionId> {
        self.options
            .iter()
            .filter(|o| o.is_correct)
            .map(|o| o.id)
            .collect()
    }

    /// Parses `correct_answer_text` as a boolean, case-insensitively.
    ///
    /// Returns `None` when the text is neither "true" nor "false". Only
    /// meaningful for `true_false` questions.
    #[must_use]
    pub fn correct_bool(&self) -> Option<bool> {
        match self.correct_answer_text.trim().to_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        }
    }

    /// Looks up an option's display text by id.
    #[must_use]
    pub fn option_text(&self, option_id: OptionId) -> Option<&str> {
        self.options
            .iter()
            .find(|o| o.id == option_id)
            .map(|o| o.text.as_str())
    }

    /// Cosmetic fill-in-blank preview check: trimmed, case-insensitive
    /// comparison against the canonical text.
    ///
    /// This is a UI hint only. Correctness used for scoring always comes
    /// from the backend's submission result, never from this check.
    #[must_use]
    pub fn preview_matches(&self, input: &str) -> bool {
        input.trim().to_lowercase() == self.correct_answer_text.trim().to_lowercase()
    }
}

// ============================================================================
// LessonBlock and Lesson
// ============================================================================

/// A unit within a lesson, either explanatory or interactive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonBlock {
    /// Identifier of the block.
    pub id: i64,
    /// Identifier of the owning lesson.
    pub lesson_id: LessonId,
    /// Whether this is a theory or an exercise block.
    pub block_type: BlockKind,
    /// Theory text. Present only for theory blocks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theory_text: Option<String>,
    /// Questions. Non-empty only for exercise blocks.
    #[serde(default)]
    pub questions: Vec<Question>,
    /// 1-based position within the lesson. Unique by convention, contiguity
    /// is not enforced client-side.
    pub order: u32,
}

impl LessonBlock {
    /// Returns the question with the given id, if this block carries it.
    #[must_use]
    pub fn question(&self, question_id: QuestionId) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == question_id)
    }
}

/// A lesson document: the composite fetched once per session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lesson {
    /// Identifier of the lesson.
    pub id: LessonId,
    /// Lesson title.
    pub title: String,
    /// Optional description shown under the title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Position within the owning module.
    pub order: u32,
    /// Identifier of the owning module.
    pub module_id: ModuleId,
    /// Ordered blocks of the lesson.
    #[serde(default)]
    pub blocks: Vec<LessonBlock>,
    /// Whether the requesting learner has already completed this lesson.
    #[serde(default)]
    pub is_completed_by_user: bool,
    /// Server-side creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Server-side last-update timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Lesson {
    /// Finds a question anywhere in the lesson by id.
    #[must_use]
    pub fn question(&self, question_id: QuestionId) -> Option<&Question> {
        self.blocks.iter().find_map(|b| b.question(question_id))
    }

    /// Index of the first theory block, if any.
    #[must_use]
    pub fn first_theory_index(&self) -> Option<usize> {
        self.blocks
            .iter()
            .position(|b| b.block_type == BlockKind::Theory)
    }
}

// ============================================================================
// Tests
// ============================================================================
