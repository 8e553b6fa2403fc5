//! Editor-side validation of lesson documents.
//!
//! Published content must satisfy the structural invariants the session core
//! relies on: theory blocks carry text and no questions, exercise blocks are
//! never empty, and each question kind has a well-formed canonical answer.

use crate::model::{BlockKind, Lesson, LessonBlock, Question, QuestionId, QuestionKind};

/// A specialized `Result` type for content validation.
pub type Result<T> = std::result::Result<T, ContentError>;

/// Violations of the lesson document invariants.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContentError {
    /// A theory block has no theory text.
    #[error("Theory block {block_id} has no theory text")]
    TheoryTextMissing {
        /// Id of the offending block.
        block_id: i64,
    },

    /// A theory block carries questions.
    #[error("Theory block {block_id} must not carry questions (found {count})")]
    TheoryBlockWithQuestions {
        /// Id of the offending block.
        block_id: i64,
        /// Number of questions found.
        count: usize,
    },

    /// An exercise block has no questions.
    #[error("Exercise block {block_id} has no questions; publish at least one")]
    EmptyExerciseBlock {
        /// Id of the offending block.
        block_id: i64,
    },

    /// A choice question does not have the required number of correct options.
    #[error("Question {question_id} ({kind}) must have exactly one correct option, found {correct_count} of {option_count}")]
    WrongCorrectOptionCount {
        /// Id of the offending question.
        question_id: QuestionId,
        /// Kind of the question.
        kind: QuestionKind,
        /// How many options are flagged correct.
        correct_count: usize,
        /// Total number of options.
        option_count: usize,
    },

    /// A multiple-choice question is malformed.
    #[error("Multiple-choice question {question_id} needs at least two options and one correct option (found {option_count} options, {correct_count} correct)")]
    MalformedMultipleChoice {
        /// Id of the offending question.
        question_id: QuestionId,
        /// Total number of options.
        option_count: usize,
        /// How many options are flagged correct.
        correct_count: usize,
    },

    /// A true/false question does not carry exactly the fixed option pair.
    #[error("True/false question {question_id} must carry exactly two options, found {option_count}")]
    WrongTrueFalseOptionCount {
        /// Id of the offending question.
        question_id: QuestionId,
        /// Total number of options.
        option_count: usize,
    },

    /// A true/false question has an unparseable canonical answer.
    #[error("True/false question {question_id} has canonical answer '{text}'; expected 'true' or 'false'")]
    UnparseableTrueFalseAnswer {
        /// Id of the offending question.
        question_id: QuestionId,
        /// The canonical answer text found.
        text: String,
    },

    /// A fill-in-blank question carries options.
    #[error("Fill-in-blank question {question_id} must not carry options, found {option_count}")]
    FillInBlankWithOptions {
        /// Id of the offending question.
        question_id: QuestionId,
        /// Total number of options.
        option_count: usize,
    },

    /// A fill-in-blank question has no canonical answer text.
    #[error("Fill-in-blank question {question_id} has no canonical answer text")]
    MissingCanonicalText {
        /// Id of the offending question.
        question_id: QuestionId,
    },
}

/// Validates a lesson document against the publication invariants.
///
/// Returns the first violation found, walking blocks and questions in
/// document order.
pub fn validate_lesson(lesson: &Lesson) -> Result<()> {
    for block in &lesson.blocks {
        validate_block(block)?;
    }
    Ok(())
}

fn validate_block(block: &LessonBlock) -> Result<()> {
    match block.block_type {
        BlockKind::Theory => {
            let text_missing = block
                .theory_text
                .as_deref()
                .map_or(true, |s| s.trim().is_empty());
            if text_missing {
                return Err(ContentError::TheoryTextMissing { block_id: block.id });
            }
            if !block.questions.is_empty() {
                return Err(ContentError::TheoryBlockWithQuestions {
                    block_id: block.id,
                    count: block.questions.len(),
                });
            }
        }
        BlockKind::Exercise => {
            if block.questions.is_empty() {
                return Err(ContentError::EmptyExerciseBlock { block_id: block.id });
            }
            for question in &block.questions {
                validate_question(question)?;
            }
        }
    }
    Ok(())
}

fn validate_question(question: &Question) -> Result<()> {
    let option_count = question.options.len();
    let correct_count = question.options.iter().filter(|o| o.is_correct).count();

    match question.question_type {
        QuestionKind::SingleChoice => {
            if correct_count != 1 {
                return Err(ContentError::WrongCorrectOptionCount {
                    question_id: question.id,
                    kind: question.question_type,
                    correct_count,
                    option_count,
                });
            }
        }
        QuestionKind::MultipleChoice => {
            if option_count < 2 || correct_count == 0 {
                return Err(ContentError::MalformedMultipleChoice {
                    question_id: question.id,
                    option_count,
                    correct_count,
                });
            }
        }
        QuestionKind::TrueFalse => {
            if option_count != 2 {
                return Err(ContentError::WrongTrueFalseOptionCount {
                    question_id: question.id,
                    option_count,
                });
            }
            if correct_count != 1 {
                return Err(ContentError::WrongCorrectOptionCount {
                    question_id: question.id,
                    kind: question.question_type,
                    correct_count,
                    option_count,
                });
            }
            if question.correct_bool().is_none() {
                return Err(ContentError::UnparseableTrueFalseAnswer {
                    question_id: question.id,
                    text: question.correct_answer_text.clone(),
                });
            }
        }
        QuestionKind::FillInBlank => {
            if option_count != 0 {
                return Err(ContentError::FillInBlankWithOptions {
                    question_id: question.id,
                    option_count,
                });
            }
            if question.correct_answer_text.trim().is_empty() {
                return Err(ContentError::MissingCanonicalText {
                    question_id: question.id,
                });
            }
        }
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
