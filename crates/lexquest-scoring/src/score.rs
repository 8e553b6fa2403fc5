//! Authoritative answer grading.
//!
//! Grades one answer payload against the canonical answer of its question
//! and builds the disclosure returned to the client. These rules are the
//! single source of truth for correctness; client-side previews are
//! cosmetic.

use lexquest_content::{AnswerValue, CorrectAnswerDetails, Question, QuestionKind};

use crate::error::{Result, ScoringError};

/// XP for each correctly answered question.
pub const XP_FOR_CORRECT_ANSWER: u32 = 10;

/// XP for the first completion of a lesson.
pub const XP_FOR_FIRST_COMPLETION: u32 = 25;

/// XP for any completion after the first.
pub const XP_FOR_REPEAT_COMPLETION: u32 = 0;

/// Grades `answer` against `question`.
///
/// Returns the verdict and the canonical-answer disclosure. Comparison is
/// by option id for both choice kinds, by boolean for true/false, and by
/// trimmed case-insensitive text for fill-in-blank.
///
/// # Errors
///
/// Returns `ScoringError::MalformedAnswer` when the payload shape does not
/// match the question kind, and `ScoringError::MissingCanonicalAnswer` when
/// the question document carries no usable canonical answer.
pub fn score_answer(
    question: &Question,
    answer: &AnswerValue,
) -> Result<(bool, CorrectAnswerDetails)> {
    match question.question_type {
        QuestionKind::SingleChoice => {
            let correct = question.correct_option().ok_or(
                ScoringError::MissingCanonicalAnswer {
                    question_id: question.id,
                },
            )?;
            let AnswerValue::Option(chosen) = answer else {
                return Err(malformed(question, "number"));
            };
            Ok((
                *chosen == correct.id,
                CorrectAnswerDetails::SingleChoice {
                    correct_option_id: correct.id,
                    correct_option_text: correct.text.clone(),
                },
            ))
        }
        QuestionKind::MultipleChoice => {
            let correct_ids = question.correct_option_ids();
            if correct_ids.is_empty() {
                return Err(ScoringError::MissingCanonicalAnswer {
                    question_id: question.id,
                });
            }
            let AnswerValue::Options(chosen) = answer else {
                return Err(malformed(question, "array of numbers"));
            };
            let correct_texts = question
                .options
                .iter()
                .filter(|o| o.is_correct)
                .map(|o| o.text.clone())
                .collect();
            let is_correct = *chosen == correct_ids;
            Ok((
                is_correct,
                CorrectAnswerDetails::MultipleChoice {
                    correct_option_ids: correct_ids.into_iter().collect(),
                    correct_option_texts: correct_texts,
                },
            ))
        }
        QuestionKind::TrueFalse => {
            let canonical =
                question
                    .correct_bool()
                    .ok_or(ScoringError::MissingCanonicalAnswer {
                        question_id: question.id,
                    })?;
            let AnswerValue::Bool(chosen) = answer else {
                return Err(malformed(question, "boolean"));
            };
            Ok((
                *chosen == canonical,
                CorrectAnswerDetails::TrueFalse {
                    correct_bool_answer: canonical,
                },
            ))
        }
        QuestionKind::FillInBlank => {
            let canonical = question.correct_answer_text.trim();
            if canonical.is_empty() {
                return Err(ScoringError::MissingCanonicalAnswer {
                    question_id: question.id,
                });
            }
            let AnswerValue::Text(chosen) = answer else {
                return Err(malformed(question, "string"));
            };
            Ok((
                chosen.trim().to_lowercase() == canonical.to_lowercase(),
                CorrectAnswerDetails::FillInBlank {
                    correct_text_answer: question.correct_answer_text.clone(),
                },
            ))
        }
    }
}

const fn malformed(question: &Question, expected: &'static str) -> ScoringError {
    ScoringError::MalformedAnswer {
        question_id: question.id,
        expected,
    }
}
