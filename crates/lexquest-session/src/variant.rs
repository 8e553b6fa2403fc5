//! Question variant handling: input widgets and post-submission review.
//!
//! This module owns the only two places where behavior branches on
//! [`QuestionKind`]: choosing the input affordance for an unanswered
//! question, and annotating the canonical answer against the learner's own
//! selection once a result is in. Both match exhaustively, so a new question
//! kind fails to compile here first.

use lexquest_content::{
    AnswerValue, OptionId, Question, QuestionKind, SubmissionResult, FALSE_LABEL, TRUE_LABEL,
};
use serde::Serialize;

// ============================================================================
// Input widgets
// ============================================================================

/// Selection state of one choice in a radio or checkbox group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChoiceState {
    /// Id of the option.
    pub option_id: OptionId,
    /// Display text of the option.
    pub text: String,
    /// Whether the learner currently has this option selected.
    pub selected: bool,
}

/// Render-ready input affordance for one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "widget", rename_all = "snake_case")]
pub enum InputWidget {
    /// Single-choice radio group.
    RadioGroup {
        /// The options with their current selection state.
        options: Vec<ChoiceState>,
    },
    /// Multiple-choice checkbox group.
    CheckboxGroup {
        /// The options with their current selection state.
        options: Vec<ChoiceState>,
    },
    /// The fixed true/false pair.
    TrueFalseToggle {
        /// Label of the affirmative choice.
        true_label: String,
        /// Label of the negative choice.
        false_label: String,
        /// The learner's current choice, if any.
        selected: Option<bool>,
    },
    /// Free-text field for fill-in-blank.
    TextField {
        /// The learner's current input.
        current: String,
        /// Cosmetic preview of whether the input matches the canonical text
        /// (trimmed, case-insensitive). `None` while the field is blank.
        /// Never authoritative: scoring correctness comes from the backend.
        preview_matches: Option<bool>,
    },
}

impl InputWidget {
    /// Builds the input widget for `question`, reflecting the stored answer.
    ///
    /// An answer whose shape does not match the question kind is treated as
    /// absent; the session controller rejects such writes before they land.
    #[must_use]
    pub fn for_question(question: &Question, answer: Option<&AnswerValue>) -> Self {
        match question.question_type {
            QuestionKind::SingleChoice => {
                let chosen = match answer {
                    Some(AnswerValue::Option(id)) => Some(*id),
                    _ => None,
                };
                Self::RadioGroup {
                    options: choice_states(question, |id| chosen == Some(id)),
                }
            }
            QuestionKind::MultipleChoice => {
                let empty = std::collections::BTreeSet::new();
                let chosen = match answer {
                    Some(AnswerValue::Options(ids)) => ids,
                    _ => &empty,
                };
                Self::CheckboxGroup {
                    options: choice_states(question, |id| chosen.contains(&id)),
                }
            }
            QuestionKind::TrueFalse => {
                let selected = match answer {
                    Some(AnswerValue::Bool(value)) => Some(*value),
                    _ => None,
                };
                Self::TrueFalseToggle {
                    true_label: TRUE_LABEL.to_string(),
                    false_label: FALSE_LABEL.to_string(),
                    selected,
                }
            }
            QuestionKind::FillInBlank => {
                let current = match answer {
                    Some(AnswerValue::Text(text)) => text.clone(),
                    _ => String::new(),
                };
                let preview_matches = if current.trim().is_empty() {
                    None
                } else {
                    Some(question.preview_matches(&current))
                };
                Self::TextField {
                    current,
                    preview_matches,
                }
            }
        }
    }
}

fn choice_states(question: &Question, selected: impl Fn(OptionId) -> bool) -> Vec<ChoiceState> {
    question
        .options
        .iter()
        .map(|o| ChoiceState {
            option_id: o.id,
            text: o.text.clone(),
            selected: selected(o.id),
        })
        .collect()
}

// ============================================================================
// Post-submission review
// ============================================================================

/// How one option (or the canonical text) relates to the learner's answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Annotation {
    /// Part of the canonical answer.
    Correct,
    /// Chosen by the learner but not part of the canonical answer.
    Incorrect,
    /// Neither canonical nor chosen.
    Neutral,
}

/// One annotated row of a reviewed choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewedOption {
    /// Id of the option.
    pub option_id: OptionId,
    /// Display text of the option.
    pub text: String,
    /// Whether the learner had this option selected.
    pub chosen: bool,
    /// Annotation relative to canonical answer and learner selection.
    pub annotation: Annotation,
}

/// Render-ready post-submission view of one question.
///
/// Built once a [`SubmissionResult`] exists; the question's input is
/// permanently disabled from that point until the block is re-entered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "review", rename_all = "snake_case")]
pub enum AnswerReview {
    /// Annotated options of a single-choice question.
    SingleChoice {
        /// All options, each annotated.
        options: Vec<ReviewedOption>,
    },
    /// Annotated options of a multiple-choice question.
    MultipleChoice {
        /// All options, each annotated.
        options: Vec<ReviewedOption>,
    },
    /// The annotated true/false pair.
    TrueFalse {
        /// Both rows of the pair, each annotated.
        options: Vec<ReviewedOption>,
    },
    /// Canonical versus submitted text for fill-in-blank.
    FillInBlank {
        /// What the learner submitted.
        submitted: String,
        /// The canonical answer text.
        canonical: String,
        /// The server's authoritative verdict.
        is_correct: bool,
    },
}

impl AnswerReview {
    /// Builds the review for `question` from the learner's answer and the
    /// authoritative result.
    ///
    /// Choice options are annotated from the question's own correctness
    /// flags (canonical answer); the overall verdict for fill-in-blank
    /// comes from the result, never from the cosmetic local comparison.
    #[must_use]
    pub fn for_submission(
        question: &Question,
        answer: Option<&AnswerValue>,
        result: &SubmissionResult,
    ) -> Self {
        match question.question_type {
            QuestionKind::SingleChoice => {
                let chosen = match answer {
                    Some(AnswerValue::Option(id)) => Some(*id),
                    _ => None,
                };
                Self::SingleChoice {
                    options: reviewed_options(question, |id| chosen == Some(id)),
                }
            }
            QuestionKind::MultipleChoice => {
                let empty = std::collections::BTreeSet::new();
                let chosen = match answer {
                    Some(AnswerValue::Options(ids)) => ids,
                    _ => &empty,
                };
                Self::MultipleChoice {
                    options: reviewed_options(question, |id| chosen.contains(&id)),
                }
            }
            QuestionKind::TrueFalse => {
                // Map the boolean answer onto the option pair: the option
                // flagged correct stands for the canonical truth value.
                let canonical = question.correct_bool();
                let learner = match answer {
                    Some(AnswerValue::Bool(value)) => Some(*value),
                    _ => None,
                };
                let chosen = |option_correct: bool| match (learner, canonical) {
                    (Some(l), Some(c)) => option_correct == (l == c),
                    _ => false,
                };
                let options = question
                    .options
                    .iter()
                    .map(|o| {
                        let is_chosen = chosen(o.is_correct);
                        ReviewedOption {
                            option_id: o.id,
                            text: o.text.clone(),
                            chosen: is_chosen,
                            annotation: annotate(o.is_correct, is_chosen),
                        }
                    })
                    .collect();
                Self::TrueFalse { options }
            }
            QuestionKind::FillInBlank => {
                let submitted = match answer {
                    Some(AnswerValue::Text(text)) => text.clone(),
                    _ => String::new(),
                };
                Self::FillInBlank {
                    submitted,
                    canonical: question.correct_answer_text.clone(),
                    is_correct: result.is_correct,
                }
            }
        }
    }
}

fn reviewed_options(
    question: &Question,
    chosen: impl Fn(OptionId) -> bool,
) -> Vec<ReviewedOption> {
    question
        .options
        .iter()
        .map(|o| {
            let is_chosen = chosen(o.id);
            ReviewedOption {
                option_id: o.id,
                text: o.text.clone(),
                chosen: is_chosen,
                annotation: annotate(o.is_correct, is_chosen),
            }
        })
        .collect()
}

/// Annotation rule shared by every choice rendering: canonical options are
/// marked correct, chosen-but-wrong options incorrect, the rest neutral.
const fn annotate(is_canonical: bool, is_chosen: bool) -> Annotation {
    if is_canonical {
        Annotation::Correct
    } else if is_chosen {
        Annotation::Incorrect
    } else {
        Annotation::Neutral
    }
}

// ============================================================================
// Tests
// ============================================================================
