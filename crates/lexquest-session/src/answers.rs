//! In-memory answer store for the active block.
//!
//! Holds the mapping from question id to the learner's current (possibly
//! partial) answer. The store covers only the questions of the currently
//! active block; block navigation clears it, so re-entering a block starts
//! from a blank slate. Nothing is persisted until submit.

use std::collections::hash_map::Entry;
use std::collections::{BTreeSet, HashMap};

use lexquest_content::{AnswerValue, OptionId, QuestionId};

/// Mutable map of the learner's current answers, keyed by question id.
///
/// `set` has overwrite semantics (single choice, true/false, fill-in-blank);
/// `toggle_option` has add/remove semantics for multiple choice. An absent
/// entry is the "unanswered" sentinel.
#[derive(Debug, Clone, Default)]
pub struct AnswerStore {
    answers: HashMap<QuestionId, AnswerValue>,
}

impl AnswerStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value` for `question_id`, replacing any prior answer.
    pub fn set(&mut self, question_id: QuestionId, value: AnswerValue) {
        self.answers.insert(question_id, value);
    }

    /// Toggles membership of `option_id` in the multiple-choice selection
    /// for `question_id`.
    ///
    /// A fresh selection is created when the question is unanswered. Any
    /// non-set value stored under the question is replaced; the toggle is
    /// idempotent in pairs: toggling the same option twice restores the
    /// prior selection.
    pub fn toggle_option(&mut self, question_id: QuestionId, option_id: OptionId) {
        match self.answers.entry(question_id) {
            Entry::Occupied(mut occupied) => {
                if let AnswerValue::Options(ids) = occupied.get_mut() {
                    if !ids.insert(option_id) {
                        ids.remove(&option_id);
                    }
                } else {
                    occupied.insert(AnswerValue::Options(BTreeSet::from([option_id])));
                }
            }
            Entry::Vacant(vacant) => {
                vacant.insert(AnswerValue::Options(BTreeSet::from([option_id])));
            }
        }
    }

    /// Returns the stored answer, or `None` when unanswered.
    #[must_use]
    pub fn get(&self, question_id: QuestionId) -> Option<&AnswerValue> {
        self.answers.get(&question_id)
    }

    /// Discards every stored answer. Invoked on block navigation and at
    /// session end.
    pub fn clear(&mut self) {
        self.answers.clear();
    }

    /// Number of answered questions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.answers.len()
    }

    /// Whether no question has an answer.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }
}
