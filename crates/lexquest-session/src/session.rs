//! The lesson session controller.
//!
//! This module defines the state machine for one learner taking one lesson:
//! loading the document, navigating blocks, collecting and submitting
//! answers, completing the lesson, and handing off XP, notifications, and
//! navigation to the injected collaborators.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use lexquest_content::{
    AnswerSubmission, AnswerValue, CompletionResult, Lesson, LessonId, ModuleId, OptionId,
    Question, QuestionId, QuestionKind, SubmissionResult,
};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::answers::AnswerStore;
use crate::collaborators::{LessonBackend, Navigator, Notifier, ProfileSink, Severity};
use crate::config::SessionConfig;
use crate::error::{Result, SessionError};
use crate::sequencer::BlockSequencer;
use crate::variant::{AnswerReview, InputWidget};

// ============================================================================
// SessionPhase and QuestionPhase
// ============================================================================

/// Lifecycle phase of the session.
///
/// The phase transitions through these states:
/// - `Loading` -> `Ready` (document fetched) or `Failed` (fetch failed)
/// - `Ready` -> `Completing` -> `Completed` (lesson completion)
/// - `Completing` -> `Ready` (completion failed, retry permitted)
/// - `Failed` -> `Loading` (manual reload)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// The lesson document is being fetched.
    #[default]
    Loading,
    /// The lesson is on screen and interactive.
    Ready,
    /// A completion request is in flight.
    Completing,
    /// The lesson was completed; the redirect is pending or done.
    Completed,
    /// The initial load failed; a manual reload is the only way out.
    Failed,
}

impl SessionPhase {
    /// Returns `true` if learner input is accepted in this phase.
    #[must_use]
    pub const fn is_interactive(&self) -> bool {
        matches!(self, Self::Ready)
    }
}

/// Per-question phase within the active block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionPhase {
    /// The answer is editable; nothing has been sent.
    Answering,
    /// A submission is in flight; input is locked, duplicate sends barred.
    Submitting,
    /// A result is stored; input stays locked until the block is re-entered.
    Answered,
}

// ============================================================================
// SessionState
// ============================================================================

/// Mutable state behind the session handle.
#[derive(Debug, Default)]
struct SessionState {
    phase: SessionPhase,
    lesson: Option<Lesson>,
    sequencer: Option<BlockSequencer>,
    answers: AnswerStore,
    results: HashMap<QuestionId, SubmissionResult>,
    in_flight: HashSet<QuestionId>,
    /// Bumped on every block move; responses from an older epoch are stale.
    block_epoch: u64,
    completion: Option<CompletionResult>,
    failure: Option<String>,
    closed: bool,
}

impl SessionState {
    /// The question with `question_id` in the active block.
    fn active_question(&self, question_id: QuestionId) -> Result<&Question> {
        self.sequencer
            .as_ref()
            .and_then(BlockSequencer::current)
            .and_then(|block| block.question(question_id))
            .ok_or_else(|| SessionError::not_found("question", question_id))
    }

    fn question_phase(&self, question_id: QuestionId) -> QuestionPhase {
        if self.in_flight.contains(&question_id) {
            QuestionPhase::Submitting
        } else if self.results.contains_key(&question_id) {
            QuestionPhase::Answered
        } else {
            QuestionPhase::Answering
        }
    }

    /// Guards every learner-initiated operation.
    fn ensure_interactive(&self) -> Result<()> {
        if self.closed {
            return Err(SessionError::Closed);
        }
        match self.phase {
            SessionPhase::Ready => Ok(()),
            SessionPhase::Loading => Err(SessionError::validation("Урок ещё загружается")),
            SessionPhase::Completing => {
                Err(SessionError::validation("Завершение урока уже выполняется"))
            }
            SessionPhase::Completed => Err(SessionError::validation("Урок уже завершён")),
            SessionPhase::Failed => Err(SessionError::validation("Урок не загружен")),
        }
    }

    /// Rejects writes to a question that is in flight or already answered.
    fn ensure_unlocked(&self, question_id: QuestionId) -> Result<()> {
        match self.question_phase(question_id) {
            QuestionPhase::Answering => Ok(()),
            QuestionPhase::Submitting => {
                Err(SessionError::validation("Ответ уже отправляется"))
            }
            QuestionPhase::Answered => Err(SessionError::validation("Ответ уже отправлен")),
        }
    }

    /// Drops all per-block volatile state and advances the epoch.
    fn clear_block_state(&mut self) {
        self.answers.clear();
        self.results.clear();
        self.in_flight.clear();
        self.block_epoch += 1;
    }
}

// ============================================================================
// SessionSnapshot
// ============================================================================

/// Serializable render-ready view of the session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    /// Lifecycle phase.
    pub phase: SessionPhase,
    /// Title of the loaded lesson, if any.
    pub lesson_title: Option<String>,
    /// 0-based index of the active block.
    pub block_index: usize,
    /// Total number of blocks.
    pub block_count: usize,
    /// Whether the active block is the last one (completion is offered).
    pub on_last_block: bool,
    /// Phase of every question in the active block, in document order.
    pub question_phases: Vec<(QuestionId, QuestionPhase)>,
    /// The completion outcome, once the lesson was completed.
    pub completion: Option<CompletionResult>,
    /// The load failure message while in the failed phase.
    pub failure: Option<String>,
}

// ============================================================================
// LessonSession
// ============================================================================

/// Clonable handle driving one lesson-taking session.
///
/// All mutable state lives behind an `Arc<Mutex>`; clones observe the same
/// session. Collaborators are explicit handles injected at construction.
#[derive(Clone)]
pub struct LessonSession {
    state: Arc<Mutex<SessionState>>,
    backend: Arc<dyn LessonBackend>,
    profile: Arc<dyn ProfileSink>,
    notifier: Arc<dyn Notifier>,
    navigator: Arc<dyn Navigator>,
    config: SessionConfig,
}

impl LessonSession {
    /// Creates a session over the given collaborators.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Validation` if `config` fails validation.
    pub fn new(
        backend: Arc<dyn LessonBackend>,
        profile: Arc<dyn ProfileSink>,
        notifier: Arc<dyn Notifier>,
        navigator: Arc<dyn Navigator>,
        config: SessionConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            state: Arc::new(Mutex::new(SessionState::default())),
            backend,
            profile,
            notifier,
            navigator,
            config,
        })
    }

    // ------------------------------------------------------------------
    // Loading
    // ------------------------------------------------------------------

    /// Fetches the lesson document and enters the ready phase.
    ///
    /// A failed load enters the failed phase with an error notification;
    /// calling `load` again re-enters the loading phase.
    ///
    /// # Errors
    ///
    /// Propagates backend failures; `NotFound` carries the distinct
    /// "lesson missing" case. Returns `SessionError::Closed` if the session
    /// was closed while the fetch was in flight.
    pub async fn load(&self, lesson_id: LessonId) -> Result<()> {
        {
            let mut state = self.state.lock().await;
            if state.closed {
                return Err(SessionError::Closed);
            }
            state.phase = SessionPhase::Loading;
            state.lesson = None;
            state.sequencer = None;
            state.completion = None;
            state.failure = None;
            state.clear_block_state();
        }
        info!(lesson_id, "loading lesson");

        let fetched = self.backend.fetch_lesson(lesson_id).await;

        let mut state = self.state.lock().await;
        if state.closed {
            return Err(SessionError::Closed);
        }
        match fetched {
            Ok(lesson) => {
                let sequencer =
                    BlockSequencer::new(&lesson, self.config.start_on_first_theory_block);
                info!(
                    lesson_id,
                    title = %lesson.title,
                    blocks = sequencer.len(),
                    start_index = sequencer.current_index(),
                    "lesson loaded"
                );
                state.lesson = Some(lesson);
                state.sequencer = Some(sequencer);
                state.phase = SessionPhase::Ready;
                Ok(())
            }
            Err(err) => {
                warn!(lesson_id, error = %err, "lesson load failed");
                let message = match &err {
                    SessionError::NotFound { .. } => "Урок не найден".to_string(),
                    _ => "Не удалось загрузить урок".to_string(),
                };
                state.phase = SessionPhase::Failed;
                state.failure = Some(message.clone());
                drop(state);
                self.notifier.notify(&message, Severity::Error);
                Err(err)
            }
        }
    }

    // ------------------------------------------------------------------
    // Answering
    // ------------------------------------------------------------------

    /// Stores `value` as the current answer for `question_id`.
    ///
    /// Local only; nothing is sent until `submit_answer`. Overwrites any
    /// prior answer (single choice, true/false, fill-in-blank).
    ///
    /// # Errors
    ///
    /// Rejects writes when the session is not interactive, the question is
    /// not in the active block, the value shape does not match the question
    /// kind, a referenced option id does not exist, or the question is
    /// locked by a pending or stored submission.
    pub async fn set_answer(&self, question_id: QuestionId, value: AnswerValue) -> Result<()> {
        let mut state = self.state.lock().await;
        state.ensure_interactive()?;
        state.ensure_unlocked(question_id)?;
        let question = state.active_question(question_id)?;
        check_answer_shape(question, &value)?;
        state.answers.set(question_id, value);
        Ok(())
    }

    /// Toggles `option_id` in the multiple-choice selection of `question_id`.
    ///
    /// # Errors
    ///
    /// Rejects the toggle under the same guards as [`Self::set_answer`], and
    /// additionally when the question is not multiple choice.
    pub async fn toggle_option(&self, question_id: QuestionId, option_id: OptionId) -> Result<()> {
        let mut state = self.state.lock().await;
        state.ensure_interactive()?;
        state.ensure_unlocked(question_id)?;
        let question = state.active_question(question_id)?;
        if question.question_type != QuestionKind::MultipleChoice {
            return Err(SessionError::validation(format!(
                "Вопрос {question_id} не допускает множественный выбор"
            )));
        }
        if question.option_text(option_id).is_none() {
            return Err(SessionError::not_found("option", option_id));
        }
        state.answers.toggle_option(question_id, option_id);
        Ok(())
    }

    /// Submits the stored answer for `question_id` to the backend.
    ///
    /// An unanswered or empty answer is rejected locally with a validation
    /// error and zero backend calls. While the submission is in flight the
    /// question is locked against edits and duplicate sends; submissions for
    /// other questions may proceed concurrently. On success the result locks
    /// the question and positive XP is propagated immediately; on failure
    /// the question unlocks with the answer intact and retry is permitted.
    ///
    /// # Errors
    ///
    /// Returns validation errors for the local rejections above, backend
    /// errors verbatim, and `SessionError::Closed` when the session was
    /// closed while the submission was in flight.
    pub async fn submit_answer(&self, question_id: QuestionId) -> Result<SubmissionResult> {
        let (value, epoch) = {
            let mut state = self.state.lock().await;
            state.ensure_interactive()?;
            state.ensure_unlocked(question_id)?;
            let question = state.active_question(question_id)?;
            let value = match state.answers.get(question_id) {
                Some(value) if value.is_submittable() => value.clone(),
                _ => {
                    return Err(SessionError::validation("Пожалуйста, выберите ответ"));
                }
            };
            check_answer_shape(question, &value)?;
            state.in_flight.insert(question_id);
            (value, state.block_epoch)
        };
        debug!(question_id, "submitting answer");

        let submission = AnswerSubmission {
            question_id,
            user_answer: value,
        };
        let outcome = self.backend.submit_answer(question_id, submission).await;

        let mut state = self.state.lock().await;
        if state.closed {
            // Unmounted while in flight: drop the response on the floor.
            return Err(SessionError::Closed);
        }
        state.in_flight.remove(&question_id);
        match outcome {
            Ok(result) => {
                if state.block_epoch == epoch {
                    state.results.insert(question_id, result.clone());
                } else {
                    // The learner navigated away; the server already awarded
                    // the XP, so propagate it, but the result has no home.
                    debug!(question_id, "discarding result from a previous block");
                }
                drop(state);
                info!(
                    question_id,
                    is_correct = result.is_correct,
                    xp = result.xp_awarded,
                    "answer graded"
                );
                if result.xp_awarded > 0 {
                    self.profile.add_xp(result.xp_awarded);
                    self.notifier
                        .notify(&format!("+{} XP", result.xp_awarded), Severity::Success);
                }
                Ok(result)
            }
            Err(err) => {
                drop(state);
                warn!(question_id, error = %err, "answer submission failed");
                self.notifier
                    .notify("Не удалось отправить ответ", Severity::Error);
                Err(err)
            }
        }
    }

    // ------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------

    /// Advances to the next block. No-op at the last block.
    ///
    /// Moving clears the answers, results, and pending submissions of the
    /// block being left; re-entering it later starts from a blank slate.
    pub async fn next_block(&self) -> bool {
        let mut state = self.state.lock().await;
        if state.ensure_interactive().is_err() {
            return false;
        }
        let moved = state.sequencer.as_mut().is_some_and(BlockSequencer::next);
        if moved {
            state.clear_block_state();
            debug!(epoch = state.block_epoch, "moved to next block");
        }
        moved
    }

    /// Steps back to the previous block. No-op at the first block.
    ///
    /// Clears volatile state exactly as [`Self::next_block`] does.
    pub async fn prev_block(&self) -> bool {
        let mut state = self.state.lock().await;
        if state.ensure_interactive().is_err() {
            return false;
        }
        let moved = state.sequencer.as_mut().is_some_and(BlockSequencer::prev);
        if moved {
            state.clear_block_state();
            debug!(epoch = state.block_epoch, "moved to previous block");
        }
        moved
    }

    // ------------------------------------------------------------------
    // Completion
    // ------------------------------------------------------------------

    /// Completes the lesson. Offered only on the last block.
    ///
    /// On success the completion result is stored, positive XP propagated,
    /// a confirmation raised (the XP toast is suppressed for a zero-delta
    /// repeat completion), and navigation to the parent module scheduled
    /// after the configured delay. On failure the session returns to the
    /// ready phase and retry is permitted.
    ///
    /// # Errors
    ///
    /// Rejects the attempt when the session is not interactive, the active
    /// block is not the last one, or the answered-questions policy is not
    /// satisfied; propagates backend failures; returns `SessionError::Closed`
    /// when the session was closed while the request was in flight.
    pub async fn complete(&self) -> Result<CompletionResult> {
        let (lesson_id, module_id) = {
            let mut state = self.state.lock().await;
            state.ensure_interactive()?;
            let on_last = state.sequencer.as_ref().is_some_and(BlockSequencer::is_last);
            if !on_last {
                return Err(SessionError::validation(
                    "Завершение доступно только на последнем блоке",
                ));
            }
            if self.config.require_all_answered_before_completion {
                let unanswered = state
                    .sequencer
                    .as_ref()
                    .and_then(BlockSequencer::current)
                    .map_or(false, |block| {
                        block
                            .questions
                            .iter()
                            .any(|q| !state.results.contains_key(&q.id))
                    });
                if unanswered {
                    return Err(SessionError::validation(
                        "Сначала ответьте на все вопросы блока",
                    ));
                }
            }
            let lesson = state
                .lesson
                .as_ref()
                .ok_or_else(|| SessionError::validation("Урок не загружен"))?;
            let ids = (lesson.id, lesson.module_id);
            state.phase = SessionPhase::Completing;
            ids
        };
        info!(lesson_id, "completing lesson");

        let outcome = self.backend.complete_lesson(lesson_id).await;

        let mut state = self.state.lock().await;
        if state.closed {
            return Err(SessionError::Closed);
        }
        match outcome {
            Ok(result) => {
                state.phase = SessionPhase::Completed;
                state.completion = Some(result.clone());
                if let Some(lesson) = state.lesson.as_mut() {
                    lesson.is_completed_by_user = true;
                }
                drop(state);
                info!(
                    lesson_id,
                    xp = result.xp_earned_for_this_completion,
                    first = result.is_first_completion,
                    "lesson completed"
                );
                if result.xp_earned_for_this_completion > 0 {
                    self.profile.add_xp(result.xp_earned_for_this_completion);
                    self.notifier.notify(
                        &format!(
                            "Урок завершён! +{} XP",
                            result.xp_earned_for_this_completion
                        ),
                        Severity::Success,
                    );
                } else {
                    // Repeat completion: no XP toast, but the learner still
                    // gets the terminal confirmation.
                    self.notifier.notify("Урок завершён", Severity::Success);
                }
                self.schedule_redirect(module_id);
                Ok(result)
            }
            Err(err) => {
                state.phase = SessionPhase::Ready;
                drop(state);
                warn!(lesson_id, error = %err, "lesson completion failed");
                self.notifier
                    .notify("Не удалось завершить урок", Severity::Error);
                Err(err)
            }
        }
    }

    /// Navigates to the parent module after the configured grace period,
    /// unless the session was closed in the interim.
    fn schedule_redirect(&self, module_id: ModuleId) {
        let state = Arc::clone(&self.state);
        let navigator = Arc::clone(&self.navigator);
        let delay = Duration::from_secs(self.config.redirect_delay_secs);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if state.lock().await.closed {
                debug!(module_id, "redirect cancelled, session closed");
                return;
            }
            debug!(module_id, "redirecting to module");
            navigator.go_to_module(module_id);
        });
    }

    // ------------------------------------------------------------------
    // Teardown and views
    // ------------------------------------------------------------------

    /// Closes the session (the view unmounted).
    ///
    /// Responses resolving after this point mutate nothing, raise no
    /// notifications, and never navigate.
    pub async fn close(&self) {
        let mut state = self.state.lock().await;
        state.closed = true;
        debug!("session closed");
    }

    /// Builds the input widget for a question of the active block.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the question is not in the active block.
    pub async fn input_widget(&self, question_id: QuestionId) -> Result<InputWidget> {
        let state = self.state.lock().await;
        let question = state.active_question(question_id)?;
        Ok(InputWidget::for_question(
            question,
            state.answers.get(question_id),
        ))
    }

    /// Builds the post-submission review for a question of the active block,
    /// or `None` while no result is stored.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the question is not in the active block.
    pub async fn answer_review(&self, question_id: QuestionId) -> Result<Option<AnswerReview>> {
        let state = self.state.lock().await;
        let question = state.active_question(question_id)?;
        Ok(state.results.get(&question_id).map(|result| {
            AnswerReview::for_submission(question, state.answers.get(question_id), result)
        }))
    }

    /// Captures a serializable view of the current state.
    pub async fn snapshot(&self) -> SessionSnapshot {
        let state = self.state.lock().await;
        let question_phases = state
            .sequencer
            .as_ref()
            .and_then(BlockSequencer::current)
            .map(|block| {
                block
                    .questions
                    .iter()
                    .map(|q| (q.id, state.question_phase(q.id)))
                    .collect()
            })
            .unwrap_or_default();
        SessionSnapshot {
            phase: state.phase,
            lesson_title: state.lesson.as_ref().map(|l| l.title.clone()),
            block_index: state
                .sequencer
                .as_ref()
                .map_or(0, BlockSequencer::current_index),
            block_count: state.sequencer.as_ref().map_or(0, BlockSequencer::len),
            on_last_block: state.sequencer.as_ref().is_some_and(BlockSequencer::is_last),
            question_phases,
            completion: state.completion.clone(),
            failure: state.failure.clone(),
        }
    }
}

/// Rejects an answer whose shape does not fit the question, or that
/// references option ids the question does not carry.
fn check_answer_shape(question: &Question, value: &AnswerValue) -> Result<()> {
    if !value.matches_kind(question.question_type) {
        return Err(SessionError::validation(format!(
            "Ответ не подходит вопросу типа {}",
            question.question_type
        )));
    }
    match value {
        AnswerValue::Option(id) => {
            if question.option_text(*id).is_none() {
                return Err(SessionError::not_found("option", *id));
            }
        }
        AnswerValue::Options(ids) => {
            for id in ids {
                if question.option_text(*id).is_none() {
                    return Err(SessionError::not_found("option", *id));
                }
            }
        }
        AnswerValue::Bool(_) | AnswerValue::Text(_) => {}
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
