//! End-to-end lesson session tests.
//!
//! These tests drive `LessonSession` against the reference backend from
//! `lexquest-scoring`, with recording collaborators standing in for the
//! profile, notification, and navigation surfaces.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::sync::Mutex as StdMutex;
use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;
use lexquest_content::{
    AnswerSubmission, AnswerValue, CompletionResult, Lesson, SubmissionResult,
};
use lexquest_scoring::LocalBackend;
use lexquest_session::{
    LessonBackend, LessonSession, Navigator, Notifier, ProfileSink, QuestionPhase, SessionConfig,
    SessionError, SessionPhase, Severity,
};

// ============================================================================
// Fixtures and collaborators
// ============================================================================

/// Loads the lesson fixture shared by these tests.
fn fixture_lesson() -> Lesson {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures/lesson.json");
    let raw = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read fixture at {path:?}: {e}"));
    serde_json::from_str(&raw).expect("Failed to parse lesson fixture")
}

#[derive(Default)]
struct RecordingSink {
    total: AtomicU64,
}

impl ProfileSink for RecordingSink {
    fn add_xp(&self, delta: u32) {
        self.total.fetch_add(u64::from(delta), Ordering::SeqCst);
    }
}

#[derive(Default)]
struct RecordingNotifier {
    messages: StdMutex<Vec<(String, Severity)>>,
}

impl RecordingNotifier {
    fn messages(&self) -> Vec<(String, Severity)> {
        self.messages.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, message: &str, severity: Severity) {
        self.messages
            .lock()
            .unwrap()
            .push((message.to_string(), severity));
    }
}

#[derive(Default)]
struct RecordingNavigator {
    visited: StdMutex<Vec<i64>>,
}

impl Navigator for RecordingNavigator {
    fn go_to_module(&self, module_id: i64) {
        self.visited.lock().unwrap().push(module_id);
    }
}

/// Wraps a backend, counting scoring calls and optionally failing them.
struct CountingBackend {
    inner: LocalBackend,
    submit_calls: AtomicUsize,
    failures_left: StdMutex<usize>,
    complete_failures_left: StdMutex<usize>,
}

impl CountingBackend {
    fn new(inner: LocalBackend) -> Self {
        Self {
            inner,
            submit_calls: AtomicUsize::new(0),
            failures_left: StdMutex::new(0),
            complete_failures_left: StdMutex::new(0),
        }
    }
}

impl LessonBackend for CountingBackend {
    fn fetch_lesson(&self, lesson_id: i64) -> BoxFuture<'_, Result<Lesson, SessionError>> {
        self.inner.fetch_lesson(lesson_id)
    }

    fn submit_answer(
        &self,
        question_id: i64,
        submission: AnswerSubmission,
    ) -> BoxFuture<'_, Result<SubmissionResult, SessionError>> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        async move {
            {
                let mut failures = self.failures_left.lock().unwrap();
                if *failures > 0 {
                    *failures -= 1;
                    return Err(SessionError::network("connection reset"));
                }
            }
            self.inner.submit_answer(question_id, submission).await
        }
        .boxed()
    }

    fn complete_lesson(
        &self,
        lesson_id: i64,
    ) -> BoxFuture<'_, Result<CompletionResult, SessionError>> {
        async move {
            {
                let mut failures = self.complete_failures_left.lock().unwrap();
                if *failures > 0 {
                    *failures -= 1;
                    return Err(SessionError::network("connection reset"));
                }
            }
            self.inner.complete_lesson(lesson_id).await
        }
        .boxed()
    }
}

/// Backend whose submissions block until the test releases a gate.
struct GatedBackend {
    inner: LocalBackend,
    gate: StdMutex<Option<tokio::sync::oneshot::Receiver<()>>>,
}

impl LessonBackend for GatedBackend {
    fn fetch_lesson(&self, lesson_id: i64) -> BoxFuture<'_, Result<Lesson, SessionError>> {
        self.inner.fetch_lesson(lesson_id)
    }

    fn submit_answer(
        &self,
        question_id: i64,
        submission: AnswerSubmission,
    ) -> BoxFuture<'_, Result<SubmissionResult, SessionError>> {
        let gate = self.gate.lock().unwrap().take();
        async move {
            if let Some(gate) = gate {
                let _ = gate.await;
            }
            self.inner.submit_answer(question_id, submission).await
        }
        .boxed()
    }

    fn complete_lesson(
        &self,
        lesson_id: i64,
    ) -> BoxFuture<'_, Result<CompletionResult, SessionError>> {
        self.inner.complete_lesson(lesson_id)
    }
}

struct Harness {
    session: LessonSession,
    sink: Arc<RecordingSink>,
    notifier: Arc<RecordingNotifier>,
    navigator: Arc<RecordingNavigator>,
}

fn harness_with(backend: Arc<dyn LessonBackend>, config: SessionConfig) -> Harness {
    let sink = Arc::new(RecordingSink::default());
    let notifier = Arc::new(RecordingNotifier::default());
    let navigator = Arc::new(RecordingNavigator::default());
    let session = LessonSession::new(
        backend,
        Arc::clone(&sink) as Arc<dyn ProfileSink>,
        Arc::clone(&notifier) as Arc<dyn Notifier>,
        Arc::clone(&navigator) as Arc<dyn Navigator>,
        config,
    )
    .expect("valid config");
    Harness {
        session,
        sink,
        notifier,
        navigator,
    }
}

fn harness(config: SessionConfig) -> Harness {
    let backend = LocalBackend::with_lessons([fixture_lesson()]).expect("valid fixture");
    harness_with(Arc::new(backend), config)
}

fn zero_delay() -> SessionConfig {
    SessionConfig {
        redirect_delay_secs: 0,
        ..SessionConfig::default()
    }
}

// ============================================================================
// Scenario tests
// ============================================================================

/// Theory block first, then a single-choice exercise: selecting the correct
/// option id yields a correct verdict and 10 XP.
#[tokio::test]
async fn test_scenario_correct_single_choice() {
    let h = harness(SessionConfig::default());
    h.session.load(7).await.unwrap();

    let snapshot = h.session.snapshot().await;
    assert_eq!(snapshot.phase, SessionPhase::Ready);
    assert_eq!(snapshot.block_index, 0);

    assert!(h.session.next_block().await);
    // Selecting A then B leaves exactly B selected.
    h.session.set_answer(100, AnswerValue::Option(1)).await.unwrap();
    h.session.set_answer(100, AnswerValue::Option(2)).await.unwrap();

    let result = h.session.submit_answer(100).await.unwrap();
    assert!(result.is_correct);
    assert_eq!(result.xp_awarded, 10);
    assert_eq!(result.explanation, "Федеральные законы принимает Государственная Дума.");

    assert_eq!(h.sink.total.load(Ordering::SeqCst), 10);
    assert_eq!(
        h.notifier.messages(),
        vec![("+10 XP".to_string(), Severity::Success)]
    );

    let snapshot = h.session.snapshot().await;
    assert_eq!(snapshot.question_phases, vec![(100, QuestionPhase::Answered)]);
}

/// Completing without answering anything succeeds: 25 XP, first completion,
/// and the redirect to the parent module fires after the delay.
#[tokio::test]
async fn test_scenario_completion_without_answering() {
    let h = harness(zero_delay());
    h.session.load(7).await.unwrap();

    assert!(h.session.next_block().await);
    assert!(h.session.next_block().await);
    assert!(!h.session.next_block().await);

    let completion = h.session.complete().await.unwrap();
    assert!(completion.is_first_completion);
    assert_eq!(completion.xp_earned_for_this_completion, 25);
    assert_eq!(completion.current_total_user_xp, 25);

    assert_eq!(h.sink.total.load(Ordering::SeqCst), 25);
    assert_eq!(
        h.notifier.messages(),
        vec![("Урок завершён! +25 XP".to_string(), Severity::Success)]
    );

    // Give the scheduled zero-delay redirect a chance to run.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(*h.navigator.visited.lock().unwrap(), vec![3]);

    let snapshot = h.session.snapshot().await;
    assert_eq!(snapshot.phase, SessionPhase::Completed);
}

/// Completing an already-completed lesson succeeds idempotently with a zero
/// delta: no XP toast, but the completion confirmation is still raised.
#[tokio::test]
async fn test_scenario_repeat_completion() {
    let backend = Arc::new(LocalBackend::with_lessons([fixture_lesson()]).unwrap());

    let first = harness_with(Arc::clone(&backend) as Arc<dyn LessonBackend>, zero_delay());
    first.session.load(7).await.unwrap();
    first.session.next_block().await;
    first.session.next_block().await;
    first.session.complete().await.unwrap();
    first.session.close().await;

    let second = harness_with(Arc::clone(&backend) as Arc<dyn LessonBackend>, zero_delay());
    second.session.load(7).await.unwrap();
    let snapshot = second.session.snapshot().await;
    assert_eq!(snapshot.phase, SessionPhase::Ready);

    second.session.next_block().await;
    second.session.next_block().await;
    let completion = second.session.complete().await.unwrap();

    assert!(!completion.is_first_completion);
    assert_eq!(completion.xp_earned_for_this_completion, 0);
    assert_eq!(completion.current_total_user_xp, 25);

    // No XP reached the profile and no "+0 XP" toast was raised.
    assert_eq!(second.sink.total.load(Ordering::SeqCst), 0);
    assert_eq!(
        second.notifier.messages(),
        vec![("Урок завершён".to_string(), Severity::Success)]
    );
}

// ============================================================================
// Validation and locking
// ============================================================================

/// Submitting with no stored answer is rejected locally for every question
/// kind, with zero backend calls.
#[tokio::test]
async fn test_submit_without_answer_never_reaches_backend() {
    let inner = LocalBackend::with_lessons([fixture_lesson()]).unwrap();
    let backend = Arc::new(CountingBackend::new(inner));
    let h = harness_with(Arc::clone(&backend) as Arc<dyn LessonBackend>, zero_delay());
    h.session.load(7).await.unwrap();

    // Single choice on block 2.
    h.session.next_block().await;
    assert!(matches!(
        h.session.submit_answer(100).await,
        Err(SessionError::Validation { .. })
    ));

    // Multiple choice, true/false, and fill-in-blank on block 3.
    h.session.next_block().await;
    for question_id in [101, 102, 103] {
        assert!(matches!(
            h.session.submit_answer(question_id).await,
            Err(SessionError::Validation { .. })
        ));
    }

    // A blank fill-in answer is equally unanswered.
    h.session
        .set_answer(103, AnswerValue::Text("   ".to_string()))
        .await
        .unwrap();
    assert!(matches!(
        h.session.submit_answer(103).await,
        Err(SessionError::Validation { .. })
    ));

    assert_eq!(backend.submit_calls.load(Ordering::SeqCst), 0);
}

/// Double-toggling a multiple-choice option restores the previous selection,
/// and an emptied selection cannot be submitted.
#[tokio::test]
async fn test_toggle_is_idempotent_in_pairs() {
    let inner = LocalBackend::with_lessons([fixture_lesson()]).unwrap();
    let backend = Arc::new(CountingBackend::new(inner));
    let h = harness_with(Arc::clone(&backend) as Arc<dyn LessonBackend>, zero_delay());
    h.session.load(7).await.unwrap();
    h.session.next_block().await;
    h.session.next_block().await;

    h.session.toggle_option(101, 10).await.unwrap();
    h.session.toggle_option(101, 12).await.unwrap();
    h.session.toggle_option(101, 11).await.unwrap();
    h.session.toggle_option(101, 11).await.unwrap();

    let result = h.session.submit_answer(101).await.unwrap();
    assert!(result.is_correct);

    // Locked after grading: further toggles are rejected.
    h.session.toggle_option(101, 10).await.unwrap_err();
    assert_eq!(backend.submit_calls.load(Ordering::SeqCst), 1);
}

/// Fill-in-blank correctness comes from the backend, which trims and
/// lowercases; the sloppy-but-right text is graded correct.
#[tokio::test]
async fn test_fill_in_blank_grading_ignores_case_and_whitespace() {
    let h = harness(zero_delay());
    h.session.load(7).await.unwrap();
    h.session.next_block().await;
    h.session.next_block().await;

    h.session
        .set_answer(103, AnswerValue::Text("  конституция ".to_string()))
        .await
        .unwrap();
    let result = h.session.submit_answer(103).await.unwrap();
    assert!(result.is_correct);
    assert_eq!(result.xp_awarded, 10);
}

/// Navigating away and back wipes answers and results for the block.
#[tokio::test]
async fn test_block_navigation_forgets_answers_and_results() {
    let h = harness(zero_delay());
    h.session.load(7).await.unwrap();
    h.session.next_block().await;

    h.session.set_answer(100, AnswerValue::Option(2)).await.unwrap();
    h.session.submit_answer(100).await.unwrap();

    assert!(h.session.prev_block().await);
    assert!(h.session.next_block().await);

    let snapshot = h.session.snapshot().await;
    assert_eq!(snapshot.question_phases, vec![(100, QuestionPhase::Answering)]);

    // The question is editable and re-submittable; re-answering correctly
    // yields no second XP award for the same question.
    h.session.set_answer(100, AnswerValue::Option(2)).await.unwrap();
    let result = h.session.submit_answer(100).await.unwrap();
    assert!(result.is_correct);
    assert_eq!(result.xp_awarded, 0);
}

// ============================================================================
// Failure paths
// ============================================================================

/// A failed submission leaves the answer intact and the question editable;
/// the identical retry succeeds.
#[tokio::test]
async fn test_submit_failure_allows_retry() {
    let inner = LocalBackend::with_lessons([fixture_lesson()]).unwrap();
    let backend = Arc::new(CountingBackend::new(inner));
    *backend.failures_left.lock().unwrap() = 1;
    let h = harness_with(Arc::clone(&backend) as Arc<dyn LessonBackend>, zero_delay());
    h.session.load(7).await.unwrap();
    h.session.next_block().await;

    h.session.set_answer(100, AnswerValue::Option(2)).await.unwrap();
    let err = h.session.submit_answer(100).await.unwrap_err();
    assert!(err.is_retryable());
    assert_eq!(
        h.notifier.messages(),
        vec![("Не удалось отправить ответ".to_string(), Severity::Error)]
    );

    let snapshot = h.session.snapshot().await;
    assert_eq!(snapshot.question_phases, vec![(100, QuestionPhase::Answering)]);

    let result = h.session.submit_answer(100).await.unwrap();
    assert!(result.is_correct);
    assert_eq!(backend.submit_calls.load(Ordering::SeqCst), 2);
}

/// A failed completion returns the session to the ready phase with an error
/// notification and awards nothing; completing again from the same block
/// succeeds.
#[tokio::test]
async fn test_complete_failure_returns_to_ready_and_allows_retry() {
    let inner = LocalBackend::with_lessons([fixture_lesson()]).unwrap();
    let backend = Arc::new(CountingBackend::new(inner));
    *backend.complete_failures_left.lock().unwrap() = 1;
    let h = harness_with(Arc::clone(&backend) as Arc<dyn LessonBackend>, zero_delay());
    h.session.load(7).await.unwrap();
    h.session.next_block().await;
    h.session.next_block().await;

    let err = h.session.complete().await.unwrap_err();
    assert!(err.is_retryable());
    assert_eq!(
        h.notifier.messages(),
        vec![("Не удалось завершить урок".to_string(), Severity::Error)]
    );

    let snapshot = h.session.snapshot().await;
    assert_eq!(snapshot.phase, SessionPhase::Ready);
    assert_eq!(h.sink.total.load(Ordering::SeqCst), 0);
    assert!(h.navigator.visited.lock().unwrap().is_empty());

    let completion = h.session.complete().await.unwrap();
    assert!(completion.is_first_completion);
    assert_eq!(completion.xp_earned_for_this_completion, 25);
    assert_eq!(h.sink.total.load(Ordering::SeqCst), 25);

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(*h.navigator.visited.lock().unwrap(), vec![3]);
}

/// A submission resolving after `close()` mutates nothing: no stored result,
/// no XP, no notification.
#[tokio::test]
async fn test_close_discards_in_flight_submission() {
    let inner = LocalBackend::with_lessons([fixture_lesson()]).unwrap();
    let (release, gate) = tokio::sync::oneshot::channel();
    let backend = Arc::new(GatedBackend {
        inner,
        gate: StdMutex::new(Some(gate)),
    });
    let h = harness_with(Arc::clone(&backend) as Arc<dyn LessonBackend>, zero_delay());
    h.session.load(7).await.unwrap();
    h.session.next_block().await;
    h.session.set_answer(100, AnswerValue::Option(2)).await.unwrap();

    let session = h.session.clone();
    let in_flight = tokio::spawn(async move { session.submit_answer(100).await });

    // Let the submission reach the gate, then unmount and release it.
    tokio::time::sleep(Duration::from_millis(20)).await;
    h.session.close().await;
    release.send(()).unwrap();

    let outcome = in_flight.await.unwrap();
    assert!(matches!(outcome, Err(SessionError::Closed)));
    assert_eq!(h.sink.total.load(Ordering::SeqCst), 0);
    assert!(h.notifier.messages().is_empty());
    assert!(h.navigator.visited.lock().unwrap().is_empty());
}

/// A missing lesson enters the failed phase with the distinct message, and a
/// manual reload with a valid id recovers.
#[tokio::test]
async fn test_load_failure_and_manual_reload() {
    let h = harness(zero_delay());

    assert!(matches!(
        h.session.load(99).await,
        Err(SessionError::NotFound { .. })
    ));
    let snapshot = h.session.snapshot().await;
    assert_eq!(snapshot.phase, SessionPhase::Failed);
    assert_eq!(snapshot.failure.as_deref(), Some("Урок не найден"));

    h.session.load(7).await.unwrap();
    let snapshot = h.session.snapshot().await;
    assert_eq!(snapshot.phase, SessionPhase::Ready);
    assert!(snapshot.failure.is_none());
}

/// Full walkthrough: every question answered correctly, then completion.
/// 4 questions x 10 XP + 25 XP completion bonus.
#[tokio::test]
async fn test_full_walkthrough_accumulates_xp() {
    let h = harness(zero_delay());
    h.session.load(7).await.unwrap();

    h.session.next_block().await;
    h.session.set_answer(100, AnswerValue::Option(2)).await.unwrap();
    h.session.submit_answer(100).await.unwrap();

    h.session.next_block().await;
    h.session.toggle_option(101, 10).await.unwrap();
    h.session.toggle_option(101, 12).await.unwrap();
    h.session.submit_answer(101).await.unwrap();
    h.session.set_answer(102, AnswerValue::Bool(true)).await.unwrap();
    h.session.submit_answer(102).await.unwrap();
    h.session
        .set_answer(103, AnswerValue::Text("Конституция".to_string()))
        .await
        .unwrap();
    h.session.submit_answer(103).await.unwrap();

    let completion = h.session.complete().await.unwrap();
    assert_eq!(completion.current_total_user_xp, 65);
    assert_eq!(h.sink.total.load(Ordering::SeqCst), 65);
}
