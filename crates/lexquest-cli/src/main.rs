//! Lexquest CLI
//!
//! Entry point for validating lesson documents, serving the scoring API,
//! and replaying a lesson session locally.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use lexquest_content::{validate_lesson, AnswerValue, Lesson, Question, QuestionKind};
use lexquest_scoring::{create_router, AppState, LocalBackend};
use lexquest_session::{
    LessonBackend, LessonSession, Navigator, Notifier, ProfileSink, SessionConfig, Severity,
};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

/// Default port for the scoring API server.
const DEFAULT_PORT: u16 = 8000;

/// Lexquest - Interactive Lesson Engine
///
/// Validates lesson documents, serves the reference scoring API, and replays
/// full lesson sessions from the command line.
#[derive(Parser, Debug)]
#[command(name = "lexquest")]
#[command(version, about, long_about = None)]
struct Args {
    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate a lesson document against the content invariants
    Validate {
        /// Path to the lesson JSON file
        #[arg(value_name = "LESSON")]
        lesson: PathBuf,
    },

    /// Serve the scoring API over a directory of lesson documents
    Serve {
        /// Directory containing lesson JSON files
        #[arg(value_name = "DIR")]
        lessons_dir: PathBuf,

        /// Port for the HTTP API server
        #[arg(short, long, default_value_t = DEFAULT_PORT)]
        port: u16,
    },

    /// Replay a full lesson session against the in-process backend
    Run {
        /// Path to the lesson JSON file
        #[arg(value_name = "LESSON")]
        lesson: PathBuf,

        /// Answer every question correctly instead of deliberately wrong
        #[arg(long)]
        answer_correctly: bool,

        /// Seconds to wait before the post-completion redirect
        #[arg(long, default_value_t = 1)]
        redirect_delay_secs: u64,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if args.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let result = match args.command {
        Command::Validate { lesson } => run_validate(&lesson),
        Command::Serve { lessons_dir, port } => run_serve(&lessons_dir, port).await,
        Command::Run {
            lesson,
            answer_correctly,
            redirect_delay_secs,
        } => run_replay(&lesson, answer_correctly, redirect_delay_secs).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(1)
        }
    }
}

/// Loads and parses one lesson document.
fn load_lesson(path: &Path) -> anyhow::Result<Lesson> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {e}", path.display()))?;
    let lesson: Lesson = serde_json::from_str(&raw)
        .map_err(|e| anyhow::anyhow!("Failed to parse {}: {e}", path.display()))?;
    Ok(lesson)
}

/// Runs `lexquest validate`.
fn run_validate(path: &Path) -> anyhow::Result<()> {
    let lesson = load_lesson(path)?;
    validate_lesson(&lesson)
        .map_err(|e| anyhow::anyhow!("{}: invalid lesson: {e}", path.display()))?;

    let questions: usize = lesson.blocks.iter().map(|b| b.questions.len()).sum();
    println!(
        "{}: OK ({} blocks, {} questions)",
        path.display(),
        lesson.blocks.len(),
        questions
    );
    Ok(())
}

/// Runs `lexquest serve`.
async fn run_serve(lessons_dir: &Path, port: u16) -> anyhow::Result<()> {
    let mut lessons = Vec::new();
    let entries = std::fs::read_dir(lessons_dir)
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {e}", lessons_dir.display()))?;
    for entry in entries {
        let path = entry?.path();
        if path.extension().is_some_and(|ext| ext == "json") {
            let lesson = load_lesson(&path)?;
            println!("Loaded lesson {} ({})", lesson.id, lesson.title);
            lessons.push(lesson);
        }
    }
    if lessons.is_empty() {
        anyhow::bail!("No lesson files found in {}", lessons_dir.display());
    }

    let backend = LocalBackend::with_lessons(lessons)?;
    let router = create_router(AppState::new(backend));

    let addr: SocketAddr = ([127, 0, 0, 1], port).into();
    let listener = TcpListener::bind(addr).await.map_err(|e| {
        anyhow::anyhow!("Failed to bind to {addr}: {e}\n\nSuggestion: Try a different port with --port")
    })?;
    println!("Scoring API running on http://{addr}");

    axum::serve(listener, router).await?;
    Ok(())
}

// ============================================================================
// Session replay
// ============================================================================

/// Notifier printing toasts to the console.
struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, message: &str, severity: Severity) {
        let label = match severity {
            Severity::Success => "success",
            Severity::Error => "error",
            Severity::Info => "info",
            Severity::Warning => "warning",
        };
        println!("  [{label}] {message}");
    }
}

/// Profile sink tracking the XP total on the console.
#[derive(Default)]
struct ConsoleSink {
    total: AtomicU64,
}

impl ProfileSink for ConsoleSink {
    fn add_xp(&self, delta: u32) {
        let total = self.total.fetch_add(u64::from(delta), Ordering::SeqCst) + u64::from(delta);
        println!("  [profile] +{delta} XP (total {total})");
    }
}

/// Navigator printing the redirect target.
struct ConsoleNavigator;

impl Navigator for ConsoleNavigator {
    fn go_to_module(&self, module_id: i64) {
        println!("  [navigate] module {module_id}");
    }
}

/// Picks an answer for `question`, correct or deliberately wrong.
fn choose_answer(question: &Question, correctly: bool) -> Option<AnswerValue> {
    match question.question_type {
        QuestionKind::SingleChoice => {
            let correct = question.correct_option()?.id;
            if correctly {
                Some(AnswerValue::Option(correct))
            } else {
                question
                    .options
                    .iter()
                    .find(|o| !o.is_correct)
                    .map(|o| AnswerValue::Option(o.id))
            }
        }
        QuestionKind::MultipleChoice => {
            let ids = if correctly {
                question.correct_option_ids()
            } else {
                question
                    .options
                    .iter()
                    .filter(|o| !o.is_correct)
                    .map(|o| o.id)
                    .collect()
            };
            (!ids.is_empty()).then_some(AnswerValue::Options(ids))
        }
        QuestionKind::TrueFalse => {
            let canonical = question.correct_bool()?;
            Some(AnswerValue::Bool(if correctly { canonical } else { !canonical }))
        }
        QuestionKind::FillInBlank => Some(AnswerValue::Text(if correctly {
            question.correct_answer_text.clone()
        } else {
            "(заведомо неверный ответ)".to_string()
        })),
    }
}

/// Runs `lexquest run`: the full load -> answer -> complete -> redirect
/// lifecycle against the in-process backend.
async fn run_replay(path: &Path, answer_correctly: bool, redirect_delay_secs: u64) -> anyhow::Result<()> {
    let lesson = load_lesson(path)?;
    validate_lesson(&lesson)?;
    let lesson_id = lesson.id;

    let backend = Arc::new(LocalBackend::with_lessons([lesson.clone()])?);
    let session = LessonSession::new(
        Arc::clone(&backend) as Arc<dyn LessonBackend>,
        Arc::new(ConsoleSink::default()),
        Arc::new(ConsoleNotifier),
        Arc::new(ConsoleNavigator),
        SessionConfig {
            redirect_delay_secs,
            // The replay visits every block in order, including exercise
            // blocks authored before the first theory block.
            start_on_first_theory_block: false,
            ..SessionConfig::default()
        },
    )?;

    println!("Loading lesson {} ({})", lesson_id, lesson.title);
    session.load(lesson_id).await?;

    loop {
        let snapshot = session.snapshot().await;
        let block = lesson
            .blocks
            .get(snapshot.block_index)
            .ok_or_else(|| anyhow::anyhow!("Lesson has no blocks"))?;
        println!(
            "Block {}/{} ({})",
            snapshot.block_index + 1,
            snapshot.block_count,
            block.block_type
        );
        if let Some(text) = &block.theory_text {
            println!("  {text}");
        }

        for question in &block.questions {
            println!("  Q{}: {}", question.id, question.text);
            let Some(answer) = choose_answer(question, answer_correctly) else {
                anyhow::bail!("Question {} has no usable canonical answer", question.id);
            };
            if let AnswerValue::Options(ids) = &answer {
                for id in ids {
                    session.toggle_option(question.id, *id).await?;
                }
            } else {
                session.set_answer(question.id, answer).await?;
            }
            let result = session.submit_answer(question.id).await?;
            println!(
                "    {}: {}",
                if result.is_correct { "correct" } else { "wrong" },
                result.explanation
            );
        }

        if !session.next_block().await {
            break;
        }
    }

    println!("Completing lesson {lesson_id}");
    let completion = session.complete().await?;
    println!(
        "Completed (first: {}, +{} XP, total {})",
        completion.is_first_completion,
        completion.xp_earned_for_this_completion,
        completion.current_total_user_xp
    );

    // Let the scheduled redirect fire before tearing down.
    tokio::time::sleep(Duration::from_secs(redirect_delay_secs) + Duration::from_millis(200)).await;
    session.close().await;
    Ok(())
}
