//! Lexquest Lesson Session
//!
//! State machine for one learner taking one lesson: answer collection,
//! block navigation, submission, completion, and the collaborator handles
//! the session drives (backend, profile, notifications, navigation).

pub mod answers;
pub mod collaborators;
pub mod config;
pub mod error;
pub mod sequencer;
pub mod session;
pub mod variant;

pub use answers::AnswerStore;
pub use collaborators::{LessonBackend, Navigator, Notifier, ProfileSink, Severity};
pub use config::SessionConfig;
pub use error::{Result, SessionError};
pub use sequencer::BlockSequencer;
pub use session::{LessonSession, QuestionPhase, SessionPhase, SessionSnapshot};
pub use variant::{AnswerReview, Annotation, ChoiceState, InputWidget, ReviewedOption};
