//! Error types for the lesson session core.
//!
//! The taxonomy follows the propagation policy of the session state machine:
//! validation errors are resolved locally and never reach a collaborator
//! call; not-found during the initial load is terminal for that load
//! attempt; network and server failures are surfaced and leave the learner
//! free to retry the identical action.

use lexquest_content::ContentError;

/// A specialized `Result` type for session operations.
pub type Result<T> = std::result::Result<T, SessionError>;

/// Errors produced by the lesson session state machine and its collaborators.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SessionError {
    /// Local input validation failed; nothing was sent to the backend.
    #[error("{message}")]
    Validation {
        /// User-facing description of what must be fixed.
        message: String,
    },

    /// A resource is absent server-side.
    #[error("{resource} {id} not found")]
    NotFound {
        /// Kind of the missing resource ("lesson", "question").
        resource: String,
        /// Identifier that failed to resolve.
        id: i64,
    },

    /// Transport-level failure (connection refused, timeout).
    #[error("Network error: {message}")]
    Network {
        /// Description of the transport failure.
        message: String,
    },

    /// The backend answered with a non-2xx status and a message payload.
    #[error("Server error ({status}): {message}")]
    Server {
        /// HTTP-like status code reported by the backend.
        status: u16,
        /// Message payload from the backend.
        message: String,
    },

    /// The session was closed (view unmounted); the operation was discarded.
    #[error("Session is closed")]
    Closed,

    /// A lesson document violated a content invariant.
    #[error(transparent)]
    Content(#[from] ContentError),
}

impl SessionError {
    /// Creates a new `Validation` error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Creates a new `NotFound` error.
    #[must_use]
    pub fn not_found(resource: impl Into<String>, id: i64) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id,
        }
    }

    /// Creates a new `Network` error.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Creates a new `Server` error.
    #[must_use]
    pub fn server(status: u16, message: impl Into<String>) -> Self {
        Self::Server {
            status,
            message: message.into(),
        }
    }

    /// Returns `true` if retrying the identical action may succeed.
    ///
    /// Network and server failures are transient from the session's point of
    /// view; validation and not-found failures require different input.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Network { .. } | Self::Server { .. })
    }
}
