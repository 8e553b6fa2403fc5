//! Session configuration.
//!
//! The two behaviors the source design left implicit are exposed here as
//! named policy flags rather than hard-coded rules: jumping to the first
//! theory block on entry, and (not) gating lesson completion on answered
//! exercises. Defaults preserve the observed behavior.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SessionError};

/// Default delay before navigating away after completion, in seconds.
const fn default_redirect_delay() -> u64 {
    3
}

/// Upper bound for the redirect delay accepted by validation.
const MAX_REDIRECT_DELAY_SECS: u64 = 600;

/// Default value for boolean options that default to true.
const fn default_true() -> bool {
    true
}

/// Tunable policies of a lesson session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionConfig {
    /// Start on the first theory block when the lesson has one, otherwise on
    /// block 0. Policy, not invariant: theory-first entry even when blocks
    /// are authored out of order.
    #[serde(default = "default_true")]
    pub start_on_first_theory_block: bool,

    /// Require every question of the final block to carry a submission
    /// result before completion is allowed. Off by default: a learner may
    /// complete a lesson without answering anything.
    #[serde(default)]
    pub require_all_answered_before_completion: bool,

    /// Grace period between the completion confirmation and the automatic
    /// navigation to the parent module, in seconds.
    #[serde(default = "default_redirect_delay")]
    pub redirect_delay_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            start_on_first_theory_block: default_true(),
            require_all_answered_before_completion: false,
            redirect_delay_secs: default_redirect_delay(),
        }
    }
}

impl SessionConfig {
    /// Validates the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Validation` if `redirect_delay_secs` exceeds
    /// the ten-minute ceiling.
    pub fn validate(&self) -> Result<()> {
        if self.redirect_delay_secs > MAX_REDIRECT_DELAY_SECS {
            return Err(SessionError::validation(format!(
                "redirectDelaySecs must be at most {MAX_REDIRECT_DELAY_SECS}, got {}",
                self.redirect_delay_secs
            )));
        }
        Ok(())
    }
}
