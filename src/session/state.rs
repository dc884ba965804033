//! Session state machine.
//!
//! Two states only: [`SessionState::Listening`] (initial, re-entered after
//! every iteration, successful or not) and [`SessionState::Terminated`]
//! (final).  The Listening → Terminated transition happens exactly once
//! and triggers log cleanup; [`ExitReason`] records which path caused it.

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// States of the dictation session.
///
/// ```text
/// Listening ──stop word──────────▶ Terminated
///           ──interrupt signal───▶ Terminated
///           ──audio source gone──▶ Terminated
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Waiting for (or processing) the next utterance.
    #[default]
    Listening,

    /// The session is over; cleanup has run or is about to run.
    Terminated,
}

impl SessionState {
    /// `true` once the session has ended.
    pub fn is_terminated(&self) -> bool {
        matches!(self, SessionState::Terminated)
    }

    /// A short human-readable label for log output.
    pub fn label(&self) -> &'static str {
        match self {
            SessionState::Listening => "listening",
            SessionState::Terminated => "terminated",
        }
    }
}

// ---------------------------------------------------------------------------
// ExitReason
// ---------------------------------------------------------------------------

/// Which path ended the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// The spoken stop word was recognised.
    StopWord,

    /// An external interrupt (Ctrl-C) arrived.
    Interrupted,

    /// The audio source closed or failed; no further utterances can arrive.
    SourceClosed,
}

impl std::fmt::Display for ExitReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExitReason::StopWord => write!(f, "stop command received"),
            ExitReason::Interrupted => write!(f, "interrupted"),
            ExitReason::SourceClosed => write!(f, "audio source closed"),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_state_is_listening() {
        assert_eq!(SessionState::default(), SessionState::Listening);
    }

    #[test]
    fn listening_is_not_terminated() {
        assert!(!SessionState::Listening.is_terminated());
    }

    #[test]
    fn terminated_is_terminated() {
        assert!(SessionState::Terminated.is_terminated());
    }

    #[test]
    fn state_labels() {
        assert_eq!(SessionState::Listening.label(), "listening");
        assert_eq!(SessionState::Terminated.label(), "terminated");
    }

    #[test]
    fn exit_reason_display() {
        assert_eq!(ExitReason::StopWord.to_string(), "stop command received");
        assert_eq!(ExitReason::Interrupted.to_string(), "interrupted");
        assert_eq!(ExitReason::SourceClosed.to_string(), "audio source closed");
    }
}
