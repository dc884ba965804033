//! The dictation session — loop controller, transcript log, and state.

pub mod log;
pub mod runner;
pub mod state;

pub use log::{LogError, TranscriptLog};
pub use runner::{LoopController, SessionError, SessionReport};
pub use state::{ExitReason, SessionState};
