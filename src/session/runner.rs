//! The capture → transcribe → append loop.
//!
//! [`LoopController`] owns the utterance source, the transcriber, and the
//! transcript log, and drives one iteration at a time:
//!
//! ```text
//! calibrate ▸ capture utterance          (blocking → spawn_blocking,
//!                                         raced against the shutdown signal)
//!   └─▶ transcribe (remote request)
//!         ├─ failure            → report, next iteration
//!         └─ text               → lowercase
//!               ├─ blank        → skip, next iteration
//!               ├─ stop word    → exit loop
//!               └─ otherwise    → append one line to the log
//! ```
//!
//! Whatever ends the loop — stop word, interrupt, dead audio source, or a
//! log write failure — cleanup runs exactly once and deletes the log file.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::watch;

use crate::audio::{CaptureError, UtteranceSource};
use crate::session::log::{LogError, TranscriptLog};
use crate::session::state::{ExitReason, SessionState};
use crate::stt::Transcriber;

// ---------------------------------------------------------------------------
// SessionError
// ---------------------------------------------------------------------------

/// Errors that end a session abnormally.
///
/// Recognition failures are *not* represented here — they are per-cycle
/// events the loop reports and absorbs.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The transcript log could not be written or deleted.
    #[error(transparent)]
    Log(#[from] LogError),

    /// A blocking capture task failed to join (panic in the audio layer).
    #[error("internal error: {0}")]
    Internal(String),
}

// ---------------------------------------------------------------------------
// SessionReport
// ---------------------------------------------------------------------------

/// What happened over the whole session, returned by [`LoopController::run`].
#[derive(Debug, Clone, Copy)]
pub struct SessionReport {
    /// Which path ended the loop.
    pub reason: ExitReason,
    /// Whether cleanup actually removed a log file (`false` when nothing
    /// was ever written).
    pub log_deleted: bool,
}

// ---------------------------------------------------------------------------
// LoopController
// ---------------------------------------------------------------------------

/// Drives the dictation session from first calibration to cleanup.
///
/// Create with [`LoopController::new`], then call [`run`](Self::run) on the
/// tokio runtime.  The controller holds the single long-lived source and
/// transcriber for the whole session; nothing is global.
pub struct LoopController {
    /// Taken out of the option while a blocking capture is in flight and
    /// put back when it completes.
    source: Option<Box<dyn UtteranceSource>>,
    transcriber: Arc<dyn Transcriber>,
    log: TranscriptLog,
    /// Ambient-noise calibration length, applied before every listen.
    calibration: Duration,
    /// Spoken word that ends the session, already lowercase.
    stop_word: String,
    shutdown: watch::Receiver<bool>,
    state: SessionState,
}

impl LoopController {
    /// Create a controller.
    ///
    /// * `source`      — utterance source (microphone in production).
    /// * `transcriber` — recognition boundary.
    /// * `log`         — transcript log; created lazily, deleted on exit.
    /// * `calibration` — ambient-noise calibration duration per iteration.
    /// * `stop_word`   — spoken terminator, compared lowercased + trimmed.
    /// * `shutdown`    — watch channel; `true` means "stop now".
    pub fn new(
        source: Box<dyn UtteranceSource>,
        transcriber: Arc<dyn Transcriber>,
        log: TranscriptLog,
        calibration: Duration,
        stop_word: impl Into<String>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            source: Some(source),
            transcriber,
            log,
            calibration,
            stop_word: stop_word.into().to_lowercase(),
            shutdown,
            state: SessionState::Listening,
        }
    }

    /// Current session state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    // -----------------------------------------------------------------------
    // run — loop plus cleanup
    // -----------------------------------------------------------------------

    /// Run the session to completion, then delete the log file.
    ///
    /// Cleanup runs on every exit path, including a log write failure; the
    /// deletion outcome is part of the returned [`SessionReport`].
    pub async fn run(mut self) -> Result<SessionReport, SessionError> {
        let outcome = self.run_session().await;

        let log_deleted = match self.log.delete() {
            Ok(true) => {
                log::info!("{} deleted", self.log.path().display());
                true
            }
            Ok(false) => {
                log::debug!("no log file to delete");
                false
            }
            Err(e) => {
                // Surface the write failure (if any) over the delete failure.
                log::error!("cleanup failed: {e}");
                outcome?;
                return Err(e.into());
            }
        };

        let reason = outcome?;
        Ok(SessionReport {
            reason,
            log_deleted,
        })
    }

    // -----------------------------------------------------------------------
    // run_session — the loop itself
    // -----------------------------------------------------------------------

    /// Run iterations until the loop terminates; no cleanup.
    ///
    /// Exposed separately so the loop's effect on the log can be observed
    /// before cleanup erases it.
    pub async fn run_session(&mut self) -> Result<ExitReason, SessionError> {
        loop {
            // ── 1. Calibrate + capture (blocking), raced against shutdown ──
            let mut source = match self.source.take() {
                Some(s) => s,
                None => return Ok(self.terminate(ExitReason::SourceClosed)),
            };

            let calibration = self.calibration;
            let mut capture = tokio::task::spawn_blocking(move || {
                let listened = source
                    .calibrate(calibration)
                    .and_then(|_| source.capture_utterance());
                (source, listened)
            });

            // The handlers only forward values; `self` is touched again
            // only after the select!'s branch futures are gone.
            let joined = tokio::select! {
                biased;

                _ = wait_for_shutdown(&mut self.shutdown) => None,
                joined = &mut capture => Some(joined),
            };

            let listened = match joined {
                None => {
                    log::info!("exiting via interrupt");
                    return Ok(self.terminate(ExitReason::Interrupted));
                }
                Some(joined) => {
                    let (source, listened) =
                        joined.map_err(|e| SessionError::Internal(e.to_string()))?;
                    self.source = Some(source);
                    listened
                }
            };

            let utterance = match listened {
                Ok(u) => u,
                Err(CaptureError::StreamClosed) => {
                    log::warn!("audio source closed — ending session");
                    return Ok(self.terminate(ExitReason::SourceClosed));
                }
                Err(e) => {
                    log::error!("audio capture failed: {e} — ending session");
                    return Ok(self.terminate(ExitReason::SourceClosed));
                }
            };

            // ── 2. Transcribe; failures cost one cycle, never the session ──
            let text = match self.transcriber.transcribe(&utterance).await {
                Ok(t) => t.to_lowercase(),
                Err(e) => {
                    log::warn!("{e}");
                    continue;
                }
            };

            // ── 3. Classify: blank / stop word / transcript ────────────────
            let trimmed = text.trim();

            if trimmed.is_empty() {
                log::debug!("blank transcript — skipping");
                continue;
            }

            if trimmed == self.stop_word {
                log::info!("stop command received — exiting");
                return Ok(self.terminate(ExitReason::StopWord));
            }

            // ── 4. Append one line and report it ───────────────────────────
            self.log.append(&text)?;
            log::info!("wrote text: {text}");
        }
    }

    /// The single Listening → Terminated transition.
    fn terminate(&mut self, reason: ExitReason) -> ExitReason {
        self.state = SessionState::Terminated;
        reason
    }
}

// ---------------------------------------------------------------------------
// wait_for_shutdown
// ---------------------------------------------------------------------------

/// Resolve once the shutdown flag is `true`.
///
/// If the sender side is gone no interrupt can ever arrive, so the future
/// stays pending rather than resolving spuriously.
async fn wait_for_shutdown(rx: &mut watch::Receiver<bool>) {
    while !*rx.borrow_and_update() {
        if rx.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
