//! Application entry point — mic-scribe.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load [`AppConfig`] from disk (returns default on first run).
//! 3. Wire Ctrl-C into a shutdown watch channel.
//! 4. Open the microphone ([`MicSource`]), keeping its stream handle here.
//! 5. Run the [`LoopController`] until the stop word, an interrupt, or the
//!    audio source ending the session.
//! 6. Drop the stream handle — this releases a capture task an interrupt
//!    left blocked, so the runtime can shut down — and report the outcome.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::watch;

use mic_scribe::audio::MicSource;
use mic_scribe::config::AppConfig;
use mic_scribe::session::{LoopController, TranscriptLog};
use mic_scribe::stt::{HttpRecognizer, Transcriber};

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("mic-scribe starting up");

    // 2. Configuration
    let config = AppConfig::load().unwrap_or_else(|e| {
        log::warn!("failed to load config ({e}); using defaults");
        AppConfig::default()
    });

    // 3. Ctrl-C → shutdown signal, observed by the loop at its capture point.
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            // Receiver may already be gone if the session ended on its own.
            let _ = shutdown_tx.send(true);
        }
    });

    // 4. Microphone, recognizer, log
    //
    // The stream handle stays here instead of inside the source: an
    // interrupt can leave the capture task blocked on a silent room, and
    // only dropping the handle (closing the chunk channel) lets that task
    // finish so the runtime can shut down when main returns.
    let (source, stream) = MicSource::open(config.audio.clone()).context("opening microphone")?;
    let transcriber: Arc<dyn Transcriber> =
        Arc::new(HttpRecognizer::from_config(&config.recognizer));
    let log = TranscriptLog::new(config.session.output_path.clone());

    log::info!(
        "listening — say \"{}\" or press Ctrl-C to stop",
        config.session.stop_word
    );

    // 5. Run the session to completion (cleanup included)
    let controller = LoopController::new(
        Box::new(source),
        transcriber,
        log,
        Duration::from_secs_f32(config.audio.calibration_secs),
        config.session.stop_word.clone(),
        shutdown_rx,
    );

    let report = controller.run().await?;

    // Stop capture first; a detached capture task unblocks here.
    drop(stream);

    log::info!(
        "session over ({}); log file {}",
        report.reason,
        if report.log_deleted {
            "deleted"
        } else {
            "was never created"
        }
    );

    Ok(())
}
