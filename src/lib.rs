//! mic-scribe — continuous dictation logger.
//!
//! Captures microphone audio one utterance at a time, sends each utterance
//! to a remote speech-recognition service, and appends the lowercased
//! transcript to a session log file.  Saying the stop word ("terminate")
//! or pressing Ctrl-C ends the session; the log file is deleted on exit.
//!
//! # Crate layout
//!
//! - [`audio`]   — cpal microphone capture, resampling, utterance endpointing.
//! - [`stt`]     — the [`Transcriber`](stt::Transcriber) boundary and the
//!   HTTP recognizer that implements it.
//! - [`session`] — the capture → transcribe → append loop, the transcript
//!   log, and session state.
//! - [`config`]  — TOML settings and platform paths.

pub mod audio;
pub mod config;
pub mod session;
pub mod stt;
