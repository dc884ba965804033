//! Audio pipeline — microphone capture → downmix/resample → endpointing.
//!
//! ```text
//! Microphone → cpal callback → AudioChunk (mpsc) → downmix_mono
//!           → resample(16 kHz) → Endpointer → Utterance
//! ```
//!
//! The session loop only sees the [`UtteranceSource`] trait; everything
//! above it is an implementation detail of [`MicSource`].

pub mod capture;
pub mod listener;
pub mod resample;

pub use capture::{AudioChunk, CaptureError, Microphone, StreamHandle};
pub use listener::{Endpointer, MicSource, Utterance, UtteranceSource};
pub use resample::{downmix_mono, resample, SERVICE_SAMPLE_RATE};
