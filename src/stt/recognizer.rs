//! Core `Transcriber` trait and the recognition failure taxonomy.
//!
//! [`Transcriber`] is the request/response boundary between the session
//! loop and whatever service turns audio into text.  It is object-safe and
//! `Send + Sync` so it can be held behind an `Arc<dyn Transcriber>`.
//!
//! Exactly two failure kinds exist, and both are non-fatal to the session:
//! the loop reports them and moves on to the next utterance.
//!
//! [`MockTranscriber`] (available under `#[cfg(test)]`) replays a scripted
//! sequence of responses — useful for unit-testing the loop without a
//! network or a microphone.

use async_trait::async_trait;
use thiserror::Error;

use crate::audio::Utterance;

// ---------------------------------------------------------------------------
// RecognizeError
// ---------------------------------------------------------------------------

/// Failures at the transcription boundary.
#[derive(Debug, Clone, Error)]
pub enum RecognizeError {
    /// The request itself failed: transport error, non-success HTTP status,
    /// or a response the client could not parse.  Carries the underlying
    /// message.
    #[error("could not request results: {0}")]
    Service(String),

    /// The service answered but produced no usable text for this audio.
    #[error("could not understand audio")]
    Unintelligible,
}

impl From<reqwest::Error> for RecognizeError {
    fn from(e: reqwest::Error) -> Self {
        RecognizeError::Service(e.to_string())
    }
}

// ---------------------------------------------------------------------------
// Transcriber trait
// ---------------------------------------------------------------------------

/// Object-safe, thread-safe interface to a speech-recognition capability.
///
/// # Contract
///
/// - `utterance` is 16 kHz mono f32 PCM as produced by the audio layer.
/// - The returned text is raw service output; the caller owns
///   normalisation (lowercasing, trimming).
/// - Errors carry no retry semantics — the caller decides what a failed
///   cycle means.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe one utterance and return the recognised text.
    async fn transcribe(&self, utterance: &Utterance) -> Result<String, RecognizeError>;
}

// Compile-time assertion: Box<dyn Transcriber> must be constructible.
const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn Transcriber>) {}
};

// ---------------------------------------------------------------------------
// MockTranscriber  (test-only)
// ---------------------------------------------------------------------------

/// A test double that replays a scripted sequence of responses, one per
/// call, without touching the network.
///
/// Once the script is exhausted every further call returns
/// [`RecognizeError::Unintelligible`].
#[cfg(test)]
pub struct MockTranscriber {
    script: std::sync::Mutex<std::collections::VecDeque<Result<String, RecognizeError>>>,
}

#[cfg(test)]
impl MockTranscriber {
    /// Create a mock that replays `responses` in order.
    pub fn script(responses: Vec<Result<String, RecognizeError>>) -> Self {
        Self {
            script: std::sync::Mutex::new(responses.into()),
        }
    }

    /// Create a mock that always answers `Ok(text)` (single-entry script
    /// repeated is not needed by current tests).
    pub fn ok(text: impl Into<String>) -> Self {
        Self::script(vec![Ok(text.into())])
    }
}

#[cfg(test)]
#[async_trait]
impl Transcriber for MockTranscriber {
    async fn transcribe(&self, _utterance: &Utterance) -> Result<String, RecognizeError> {
        let mut script = self.script.lock().expect("mock script lock");
        script.pop_front().unwrap_or(Err(RecognizeError::Unintelligible))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::SERVICE_SAMPLE_RATE;

    fn silence() -> Utterance {
        Utterance {
            samples: vec![0.0; 8_000],
            sample_rate: SERVICE_SAMPLE_RATE,
        }
    }

    #[tokio::test]
    async fn mock_replays_script_in_order() {
        let t = MockTranscriber::script(vec![
            Ok("first".into()),
            Err(RecognizeError::Unintelligible),
            Ok("second".into()),
        ]);

        assert_eq!(t.transcribe(&silence()).await.unwrap(), "first");
        assert!(matches!(
            t.transcribe(&silence()).await,
            Err(RecognizeError::Unintelligible)
        ));
        assert_eq!(t.transcribe(&silence()).await.unwrap(), "second");
    }

    #[tokio::test]
    async fn exhausted_mock_is_unintelligible() {
        let t = MockTranscriber::ok("only one");
        let _ = t.transcribe(&silence()).await;
        assert!(matches!(
            t.transcribe(&silence()).await,
            Err(RecognizeError::Unintelligible)
        ));
    }

    #[test]
    fn service_error_carries_message() {
        let e = RecognizeError::Service("connection refused".into());
        assert_eq!(e.to_string(), "could not request results: connection refused");
    }

    #[test]
    fn unintelligible_error_is_generic() {
        assert_eq!(
            RecognizeError::Unintelligible.to_string(),
            "could not understand audio"
        );
    }
}
