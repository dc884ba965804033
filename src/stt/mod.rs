//! Speech-to-text boundary.
//!
//! [`Transcriber`] is the interface the session loop speaks;
//! [`HttpRecognizer`] is the production implementation that ships each
//! utterance to a remote recognition service.

pub mod recognizer;
pub mod remote;

#[cfg(test)]
pub use recognizer::MockTranscriber;
pub use recognizer::{RecognizeError, Transcriber};
pub use remote::HttpRecognizer;
