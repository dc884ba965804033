//! `HttpRecognizer` — remote recognition over an OpenAI-compatible
//! `/v1/audio/transcriptions` endpoint.
//!
//! Works with any service speaking that wire format: OpenAI, Groq, LocalAI,
//! faster-whisper-server, speaches, etc.  All connection details come from
//! [`RecognizerConfig`]; nothing is hardcoded.
//!
//! Each utterance is encoded as an in-memory 16-bit PCM WAV file and sent
//! as a multipart upload together with the model and language fields.

use std::io::Cursor;

use async_trait::async_trait;
use serde::Deserialize;

use crate::audio::Utterance;
use crate::config::RecognizerConfig;
use crate::stt::recognizer::{RecognizeError, Transcriber};

// ---------------------------------------------------------------------------
// Response wire format
// ---------------------------------------------------------------------------

/// The `json` response format of `/v1/audio/transcriptions`.
#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    #[serde(default)]
    text: String,
}

// ---------------------------------------------------------------------------
// HttpRecognizer
// ---------------------------------------------------------------------------

/// Production [`Transcriber`] backed by an HTTP recognition service.
pub struct HttpRecognizer {
    client: reqwest::Client,
    config: RecognizerConfig,
}

impl HttpRecognizer {
    /// Build an `HttpRecognizer` from application config.
    ///
    /// The HTTP client is pre-configured with the per-request timeout from
    /// `config.timeout_secs`.  A default (no-timeout) client is used as a
    /// last-resort fallback if the builder fails (should never happen in
    /// practice).
    pub fn from_config(config: &RecognizerConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            config: config.clone(),
        }
    }

    /// Encode an utterance as a complete in-memory WAV file
    /// (16-bit PCM, mono, at the utterance's sample rate).
    fn encode_wav(utterance: &Utterance) -> Result<Vec<u8>, RecognizeError> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: utterance.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec)
                .map_err(|e| RecognizeError::Service(format!("wav encode: {e}")))?;

            for &sample in &utterance.samples {
                let pcm = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
                writer
                    .write_sample(pcm)
                    .map_err(|e| RecognizeError::Service(format!("wav encode: {e}")))?;
            }

            writer
                .finalize()
                .map_err(|e| RecognizeError::Service(format!("wav encode: {e}")))?;
        }

        Ok(cursor.into_inner())
    }

    /// Extract a usable transcript from a successful response body.
    ///
    /// # Errors
    ///
    /// - [`RecognizeError::Service`] — the body is not the expected JSON.
    /// - [`RecognizeError::Unintelligible`] — valid JSON, but the `text`
    ///   field is missing, empty, or whitespace-only.
    fn parse_transcript(body: &str) -> Result<String, RecognizeError> {
        let parsed: TranscriptionResponse = serde_json::from_str(body)
            .map_err(|e| RecognizeError::Service(format!("bad response: {e}")))?;

        let text = parsed.text.trim().to_string();
        if text.is_empty() {
            return Err(RecognizeError::Unintelligible);
        }

        Ok(text)
    }
}

#[async_trait]
impl Transcriber for HttpRecognizer {
    /// Upload `utterance` and return the service's transcript.
    ///
    /// The `Authorization: Bearer …` header is attached **only** when
    /// `config.api_key` is `Some(key)` and `key` is non-empty — safe for
    /// local services that require no authentication.
    ///
    /// # Errors
    ///
    /// - [`RecognizeError::Service`] — transport failure, non-success HTTP
    ///   status, or an unparseable response body.
    /// - [`RecognizeError::Unintelligible`] — the service answered with
    ///   empty or blank text.
    async fn transcribe(&self, utterance: &Utterance) -> Result<String, RecognizeError> {
        let wav = Self::encode_wav(utterance)?;

        let file_part = reqwest::multipart::Part::bytes(wav)
            .file_name("utterance.wav")
            .mime_str("audio/wav")?;

        let form = reqwest::multipart::Form::new()
            .part("file", file_part)
            .text("model", self.config.model.clone())
            .text("language", self.config.language.clone())
            .text("response_format", "json");

        let url = format!("{}/v1/audio/transcriptions", self.config.base_url);

        let mut req = self.client.post(&url).multipart(form);

        // Attach Authorization header only when api_key is a non-empty string.
        let key = self.config.api_key.as_deref().unwrap_or("");
        if !key.is_empty() {
            req = req.bearer_auth(key);
        }

        let response = req.send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = body.trim();
            return Err(RecognizeError::Service(if detail.is_empty() {
                format!("{status}")
            } else {
                format!("{status}: {detail}")
            }));
        }

        let body = response
            .text()
            .await
            .map_err(|e| RecognizeError::Service(format!("bad response: {e}")))?;

        Self::parse_transcript(&body)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
