//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and shared across threads.
//!
//! The config file is optional: a missing `settings.toml` yields
//! [`AppConfig::default()`], which reproduces the classic fixed behaviour
//! (0.2 s calibration, `output.txt`, stop word `terminate`).

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::AppPaths;

// ---------------------------------------------------------------------------
// RecognizerConfig
// ---------------------------------------------------------------------------

/// Settings for the remote speech-recognition service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecognizerConfig {
    /// Base URL of the recognition endpoint.
    ///
    /// Any service speaking the OpenAI `/v1/audio/transcriptions` wire
    /// format works: OpenAI, Groq, LocalAI, faster-whisper-server, …
    pub base_url: String,
    /// API key — `None` for local services that require no authentication.
    pub api_key: Option<String>,
    /// Model identifier sent with each request (e.g. `"whisper-1"`).
    pub model: String,
    /// Speech language as an ISO-639-1 code (e.g. `"en"`).
    pub language: String,
    /// Maximum seconds to wait for a recognition response.
    pub timeout_secs: u64,
}

impl Default for RecognizerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".into(),
            api_key: None,
            model: "whisper-1".into(),
            language: "en".into(),
            timeout_secs: 15,
        }
    }
}

// ---------------------------------------------------------------------------
// AudioConfig
// ---------------------------------------------------------------------------

/// Settings for ambient-noise calibration and utterance endpointing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Seconds of ambient audio sampled before each listen to derive the
    /// energy threshold.
    pub calibration_secs: f32,
    /// Seconds of sustained silence that marks the end of an utterance.
    pub pause_secs: f32,
    /// Maximum utterance length in seconds; capture stops automatically.
    pub max_utterance_secs: f32,
    /// The energy threshold is the calibrated ambient RMS multiplied by
    /// this factor.
    pub energy_multiplier: f32,
    /// Lower bound for the energy threshold, so a dead-silent room does
    /// not produce a threshold of zero.
    pub min_energy_threshold: f32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            calibration_secs: 0.2,
            pause_secs: 0.8,
            max_utterance_secs: 30.0,
            energy_multiplier: 1.75,
            min_energy_threshold: 0.01,
        }
    }
}

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Settings for the dictation session itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Path of the session log file, one transcript per line.
    ///
    /// Relative paths resolve against the working directory.  The file is
    /// created lazily on the first append and deleted when the session ends.
    pub output_path: String,
    /// Spoken word that ends the session.  Compared against the trimmed,
    /// lowercased transcript.
    pub stop_word: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            output_path: "output.txt".into(),
            stop_word: "terminate".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// # Persistence
///
/// ```rust,no_run
/// use mic_scribe::config::AppConfig;
///
/// // Load (returns Default when file is missing)
/// let config = AppConfig::load().unwrap();
///
/// // Modify and save
/// // config.save().unwrap();
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Remote recognition service settings.
    pub recognizer: RecognizerConfig,
    /// Calibration / endpointing settings.
    pub audio: AudioConfig,
    /// Session log and stop word settings.
    pub session: SessionConfig,
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet
    /// (first-run scenario) so callers never need to special-case a missing
    /// file.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config.sanitized())
    }

    /// Replace hand-edited timing values that are negative or non-finite
    /// with their defaults — they would panic later when converted to
    /// `Duration` or make endpointing nonsensical.
    fn sanitized(mut self) -> Self {
        let defaults = AudioConfig::default();
        let mut fix = |name: &str, value: &mut f32, fallback: f32| {
            if !value.is_finite() || *value < 0.0 {
                log::warn!("invalid {name} ({value}); using {fallback}");
                *value = fallback;
            }
        };

        fix(
            "audio.calibration_secs",
            &mut self.audio.calibration_secs,
            defaults.calibration_secs,
        );
        fix(
            "audio.pause_secs",
            &mut self.audio.pause_secs,
            defaults.pause_secs,
        );
        fix(
            "audio.max_utterance_secs",
            &mut self.audio.max_utterance_secs,
            defaults.max_utterance_secs,
        );

        self
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path (useful for tests).
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    /// Verify that a default `AppConfig` can be serialised to TOML and
    /// deserialised back without any data loss.
    #[test]
    fn round_trip_toml() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("settings.toml");

        let original = AppConfig::default();
        original.save_to(&path).expect("save");

        let loaded = AppConfig::load_from(&path).expect("load");

        // RecognizerConfig
        assert_eq!(original.recognizer.base_url, loaded.recognizer.base_url);
        assert_eq!(original.recognizer.api_key, loaded.recognizer.api_key);
        assert_eq!(original.recognizer.model, loaded.recognizer.model);
        assert_eq!(original.recognizer.language, loaded.recognizer.language);
        assert_eq!(
            original.recognizer.timeout_secs,
            loaded.recognizer.timeout_secs
        );

        // AudioConfig
        assert_eq!(original.audio.calibration_secs, loaded.audio.calibration_secs);
        assert_eq!(original.audio.pause_secs, loaded.audio.pause_secs);
        assert_eq!(
            original.audio.max_utterance_secs,
            loaded.audio.max_utterance_secs
        );
        assert_eq!(
            original.audio.energy_multiplier,
            loaded.audio.energy_multiplier
        );

        // SessionConfig
        assert_eq!(original.session.output_path, loaded.session.output_path);
        assert_eq!(original.session.stop_word, loaded.session.stop_word);
    }

    /// `load_from` on a non-existent path must return `Default` without error.
    #[test]
    fn load_missing_returns_default() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("nonexistent.toml");

        let config = AppConfig::load_from(&path).expect("should not error");
        let default = AppConfig::default();

        assert_eq!(config.recognizer.base_url, default.recognizer.base_url);
        assert_eq!(config.session.output_path, default.session.output_path);
        assert_eq!(config.session.stop_word, default.session.stop_word);
    }

    /// Defaults must reproduce the classic fixed behaviour.
    #[test]
    fn default_values_match_classic_behaviour() {
        let cfg = AppConfig::default();

        assert_eq!(cfg.session.output_path, "output.txt");
        assert_eq!(cfg.session.stop_word, "terminate");
        assert!((cfg.audio.calibration_secs - 0.2).abs() < f32::EPSILON);
        assert!((cfg.audio.pause_secs - 0.8).abs() < f32::EPSILON);
        assert!(cfg.recognizer.api_key.is_none());
        assert_eq!(cfg.recognizer.language, "en");
    }

    /// Verify that modified non-default values survive a round trip.
    #[test]
    fn round_trip_modified_values() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("modified.toml");

        let mut cfg = AppConfig::default();
        cfg.recognizer.base_url = "https://api.openai.com".into();
        cfg.recognizer.api_key = Some("sk-test".into());
        cfg.recognizer.model = "whisper-large-v3".into();
        cfg.recognizer.timeout_secs = 30;
        cfg.audio.pause_secs = 1.2;
        cfg.session.output_path = "notes.txt".into();
        cfg.session.stop_word = "stop".into();

        cfg.save_to(&path).expect("save");
        let loaded = AppConfig::load_from(&path).expect("load");

        assert_eq!(loaded.recognizer.base_url, "https://api.openai.com");
        assert_eq!(loaded.recognizer.api_key, Some("sk-test".into()));
        assert_eq!(loaded.recognizer.model, "whisper-large-v3");
        assert_eq!(loaded.recognizer.timeout_secs, 30);
        assert!((loaded.audio.pause_secs - 1.2).abs() < f32::EPSILON);
        assert_eq!(loaded.session.output_path, "notes.txt");
        assert_eq!(loaded.session.stop_word, "stop");
    }

    #[test]
    fn negative_timings_are_reset_on_load() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("broken.toml");

        let mut cfg = AppConfig::default();
        cfg.audio.calibration_secs = -1.0;
        cfg.audio.pause_secs = -0.5;
        cfg.audio.max_utterance_secs = f32::NAN;
        cfg.save_to(&path).expect("save");

        let loaded = AppConfig::load_from(&path).expect("load");
        let defaults = AudioConfig::default();

        assert_eq!(loaded.audio.calibration_secs, defaults.calibration_secs);
        assert_eq!(loaded.audio.pause_secs, defaults.pause_secs);
        assert_eq!(loaded.audio.max_utterance_secs, defaults.max_utterance_secs);
    }
}
