//! Ambient-noise calibration and utterance endpointing.
//!
//! [`UtteranceSource`] is the blocking boundary the session loop listens
//! through: calibrate against ambient noise, then block until one bounded
//! utterance has been spoken.  [`MicSource`] is the production
//! implementation on top of [`Microphone`](crate::audio::Microphone).
//!
//! ## Endpointing algorithm
//!
//! Audio is processed in 30 ms frames (480 samples @ 16 kHz).  A frame is
//! *voiced* when its RMS amplitude exceeds the calibrated threshold.  An
//! utterance starts at the first voiced frame and ends after a sustained
//! run of quiet frames (the pause tail) or at the maximum length.  Frames
//! before onset are discarded, so silence between utterances costs nothing.

use std::collections::VecDeque;
use std::sync::mpsc;
use std::time::Duration;

use crate::audio::capture::{AudioChunk, CaptureError, Microphone, StreamHandle};
use crate::audio::resample::{downmix_mono, resample, SERVICE_SAMPLE_RATE};
use crate::config::AudioConfig;

/// Endpointing frame length: 30 ms at 16 kHz.
const FRAME_SAMPLES: usize = 480;

// ---------------------------------------------------------------------------
// Utterance
// ---------------------------------------------------------------------------

/// One bounded audio capture between pause boundaries.
///
/// Samples are mono `f32` at [`SERVICE_SAMPLE_RATE`], ready to be encoded
/// and shipped to the recognition service.  An `Utterance` lives for one
/// loop iteration and is discarded after the transcription attempt.
#[derive(Debug, Clone)]
pub struct Utterance {
    /// Mono PCM samples at [`Utterance::sample_rate`].
    pub samples: Vec<f32>,
    /// Always [`SERVICE_SAMPLE_RATE`] for utterances produced here.
    pub sample_rate: u32,
}

impl Utterance {
    /// Length of the utterance in seconds.
    pub fn duration_secs(&self) -> f32 {
        self.samples.len() as f32 / self.sample_rate as f32
    }
}

// ---------------------------------------------------------------------------
// UtteranceSource trait
// ---------------------------------------------------------------------------

/// Blocking source of utterances.
///
/// The session loop holds a `Box<dyn UtteranceSource + Send>` and calls
/// both methods from a blocking task, once per iteration:
/// [`calibrate`](UtteranceSource::calibrate) first, then
/// [`capture_utterance`](UtteranceSource::capture_utterance) which blocks
/// until the speaker pauses.
pub trait UtteranceSource: Send {
    /// Sample ambient audio for `duration` and derive the energy threshold
    /// used to separate speech from background noise.  Returns the
    /// threshold that will govern the next capture.
    fn calibrate(&mut self, duration: Duration) -> Result<f32, CaptureError>;

    /// Block until one utterance has been captured.
    ///
    /// Returns [`CaptureError::StreamClosed`] when the underlying audio
    /// stream is gone — callers should treat that as the end of the source.
    fn capture_utterance(&mut self) -> Result<Utterance, CaptureError>;
}

// ---------------------------------------------------------------------------
// rms
// ---------------------------------------------------------------------------

/// Root-mean-square amplitude of a frame.  Empty frames are 0.0.
pub fn rms(frame: &[f32]) -> f32 {
    if frame.is_empty() {
        return 0.0;
    }
    let sum_sq: f32 = frame.iter().map(|s| s * s).sum();
    (sum_sq / frame.len() as f32).sqrt()
}

// ---------------------------------------------------------------------------
// Endpointer
// ---------------------------------------------------------------------------

/// Frame-by-frame utterance boundary detector.
///
/// Feed 16 kHz mono frames with [`push_frame`](Endpointer::push_frame);
/// it returns `true` once the utterance is complete, after which
/// [`take`](Endpointer::take) yields the collected samples.
///
/// # Example
///
/// ```rust
/// use mic_scribe::audio::Endpointer;
///
/// let mut ep = Endpointer::new(0.1, 2, 1000);
/// assert!(!ep.push_frame(&[0.0; 480]));        // silence before onset
/// assert!(!ep.push_frame(&[0.5; 480]));        // speech starts
/// assert!(!ep.push_frame(&[0.0; 480]));        // 1 quiet frame
/// assert!(ep.push_frame(&[0.0; 480]));         // 2 quiet frames → done
/// assert_eq!(ep.take().len(), 3 * 480);
/// ```
pub struct Endpointer {
    threshold: f32,
    /// Consecutive quiet frames that terminate the utterance.
    pause_frames: usize,
    /// Hard cap on collected frames after onset.
    max_frames: usize,
    started: bool,
    quiet_run: usize,
    collected: Vec<f32>,
}

impl Endpointer {
    /// Create an endpointer.
    ///
    /// * `threshold`    — RMS level separating voiced from quiet frames.
    /// * `pause_frames` — quiet frames (> 0) that end the utterance.
    /// * `max_frames`   — maximum frames collected after speech onset.
    pub fn new(threshold: f32, pause_frames: usize, max_frames: usize) -> Self {
        Self {
            threshold,
            pause_frames: pause_frames.max(1),
            max_frames: max_frames.max(1),
            started: false,
            quiet_run: 0,
            collected: Vec::new(),
        }
    }

    /// `true` once speech onset has been observed.
    pub fn speech_started(&self) -> bool {
        self.started
    }

    /// Feed one frame; returns `true` when the utterance is complete.
    ///
    /// Pre-onset frames are dropped.  Post-onset frames (voiced or not) are
    /// collected, so short pauses inside a sentence stay in the audio.
    pub fn push_frame(&mut self, frame: &[f32]) -> bool {
        let voiced = rms(frame) > self.threshold;

        if !self.started {
            if !voiced {
                return false;
            }
            self.started = true;
        }

        self.collected.extend_from_slice(frame);

        if voiced {
            self.quiet_run = 0;
        } else {
            self.quiet_run += 1;
            if self.quiet_run >= self.pause_frames {
                return true;
            }
        }

        // Runaway guard: a noisy room must not record forever.
        self.collected.len() / FRAME_SAMPLES >= self.max_frames
    }

    /// Consume the collected samples, leaving the endpointer empty.
    pub fn take(&mut self) -> Vec<f32> {
        std::mem::take(&mut self.collected)
    }
}

// ---------------------------------------------------------------------------
// MicSource
// ---------------------------------------------------------------------------

/// Production [`UtteranceSource`] reading from the default microphone.
///
/// Chunks arrive over an mpsc channel from the audio callback and are
/// downmixed/resampled to 16 kHz mono before endpointing.
///
/// The cpal stream is deliberately **not** owned here: [`MicSource::open`]
/// hands the [`StreamHandle`] back to the caller.  A blocked
/// [`capture_utterance`](UtteranceSource::capture_utterance) only returns
/// when a chunk arrives or the channel closes, so whoever shuts the
/// session down must be able to drop the handle while the source is still
/// sitting inside a blocking task.
pub struct MicSource {
    rx: mpsc::Receiver<AudioChunk>,
    config: AudioConfig,
    /// Threshold from the most recent calibration.
    threshold: f32,
    /// 16 kHz mono samples left over from the previous frame split.
    carry: VecDeque<f32>,
}

impl MicSource {
    /// Open the default microphone and start streaming.
    ///
    /// Returns the source together with the [`StreamHandle`] that keeps
    /// the stream alive.  Dropping the handle stops capture; the source
    /// then observes [`CaptureError::StreamClosed`] on its next receive.
    pub fn open(config: AudioConfig) -> Result<(Self, StreamHandle), CaptureError> {
        let mic = Microphone::open()?;
        log::info!(
            "microphone opened ({} Hz, {} ch)",
            mic.sample_rate(),
            mic.channels()
        );

        let (tx, rx) = mpsc::channel::<AudioChunk>();
        let handle = mic.start(tx)?;

        let threshold = config.min_energy_threshold;
        let source = Self {
            rx,
            config,
            threshold,
            carry: VecDeque::new(),
        };
        Ok((source, handle))
    }

    /// Receive the next chunk and convert it to 16 kHz mono.
    fn next_mono(&mut self) -> Result<Vec<f32>, CaptureError> {
        let chunk = self.rx.recv().map_err(|_| CaptureError::StreamClosed)?;
        let mono = downmix_mono(&chunk.samples, chunk.channels);
        Ok(resample(&mono, chunk.sample_rate, SERVICE_SAMPLE_RATE))
    }

    /// Pull one endpointing frame ([`FRAME_SAMPLES`] samples) out of the
    /// carry buffer, topping it up from the chunk channel as needed.
    fn next_frame(&mut self) -> Result<Vec<f32>, CaptureError> {
        while self.carry.len() < FRAME_SAMPLES {
            let mono = self.next_mono()?;
            self.carry.extend(mono);
        }
        Ok(self.carry.drain(..FRAME_SAMPLES).collect())
    }

    fn pause_frames(&self) -> usize {
        let frame_secs = FRAME_SAMPLES as f32 / SERVICE_SAMPLE_RATE as f32;
        (self.config.pause_secs / frame_secs).ceil() as usize
    }

    fn max_frames(&self) -> usize {
        let frame_secs = FRAME_SAMPLES as f32 / SERVICE_SAMPLE_RATE as f32;
        (self.config.max_utterance_secs / frame_secs).ceil() as usize
    }
}

impl UtteranceSource for MicSource {
    /// Gather `duration` worth of ambient audio and set the threshold to
    /// `ambient RMS × energy_multiplier`, floored at `min_energy_threshold`.
    fn calibrate(&mut self, duration: Duration) -> Result<f32, CaptureError> {
        let needed = (duration.as_secs_f32() * SERVICE_SAMPLE_RATE as f32) as usize;
        let mut ambient: Vec<f32> = Vec::with_capacity(needed.max(1));

        while ambient.len() < needed {
            let mono = self.next_mono()?;
            ambient.extend(mono);
        }

        let ambient_rms = rms(&ambient);
        self.threshold =
            (ambient_rms * self.config.energy_multiplier).max(self.config.min_energy_threshold);

        log::debug!(
            "calibrated: ambient rms {:.4}, threshold {:.4}",
            ambient_rms,
            self.threshold
        );
        Ok(self.threshold)
    }

    fn capture_utterance(&mut self) -> Result<Utterance, CaptureError> {
        let mut endpointer =
            Endpointer::new(self.threshold, self.pause_frames(), self.max_frames());

        loop {
            let frame = self.next_frame()?;
            if endpointer.push_frame(&frame) {
                let samples = endpointer.take();
                let utterance = Utterance {
                    samples,
                    sample_rate: SERVICE_SAMPLE_RATE,
                };
                log::debug!("captured utterance: {:.2} s", utterance.duration_secs());
                return Ok(utterance);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet() -> Vec<f32> {
        vec![0.0_f32; FRAME_SAMPLES]
    }

    fn loud() -> Vec<f32> {
        vec![0.5_f32; FRAME_SAMPLES]
    }

    // ---- rms ---------------------------------------------------------------

    #[test]
    fn rms_of_empty_is_zero() {
        assert_eq!(rms(&[]), 0.0);
    }

    #[test]
    fn rms_of_silence_is_zero() {
        assert_eq!(rms(&quiet()), 0.0);
    }

    #[test]
    fn rms_of_constant_signal() {
        // RMS of a constant 0.5 signal is 0.5
        assert!((rms(&loud()) - 0.5).abs() < 1e-6);
    }

    // ---- Endpointer --------------------------------------------------------

    #[test]
    fn discards_frames_before_onset() {
        let mut ep = Endpointer::new(0.1, 2, 1000);
        for _ in 0..10 {
            assert!(!ep.push_frame(&quiet()));
        }
        assert!(!ep.speech_started());
        assert!(ep.take().is_empty());
    }

    #[test]
    fn onset_starts_collection() {
        let mut ep = Endpointer::new(0.1, 2, 1000);
        ep.push_frame(&quiet());
        ep.push_frame(&loud());
        assert!(ep.speech_started());
        assert_eq!(ep.take().len(), FRAME_SAMPLES);
    }

    #[test]
    fn pause_tail_completes_utterance() {
        let mut ep = Endpointer::new(0.1, 3, 1000);
        assert!(!ep.push_frame(&loud()));
        assert!(!ep.push_frame(&quiet()));
        assert!(!ep.push_frame(&quiet()));
        assert!(ep.push_frame(&quiet())); // third quiet frame in a row

        // Speech frame + the full pause tail are collected.
        assert_eq!(ep.take().len(), 4 * FRAME_SAMPLES);
    }

    #[test]
    fn short_pause_inside_speech_does_not_terminate() {
        let mut ep = Endpointer::new(0.1, 3, 1000);
        assert!(!ep.push_frame(&loud()));
        assert!(!ep.push_frame(&quiet()));
        assert!(!ep.push_frame(&quiet()));
        assert!(!ep.push_frame(&loud())); // voice resumes, quiet run resets
        assert!(!ep.push_frame(&quiet()));
        assert!(!ep.push_frame(&quiet()));
        assert!(ep.push_frame(&quiet()));
    }

    #[test]
    fn max_frames_caps_a_noisy_capture() {
        let mut ep = Endpointer::new(0.1, 100, 5);
        let mut done = false;
        for _ in 0..5 {
            done = ep.push_frame(&loud());
        }
        assert!(done, "capture must stop at the frame cap");
        assert_eq!(ep.take().len(), 5 * FRAME_SAMPLES);
    }

    #[test]
    fn take_resets_collected_samples() {
        let mut ep = Endpointer::new(0.1, 2, 1000);
        ep.push_frame(&loud());
        assert_eq!(ep.take().len(), FRAME_SAMPLES);
        assert!(ep.take().is_empty());
    }

    // ---- Utterance ---------------------------------------------------------

    #[test]
    fn utterance_duration() {
        let u = Utterance {
            samples: vec![0.0; SERVICE_SAMPLE_RATE as usize],
            sample_rate: SERVICE_SAMPLE_RATE,
        };
        assert!((u.duration_secs() - 1.0).abs() < 1e-6);
    }
}
