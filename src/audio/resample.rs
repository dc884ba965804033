//! Channel mixing and resampling utilities.
//!
//! The recognition service expects **16 kHz mono** PCM, while the capture
//! device delivers whatever the hardware prefers (often 44.1/48 kHz stereo).
//! Two conversion steps bridge the gap:
//!
//! 1. [`downmix_mono`] — average interleaved channels down to one.
//! 2. [`resample`]     — linear-interpolation rate conversion.

/// Sample rate (Hz) of every [`Utterance`](crate::audio::Utterance) handed
/// to the recognition service.
pub const SERVICE_SAMPLE_RATE: u32 = 16_000;

// ---------------------------------------------------------------------------
// downmix_mono
// ---------------------------------------------------------------------------

/// Mix interleaved multi-channel audio down to mono by averaging the
/// channels of each frame.
///
/// Already-mono input is returned as an owned `Vec` unchanged; a channel
/// count of zero yields an empty vector.
///
/// # Example
///
/// ```rust
/// use mic_scribe::audio::downmix_mono;
///
/// let stereo = vec![1.0_f32, 0.0, -0.5, 0.5]; // L R L R
/// let mono = downmix_mono(&stereo, 2);
/// assert_eq!(mono.len(), 2);
/// assert!((mono[0] - 0.5).abs() < 1e-6);
/// assert!((mono[1] - 0.0).abs() < 1e-6);
/// ```
pub fn downmix_mono(samples: &[f32], channels: u16) -> Vec<f32> {
    match channels {
        0 => Vec::new(),
        1 => samples.to_vec(),
        n => {
            let n = n as usize;
            samples
                .chunks_exact(n)
                .map(|frame| frame.iter().sum::<f32>() / n as f32)
                .collect()
        }
    }
}

// ---------------------------------------------------------------------------
// resample
// ---------------------------------------------------------------------------

/// Resample mono `samples` from `source_rate` Hz to `target_rate` Hz using
/// linear interpolation.
///
/// Matching rates and empty input are no-op fast paths.  The output length
/// is approximately `samples.len() * target_rate / source_rate`.
///
/// Linear interpolation is plenty for speech being sent to a recognition
/// service; the service's own front-end filters the signal again anyway.
pub fn resample(samples: &[f32], source_rate: u32, target_rate: u32) -> Vec<f32> {
    if source_rate == target_rate {
        return samples.to_vec();
    }
    if samples.is_empty() {
        return Vec::new();
    }

    let ratio = target_rate as f64 / source_rate as f64;
    let output_len = (samples.len() as f64 * ratio).ceil() as usize;
    let mut output = Vec::with_capacity(output_len);

    for i in 0..output_len {
        let src_pos = i as f64 / ratio;
        let idx = src_pos as usize;
        let frac = (src_pos - idx as f64) as f32;

        let sample = match (samples.get(idx), samples.get(idx + 1)) {
            (Some(&a), Some(&b)) => a * (1.0 - frac) + b * frac,
            (Some(&a), None) => a,
            _ => 0.0,
        };

        output.push(sample);
    }

    output
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
