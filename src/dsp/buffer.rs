//! Sample buffers, time vectors and peak normalization.

use serde::Serialize;

use crate::error::{RenderError, Result};

/// Default output sample rate in Hz.
pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;

/// Guard added to every peak denominator so silence normalizes to silence.
pub const NORMALIZE_EPSILON: f64 = 1e-9;

/// Largest buffer, in frames per channel, the core will allocate:
/// one hour at 44.1 kHz.
pub const MAX_FRAMES: usize = 44_100 * 60 * 60;

/// A rendered block of audio.
///
/// Stereo buffers are interleaved `[L0, R0, L1, R1, ...]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SampleBuffer {
    pub samples: Vec<f64>,
    pub sample_rate: u32,
    pub channels: u16,
}

impl SampleBuffer {
    pub fn mono(samples: Vec<f64>, sample_rate: u32) -> Self {
        SampleBuffer {
            samples,
            sample_rate,
            channels: 1,
        }
    }

    /// Interleave two equal-length channels.
    pub fn stereo(left: &[f64], right: &[f64], sample_rate: u32) -> Self {
        debug_assert_eq!(left.len(), right.len());
        let mut samples = Vec::with_capacity(left.len() * 2);
        for (&l, &r) in left.iter().zip(right) {
            samples.push(l);
            samples.push(r);
        }
        SampleBuffer {
            samples,
            sample_rate,
            channels: 2,
        }
    }

    /// Number of frames (samples per channel).
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels.max(1) as usize
    }

    pub fn duration_seconds(&self) -> f64 {
        self.frames() as f64 / self.sample_rate as f64
    }

    /// Copy out one channel. Returns an empty vector for an out-of-range index.
    pub fn channel(&self, index: usize) -> Vec<f64> {
        let channels = self.channels.max(1) as usize;
        if index >= channels {
            return Vec::new();
        }
        self.samples
            .iter()
            .skip(index)
            .step_by(channels)
            .copied()
            .collect()
    }

    pub fn peak(&self) -> f64 {
        peak(&self.samples)
    }

    /// Narrow to f32 for playback hosts.
    pub fn to_f32(&self) -> Vec<f32> {
        self.samples.iter().map(|&s| s as f32).collect()
    }
}

/// Validate a sample rate.
pub fn check_sample_rate(sample_rate: u32) -> Result<()> {
    if sample_rate == 0 {
        return Err(RenderError::InvalidSampleRate);
    }
    Ok(())
}

/// Number of samples for `duration` seconds: `round(duration * rate)`.
///
/// Fails on a negative or non-finite duration, and when the result would
/// exceed [`MAX_FRAMES`].
pub fn sample_count(duration: f64, sample_rate: u32) -> Result<usize> {
    check_sample_rate(sample_rate)?;
    if !duration.is_finite() || duration < 0.0 {
        return Err(RenderError::InvalidDuration(duration));
    }
    let frames = (duration * sample_rate as f64).round();
    if frames > MAX_FRAMES as f64 {
        return Err(RenderError::BufferTooLong {
            frames: frames as usize,
            max: MAX_FRAMES,
        });
    }
    Ok(frames as usize)
}

/// Reject a frame total that would exceed [`MAX_FRAMES`].
pub fn check_frames(frames: usize) -> Result<()> {
    if frames > MAX_FRAMES {
        return Err(RenderError::BufferTooLong {
            frames,
            max: MAX_FRAMES,
        });
    }
    Ok(())
}

/// `n` timestamps in seconds, spaced `1 / sample_rate` apart from zero.
pub fn time_vector(n: usize, sample_rate: u32) -> Vec<f64> {
    let dt = 1.0 / sample_rate as f64;
    (0..n).map(|i| i as f64 * dt).collect()
}

/// Largest absolute sample value (0 for an empty slice).
pub fn peak(samples: &[f64]) -> f64 {
    samples.iter().fold(0.0, |m, s| m.max(s.abs()))
}

/// Divide every sample by `peak + NORMALIZE_EPSILON`.
pub fn peak_normalize(samples: &mut [f64]) {
    let denom = peak(samples) + NORMALIZE_EPSILON;
    for s in samples.iter_mut() {
        *s /= denom;
    }
}
