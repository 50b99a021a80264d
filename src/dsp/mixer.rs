//! Sums equal-length track buffers and peak-normalizes the result.

use crate::error::{RenderError, Result};

use super::buffer::peak_normalize;

/// A summing mixer for whole-track buffers.
///
/// Every track added must have the length of the first one; tracks are not
/// padded or truncated to line them up.
#[derive(Debug, Clone, Default)]
pub struct Mixer {
    buffer: Vec<f64>,
    tracks: usize,
}

impl Mixer {
    pub fn new() -> Self {
        Mixer::default()
    }

    /// Accumulate a named track.
    pub fn add_track(&mut self, name: &str, samples: &[f64]) -> Result<()> {
        if self.tracks == 0 {
            self.buffer = samples.to_vec();
        } else if samples.len() != self.buffer.len() {
            return Err(RenderError::TrackLengthMismatch {
                track: name.to_string(),
                expected: self.buffer.len(),
                found: samples.len(),
            });
        } else {
            for (m, s) in self.buffer.iter_mut().zip(samples) {
                *m += s;
            }
        }
        self.tracks += 1;
        Ok(())
    }

    /// Number of tracks mixed so far.
    pub fn track_count(&self) -> usize {
        self.tracks
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Consume the mixer, returning the peak-normalized sum.
    pub fn into_output(mut self) -> Vec<f64> {
        peak_normalize(&mut self.buffer);
        self.buffer
    }
}
