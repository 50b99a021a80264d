//! Step sequencer: lays patterns out in time and mixes tracks.
//!
//! Each step occupies one grid slot (every second slot stretched by swing).
//! A sounding step renders for `gate` of its slot and is padded with silence
//! for the rest. Note names missing from the frequency table are skipped
//! with a warning; a step whose names are all unknown is silent.

pub mod pattern;

use std::collections::BTreeMap;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::dsp::buffer::{SampleBuffer, check_frames, check_sample_rate, peak_normalize};
use crate::dsp::mixer::Mixer;
use crate::dsp::renderer::render_chord;
use crate::dsp::tuning::{FrequencyTable, TuningReference};
use crate::error::Result;
use crate::params::{SynthParams, TrackParams};

pub use pattern::{Pattern, Step, Subdivision, TimingConfig};

/// Track name → pattern, iterated in name order.
pub type PatternMap = BTreeMap<String, Pattern>;

/// Frequencies for the names of one step, skipping unknown names.
fn resolve_step(step: &Step, table: &FrequencyTable, index: usize) -> Vec<f64> {
    step.note_names()
        .iter()
        .filter_map(|name| {
            let freq = table.get(name);
            if freq.is_none() {
                warn!("step {index}: unknown note '{name}', skipped");
            }
            freq
        })
        .collect()
}

/// Render one track to a peak-normalized mono buffer.
pub fn render_track(
    pattern: &Pattern,
    table: &FrequencyTable,
    timing: &TimingConfig,
    params: &SynthParams,
    sample_rate: u32,
) -> Result<SampleBuffer> {
    check_sample_rate(sample_rate)?;
    timing.validate()?;
    params.validate()?;

    let bounds = timing.step_boundaries(pattern.len(), sample_rate);
    let total = bounds.last().copied().unwrap_or(0);
    check_frames(total)?;
    debug!(
        "render_track: {} steps, {total} samples at {} bpm",
        pattern.len(),
        timing.bpm
    );

    let sr = sample_rate as f64;
    let mut out = Vec::with_capacity(total);
    for (i, step) in pattern.iter().enumerate() {
        let step_samples = bounds[i + 1] - bounds[i];
        let freqs = resolve_step(step, table, i);
        if freqs.is_empty() {
            out.resize(out.len() + step_samples, 0.0);
            continue;
        }

        let note_samples =
            ((timing.step_duration(i) * timing.gate * sr).round() as usize).min(step_samples);
        let note = render_chord(&freqs, note_samples as f64 / sr, params, sample_rate)?;
        let start = out.len();
        out.extend(note.samples.iter().take(note_samples));
        // Pad both the rounding remainder of the note and the gate tail.
        out.resize(start + step_samples, 0.0);
    }

    peak_normalize(&mut out);
    Ok(SampleBuffer::mono(out, sample_rate))
}

/// Render every track with its own parameters (or the `"default"` entry),
/// sum them and peak-normalize the mix.
///
/// All tracks must render to the same length; a mismatch is reported as
/// [`RenderError::TrackLengthMismatch`](crate::error::RenderError::TrackLengthMismatch).
pub fn render_tracks(
    patterns: &PatternMap,
    table: &FrequencyTable,
    timing: &TimingConfig,
    track_params: &TrackParams,
    sample_rate: u32,
) -> Result<SampleBuffer> {
    check_sample_rate(sample_rate)?;
    let mut mixer = Mixer::new();
    for (name, pattern) in patterns {
        let params = track_params.resolve(name);
        let track = render_track(pattern, table, timing, &params, sample_rate)?;
        mixer.add_track(name, &track.samples)?;
    }
    debug!(
        "render_tracks: mixed {} tracks, {} samples",
        mixer.track_count(),
        mixer.len()
    );
    Ok(SampleBuffer::mono(mixer.into_output(), sample_rate))
}

/// A complete multi-track sequence request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Sequence {
    pub tracks: PatternMap,
    pub timing: TimingConfig,
    pub tuning: TuningReference,
    pub params: TrackParams,
}

impl Sequence {
    /// Decode a sequence from JSON and validate its records.
    pub fn from_json(json: &str) -> Result<Self> {
        let sequence: Sequence = serde_json::from_str(json)?;
        sequence.timing.validate()?;
        TuningReference::new(sequence.tuning.a4_hz)?;
        for params in sequence.params.0.values() {
            params.validate()?;
        }
        Ok(sequence)
    }

    pub fn render(&self, sample_rate: u32) -> Result<SampleBuffer> {
        let table = FrequencyTable::new(self.tuning);
        render_tracks(&self.tracks, &table, &self.timing, &self.params, sample_rate)
    }
}
