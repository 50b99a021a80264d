//! Brainwave entrainment generators.
//!
//! Stereo sine generators that bypass the note renderer: binaural beats,
//! isochronic pulses, a hybrid of both, hemisync cross-panning and plain
//! fixed tones. A [`Timeline`] chains heterogeneous segments end to end.
//!
//! Unlike the note and sequencer paths, timelines are strict: a segment
//! with an unknown `mode` is an error, not a silent fallback.

use std::f64::consts::TAU;

use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::dsp::buffer::{
    SampleBuffer, check_frames, check_sample_rate, sample_count, time_vector,
};
use crate::dsp::oscillator::sign;
use crate::dsp::renderer::check_frequency;
use crate::error::{RenderError, Result, check_range};

/// Output gain used when a caller does not give one.
pub const DEFAULT_VOLUME: f64 = 0.8;

/// Rate of the hemisync left/right panning LFO.
pub const HEMISYNC_PAN_RATE: f64 = 0.2;

/// Brainwave frequency bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrainwaveBand {
    Delta,
    Theta,
    Alpha,
    Beta,
    Gamma,
}

impl BrainwaveBand {
    /// Musical tempo associated with the band.
    pub fn tempo_bpm(self) -> f64 {
        match self {
            BrainwaveBand::Delta => 40.0,
            BrainwaveBand::Theta => 60.0,
            BrainwaveBand::Alpha => 80.0,
            BrainwaveBand::Beta => 110.0,
            BrainwaveBand::Gamma => 140.0,
        }
    }
}

fn tone(freq: f64, t: f64) -> f64 {
    (TAU * freq * t).sin()
}

/// 50% duty on/off gate: 1 while `sin(2π f t) > 0`, 0 while negative.
fn pulse_gate(freq: f64, t: f64) -> f64 {
    0.5 * (1.0 + sign((TAU * freq * t).sin()))
}

/// Validate volume and duration, returning the time vector.
fn prepare(duration: f64, volume: f64, sample_rate: u32) -> Result<Vec<f64>> {
    check_range("volume", volume, 0.0..=1.0)?;
    let n = sample_count(duration, sample_rate)?;
    Ok(time_vector(n, sample_rate))
}

fn check_beat(beat: f64) -> Result<()> {
    check_range("beat", beat, f64::MIN..=f64::MAX)
}

/// Left at `carrier`, right at `carrier + beat`.
pub fn binaural_beats(
    carrier: f64,
    beat: f64,
    duration: f64,
    volume: f64,
    sample_rate: u32,
) -> Result<SampleBuffer> {
    check_frequency(carrier)?;
    check_beat(beat)?;
    check_frequency(carrier + beat)?;
    let t = prepare(duration, volume, sample_rate)?;
    let left: Vec<f64> = t.iter().map(|&x| volume * tone(carrier, x)).collect();
    let right: Vec<f64> = t.iter().map(|&x| volume * tone(carrier + beat, x)).collect();
    Ok(SampleBuffer::stereo(&left, &right, sample_rate))
}

/// One carrier gated on and off at `pulse_freq`, same in both ears.
pub fn isochronic_tones(
    carrier: f64,
    pulse_freq: f64,
    duration: f64,
    volume: f64,
    sample_rate: u32,
) -> Result<SampleBuffer> {
    check_frequency(carrier)?;
    check_frequency(pulse_freq)?;
    let t = prepare(duration, volume, sample_rate)?;
    let mono: Vec<f64> = t
        .iter()
        .map(|&x| volume * tone(carrier, x) * pulse_gate(pulse_freq, x))
        .collect();
    Ok(SampleBuffer::stereo(&mono, &mono, sample_rate))
}

/// Binaural pair additionally gated by an isochronic pulse at the beat rate.
pub fn hybrid(
    carrier: f64,
    beat: f64,
    duration: f64,
    volume: f64,
    sample_rate: u32,
) -> Result<SampleBuffer> {
    check_frequency(carrier)?;
    check_frequency(beat)?;
    let t = prepare(duration, volume, sample_rate)?;
    let mut left = Vec::with_capacity(t.len());
    let mut right = Vec::with_capacity(t.len());
    for &x in &t {
        let gate = volume * pulse_gate(beat, x);
        left.push(gate * tone(carrier, x));
        right.push(gate * tone(carrier + beat, x));
    }
    Ok(SampleBuffer::stereo(&left, &right, sample_rate))
}

/// Two offset tones cross-blended between the ears by a 0.2 Hz pan LFO.
pub fn hemisync(
    carrier_l: f64,
    carrier_r: f64,
    beat_l: f64,
    beat_r: f64,
    duration: f64,
    volume: f64,
    sample_rate: u32,
) -> Result<SampleBuffer> {
    check_beat(beat_l)?;
    check_beat(beat_r)?;
    let freq_l = carrier_l + beat_l;
    let freq_r = carrier_r + beat_r;
    check_frequency(freq_l)?;
    check_frequency(freq_r)?;
    let t = prepare(duration, volume, sample_rate)?;
    let mut left = Vec::with_capacity(t.len());
    let mut right = Vec::with_capacity(t.len());
    for &x in &t {
        let l = tone(freq_l, x);
        let r = tone(freq_r, x);
        let pan = 0.5 * (tone(HEMISYNC_PAN_RATE, x) + 1.0);
        left.push(volume * (l * (1.0 - pan) + r * pan));
        right.push(volume * (r * (1.0 - pan) + l * pan));
    }
    Ok(SampleBuffer::stereo(&left, &right, sample_rate))
}

/// A single frequency duplicated to both channels.
pub fn fixed_tone(
    frequency: f64,
    duration: f64,
    volume: f64,
    sample_rate: u32,
) -> Result<SampleBuffer> {
    check_frequency(frequency)?;
    let t = prepare(duration, volume, sample_rate)?;
    let mono: Vec<f64> = t.iter().map(|&x| volume * tone(frequency, x)).collect();
    Ok(SampleBuffer::stereo(&mono, &mono, sample_rate))
}

// ── Timeline ────────────────────────────────────────────────

/// Mode tags accepted in a timeline segment.
pub const SEGMENT_MODES: [&str; 6] = [
    "binaural",
    "isochronic",
    "hybrid",
    "hemisync",
    "fixed_tone",
    "solfeggio",
];

/// One timeline segment, tagged by `mode`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Segment {
    Binaural {
        carrier: f64,
        beat: f64,
        duration: f64,
    },
    Isochronic {
        carrier: f64,
        #[serde(alias = "pulse")]
        pulse_freq: f64,
        duration: f64,
    },
    Hybrid {
        carrier: f64,
        beat: f64,
        duration: f64,
    },
    Hemisync {
        carrier_l: f64,
        carrier_r: f64,
        beat_l: f64,
        beat_r: f64,
        duration: f64,
    },
    #[serde(alias = "solfeggio")]
    FixedTone {
        #[serde(alias = "freq")]
        frequency: f64,
        duration: f64,
    },
}

impl Segment {
    /// Decode one segment, failing loudly on a missing or unknown mode.
    pub fn from_value(value: Value) -> Result<Self> {
        let mode = value
            .get("mode")
            .and_then(Value::as_str)
            .ok_or(RenderError::MissingBrainwaveMode)?;
        if !SEGMENT_MODES.contains(&mode) {
            return Err(RenderError::UnknownBrainwaveMode(mode.to_string()));
        }
        Ok(serde_json::from_value(value)?)
    }

    pub fn duration(&self) -> f64 {
        match *self {
            Segment::Binaural { duration, .. }
            | Segment::Isochronic { duration, .. }
            | Segment::Hybrid { duration, .. }
            | Segment::Hemisync { duration, .. }
            | Segment::FixedTone { duration, .. } => duration,
        }
    }

    pub fn render(&self, volume: f64, sample_rate: u32) -> Result<SampleBuffer> {
        match *self {
            Segment::Binaural {
                carrier,
                beat,
                duration,
            } => binaural_beats(carrier, beat, duration, volume, sample_rate),
            Segment::Isochronic {
                carrier,
                pulse_freq,
                duration,
            } => isochronic_tones(carrier, pulse_freq, duration, volume, sample_rate),
            Segment::Hybrid {
                carrier,
                beat,
                duration,
            } => hybrid(carrier, beat, duration, volume, sample_rate),
            Segment::Hemisync {
                carrier_l,
                carrier_r,
                beat_l,
                beat_r,
                duration,
            } => hemisync(
                carrier_l,
                carrier_r,
                beat_l,
                beat_r,
                duration,
                volume,
                sample_rate,
            ),
            Segment::FixedTone {
                frequency,
                duration,
            } => fixed_tone(frequency, duration, volume, sample_rate),
        }
    }
}

/// An ordered chain of segments rendered back to back.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Timeline {
    pub volume: f64,
    pub segments: Vec<Segment>,
}

impl Default for Timeline {
    fn default() -> Self {
        Timeline {
            volume: DEFAULT_VOLUME,
            segments: Vec::new(),
        }
    }
}

impl Timeline {
    pub fn new(segments: Vec<Segment>) -> Self {
        Timeline {
            segments,
            ..Timeline::default()
        }
    }

    /// Decode either a bare segment array or `{"volume": .., "segments": [..]}`.
    pub fn from_json(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        let (volume, items): (f64, Vec<Value>) = match value {
            Value::Object(mut map) => {
                let volume = match map.remove("volume") {
                    Some(v) => serde_json::from_value(v)?,
                    None => DEFAULT_VOLUME,
                };
                let items = match map.remove("segments") {
                    Some(v) => serde_json::from_value(v)?,
                    None => Vec::new(),
                };
                (volume, items)
            }
            other => (DEFAULT_VOLUME, serde_json::from_value(other)?),
        };
        check_range("volume", volume, 0.0..=1.0)?;
        let segments = items
            .into_iter()
            .map(Segment::from_value)
            .collect::<Result<Vec<_>>>()?;
        Ok(Timeline { volume, segments })
    }

    /// Total length in seconds.
    pub fn duration(&self) -> f64 {
        self.segments.iter().map(Segment::duration).sum()
    }

    /// Render every segment and concatenate into one stereo buffer.
    ///
    /// The combined length is checked against the buffer ceiling before any
    /// segment is rendered.
    pub fn render(&self, sample_rate: u32) -> Result<SampleBuffer> {
        check_sample_rate(sample_rate)?;
        let mut frames = 0usize;
        for segment in &self.segments {
            frames = frames.saturating_add(sample_count(segment.duration(), sample_rate)?);
        }
        check_frames(frames)?;
        debug!(
            "render_timeline: {} segments, {frames} frames",
            self.segments.len()
        );

        let mut samples = Vec::with_capacity(frames * 2);
        for segment in &self.segments {
            samples.extend(segment.render(self.volume, sample_rate)?.samples);
        }
        Ok(SampleBuffer {
            samples,
            sample_rate,
            channels: 2,
        })
    }
}
