//! Synthesis parameter records.
//!
//! These map directly to the JSON parameter objects accepted at the WASM
//! boundary. Every field has a default; unrecognized selector strings fall
//! back to a documented default instead of failing.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{Result, check_range};

// ── Selectors ───────────────────────────────────────────────

/// Oscillator families evaluated by the note renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OscillatorKind {
    #[default]
    Sine,
    Square,
    Saw,
    Triangle,
    Supersaw,
    Noise,
    Fm,
    Am,
    Additive,
}

impl OscillatorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            OscillatorKind::Sine => "sine",
            OscillatorKind::Square => "square",
            OscillatorKind::Saw => "saw",
            OscillatorKind::Triangle => "triangle",
            OscillatorKind::Supersaw => "supersaw",
            OscillatorKind::Noise => "noise",
            OscillatorKind::Fm => "fm",
            OscillatorKind::Am => "am",
            OscillatorKind::Additive => "additive",
        }
    }

    /// Parse a kind name. Unknown names are treated as sine.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "square" => OscillatorKind::Square,
            "saw" | "sawtooth" => OscillatorKind::Saw,
            "triangle" => OscillatorKind::Triangle,
            "supersaw" => OscillatorKind::Supersaw,
            "noise" => OscillatorKind::Noise,
            "fm" => OscillatorKind::Fm,
            "am" => OscillatorKind::Am,
            "additive" => OscillatorKind::Additive,
            _ => OscillatorKind::Sine,
        }
    }
}

impl From<String> for OscillatorKind {
    fn from(s: String) -> Self {
        OscillatorKind::parse(&s)
    }
}

impl From<OscillatorKind> for String {
    fn from(k: OscillatorKind) -> Self {
        k.as_str().to_string()
    }
}

/// How the envelope ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EnvelopeMode {
    #[default]
    Linear,
    /// Only the release ramp is curved, raised to
    /// [`EXPONENTIAL_POWER`](crate::dsp::envelope::EXPONENTIAL_POWER).
    /// Attack and decay stay linear.
    Exponential,
    /// No release segment; holds at sustain through the last sample.
    NoRelease,
}

impl EnvelopeMode {
    pub fn as_str(self) -> &'static str {
        match self {
            EnvelopeMode::Linear => "linear",
            EnvelopeMode::Exponential => "exponential",
            EnvelopeMode::NoRelease => "no_release",
        }
    }

    /// Unknown names are treated as linear.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "exponential" | "exp" => EnvelopeMode::Exponential,
            "no_release" | "norelease" | "hold" => EnvelopeMode::NoRelease,
            _ => EnvelopeMode::Linear,
        }
    }
}

impl From<String> for EnvelopeMode {
    fn from(s: String) -> Self {
        EnvelopeMode::parse(&s)
    }
}

impl From<EnvelopeMode> for String {
    fn from(m: EnvelopeMode) -> Self {
        m.as_str().to_string()
    }
}

/// Where the LFO is applied. Only one target is active per note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LfoMode {
    #[default]
    None,
    Vibrato,
    Tremolo,
    Filter,
}

impl LfoMode {
    pub fn as_str(self) -> &'static str {
        match self {
            LfoMode::None => "none",
            LfoMode::Vibrato => "vibrato",
            LfoMode::Tremolo => "tremolo",
            LfoMode::Filter => "filter",
        }
    }

    /// Unknown names disable the LFO.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "vibrato" => LfoMode::Vibrato,
            "tremolo" => LfoMode::Tremolo,
            "filter" => LfoMode::Filter,
            _ => LfoMode::None,
        }
    }
}

impl From<String> for LfoMode {
    fn from(s: String) -> Self {
        LfoMode::parse(&s)
    }
}

impl From<LfoMode> for String {
    fn from(m: LfoMode) -> Self {
        m.as_str().to_string()
    }
}

/// LFO wave shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LfoWaveform {
    #[default]
    Sine,
    Triangle,
    Square,
    Saw,
}

impl LfoWaveform {
    pub fn as_str(self) -> &'static str {
        match self {
            LfoWaveform::Sine => "sine",
            LfoWaveform::Triangle => "triangle",
            LfoWaveform::Square => "square",
            LfoWaveform::Saw => "saw",
        }
    }

    /// Unknown names are treated as sine.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "triangle" => LfoWaveform::Triangle,
            "square" => LfoWaveform::Square,
            "saw" | "sawtooth" => LfoWaveform::Saw,
            _ => LfoWaveform::Sine,
        }
    }
}

impl From<String> for LfoWaveform {
    fn from(s: String) -> Self {
        LfoWaveform::parse(&s)
    }
}

impl From<LfoWaveform> for String {
    fn from(w: LfoWaveform) -> Self {
        w.as_str().to_string()
    }
}

/// Tempo-synced LFO rate: one LFO cycle per `note_fraction` of a whole note.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LfoSync {
    pub bpm: f64,
    /// 0.25 = quarter note, 0.125 = eighth note, ...
    pub note_fraction: f64,
}

impl LfoSync {
    /// `bpm / (240 * note_fraction)`; a quarter note at 120 BPM is 2 Hz.
    pub fn rate_hz(&self) -> f64 {
        self.bpm / (240.0 * self.note_fraction)
    }
}

// ── Synthesis Parameters ────────────────────────────────────

/// Parameters for one note render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthParams {
    #[serde(alias = "osc")]
    pub oscillator_kind: OscillatorKind,
    /// Attack time in seconds.
    pub attack: f64,
    /// Decay time in seconds.
    pub decay: f64,
    /// Sustain level [0, 1].
    #[serde(alias = "sustain")]
    pub sustain_level: f64,
    /// Release time in seconds.
    pub release: f64,
    #[serde(alias = "env_mode")]
    pub envelope_mode: EnvelopeMode,
    /// LFO rate in Hz, ignored when `lfo_sync` is set.
    pub lfo_rate: f64,
    /// LFO depth [0, 1].
    pub lfo_depth: f64,
    pub lfo_mode: LfoMode,
    #[serde(alias = "lfo_wave")]
    pub lfo_waveform: LfoWaveform,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lfo_sync: Option<LfoSync>,
    /// Modulator frequency in Hz (fm, am).
    #[serde(alias = "mod_freq")]
    pub modulator_frequency: f64,
    /// FM modulation index.
    #[serde(alias = "mod_index")]
    pub modulation_index: f64,
    /// AM modulation depth.
    #[serde(alias = "mod_depth")]
    pub modulation_depth: f64,
    /// Number of partials for the additive oscillator.
    pub harmonic_count: u32,
    /// Output gain [0, 1].
    pub volume: f64,
    /// Seed for the noise oscillator. `None` draws a fresh seed per render.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub noise_seed: Option<u64>,
}

impl Default for SynthParams {
    fn default() -> Self {
        SynthParams {
            oscillator_kind: OscillatorKind::Sine,
            attack: 0.01,
            decay: 0.1,
            sustain_level: 0.7,
            release: 0.1,
            envelope_mode: EnvelopeMode::Linear,
            lfo_rate: 5.0,
            lfo_depth: 0.0,
            lfo_mode: LfoMode::None,
            lfo_waveform: LfoWaveform::Sine,
            lfo_sync: None,
            modulator_frequency: 110.0,
            modulation_index: 2.0,
            modulation_depth: 0.5,
            harmonic_count: 8,
            volume: 0.8,
            noise_seed: None,
        }
    }
}

impl SynthParams {
    /// Decode from a JSON object and validate.
    pub fn from_json(json: &str) -> Result<Self> {
        let params: SynthParams = serde_json::from_str(json)?;
        params.validate()?;
        Ok(params)
    }

    /// Check every numeric field against its allowed range.
    ///
    /// Envelope times only need to be finite and non-negative; zero-length
    /// segments are clamped by the envelope itself.
    pub fn validate(&self) -> Result<()> {
        check_range("attack", self.attack, 0.0..=f64::MAX)?;
        check_range("decay", self.decay, 0.0..=f64::MAX)?;
        check_range("release", self.release, 0.0..=f64::MAX)?;
        check_range("sustain_level", self.sustain_level, 0.0..=1.0)?;
        check_range("lfo_rate", self.lfo_rate, 0.0..=f64::MAX)?;
        check_range("lfo_depth", self.lfo_depth, 0.0..=1.0)?;
        check_range("modulator_frequency", self.modulator_frequency, 0.0..=f64::MAX)?;
        check_range("modulation_index", self.modulation_index, f64::MIN..=f64::MAX)?;
        check_range("modulation_depth", self.modulation_depth, f64::MIN..=f64::MAX)?;
        check_range("harmonic_count", self.harmonic_count as f64, 1.0..=f64::MAX)?;
        check_range("volume", self.volume, 0.0..=1.0)?;
        if let Some(sync) = &self.lfo_sync {
            check_range("lfo_sync.bpm", sync.bpm, f64::MIN_POSITIVE..=f64::MAX)?;
            check_range(
                "lfo_sync.note_fraction",
                sync.note_fraction,
                f64::MIN_POSITIVE..=f64::MAX,
            )?;
        }
        Ok(())
    }

    /// LFO rate in Hz after resolving tempo sync.
    pub fn effective_lfo_rate(&self) -> f64 {
        match &self.lfo_sync {
            Some(sync) => sync.rate_hz(),
            None => self.lfo_rate,
        }
    }

    /// Whether the LFO stage contributes to this render.
    pub fn lfo_active(&self) -> bool {
        self.lfo_mode != LfoMode::None && self.lfo_depth > 0.0
    }
}

// ── Track Parameters ────────────────────────────────────────

/// Name of the fallback entry in [`TrackParams`].
pub const DEFAULT_TRACK: &str = "default";

/// Per-track synthesis parameters with a `"default"` fallback.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackParams(pub HashMap<String, SynthParams>);

impl TrackParams {
    pub fn new() -> Self {
        TrackParams(HashMap::new())
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let tracks: TrackParams = serde_json::from_str(json)?;
        for params in tracks.0.values() {
            params.validate()?;
        }
        Ok(tracks)
    }

    pub fn insert(&mut self, track: impl Into<String>, params: SynthParams) {
        self.0.insert(track.into(), params);
    }

    /// Parameters for `track`, else the `"default"` entry, else built-in defaults.
    pub fn resolve(&self, track: &str) -> SynthParams {
        self.0
            .get(track)
            .or_else(|| self.0.get(DEFAULT_TRACK))
            .cloned()
            .unwrap_or_default()
    }
}
