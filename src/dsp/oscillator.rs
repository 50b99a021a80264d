//! Closed-form oscillator bank.
//!
//! Every waveform is evaluated from the carrier phase (in cycles) and the
//! absolute time, so a whole note is one pass over a time vector. Vibrato
//! feeds an integrated phase instead of `f * t`.

use std::f64::consts::TAU;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::params::{OscillatorKind, SynthParams};

/// Relative detune of the seven supersaw voices.
pub const SUPERSAW_DETUNE: [f64; 7] = [-0.02, -0.01, -0.005, 0.0, 0.006, 0.012, 0.02];

/// Sign with a true zero: `sign(0) == 0`.
pub fn sign(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Sawtooth at `phase` cycles: `2 * (phase - floor(phase + 0.5))`, in [-1, 1).
pub fn saw(phase: f64) -> f64 {
    2.0 * (phase - (phase + 0.5).floor())
}

/// Triangle derived from the sawtooth: `2 * |saw| - 1`.
pub fn triangle(phase: f64) -> f64 {
    2.0 * saw(phase).abs() - 1.0
}

/// A waveform generator for one oscillator family.
#[derive(Debug, Clone)]
pub struct Oscillator {
    pub kind: OscillatorKind,
    /// Modulator frequency in Hz (fm, am).
    pub modulator_frequency: f64,
    /// FM index.
    pub modulation_index: f64,
    /// AM depth.
    pub modulation_depth: f64,
    /// Partials summed by the additive oscillator.
    pub harmonic_count: u32,
    /// Noise source, created on first use by the noise kind.
    rng: Option<SmallRng>,
}

/// Seed for an unseeded noise oscillator.
#[cfg(target_arch = "wasm32")]
fn fresh_seed() -> u64 {
    fastrand::u64(..)
}

#[cfg(not(target_arch = "wasm32"))]
fn fresh_seed() -> u64 {
    rand::rng().random()
}

impl Oscillator {
    pub fn new(kind: OscillatorKind) -> Self {
        let defaults = SynthParams::default();
        Oscillator {
            kind,
            modulator_frequency: defaults.modulator_frequency,
            modulation_index: defaults.modulation_index,
            modulation_depth: defaults.modulation_depth,
            harmonic_count: defaults.harmonic_count,
            rng: None,
        }
    }

    /// Configure kind, modulator settings and noise seed from a parameter record.
    pub fn from_params(params: &SynthParams) -> Self {
        let mut osc = Oscillator::new(params.oscillator_kind);
        osc.modulator_frequency = params.modulator_frequency;
        osc.modulation_index = params.modulation_index;
        osc.modulation_depth = params.modulation_depth;
        osc.harmonic_count = params.harmonic_count.max(1);
        if let (OscillatorKind::Noise, Some(seed)) = (osc.kind, params.noise_seed) {
            osc.reseed(seed);
        }
        osc
    }

    /// Make the noise oscillator reproducible.
    pub fn reseed(&mut self, seed: u64) {
        self.rng = Some(SmallRng::seed_from_u64(seed));
    }

    /// Evaluate one sample at carrier `phase` (cycles) and time `t` (seconds).
    pub fn sample(&mut self, phase: f64, t: f64) -> f64 {
        match self.kind {
            OscillatorKind::Sine => (TAU * phase).sin(),
            OscillatorKind::Square => sign((TAU * phase).sin()),
            OscillatorKind::Saw => saw(phase),
            OscillatorKind::Triangle => triangle(phase),
            OscillatorKind::Supersaw => {
                let sum: f64 = SUPERSAW_DETUNE.iter().map(|d| saw(phase * (1.0 + d))).sum();
                sum / SUPERSAW_DETUNE.len() as f64
            }
            OscillatorKind::Noise => self
                .rng
                .get_or_insert_with(|| SmallRng::seed_from_u64(fresh_seed()))
                .random_range(-1.0..=1.0),
            OscillatorKind::Fm => {
                let m = (TAU * self.modulator_frequency * t).sin();
                (TAU * phase + self.modulation_index * m).sin()
            }
            OscillatorKind::Am => {
                let m = (TAU * self.modulator_frequency * t).sin();
                (1.0 + self.modulation_depth * m) * (TAU * phase).sin()
            }
            OscillatorKind::Additive => (1..=self.harmonic_count.max(1))
                .map(|h| {
                    let h = h as f64;
                    (TAU * h * phase).sin() / h
                })
                .sum::<f64>(),
        }
    }

    /// Render a fixed-frequency tone over `times`.
    pub fn render(&mut self, frequency: f64, times: &[f64]) -> Vec<f64> {
        times.iter().map(|&t| self.sample(frequency * t, t)).collect()
    }

    /// Render from a precomputed carrier phase track (cycles), one entry per time.
    pub fn render_phases(&mut self, phases: &[f64], times: &[f64]) -> Vec<f64> {
        debug_assert_eq!(phases.len(), times.len());
        phases
            .iter()
            .zip(times)
            .map(|(&phase, &t)| self.sample(phase, t))
            .collect()
    }
}
