//! ADSR envelope rendered over a whole note.
//!
//! The release occupies the final `release` seconds of the note no matter
//! where decay ends, so short notes lose their sustain (and possibly part of
//! attack/decay) rather than growing longer.

use crate::params::{EnvelopeMode, SynthParams};

/// Segment times below this are clamped up to it.
pub const MIN_SEGMENT_SECONDS: f64 = 1e-4;

/// Power applied to the linear release ramp in exponential mode.
pub const EXPONENTIAL_POWER: f64 = 3.0;

/// Envelope stages, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Attack,
    Decay,
    Sustain,
    Release,
}

/// ADSR envelope with linear attack/decay and a linear or exponential release.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    /// Attack time in seconds.
    pub attack: f64,
    /// Decay time in seconds.
    pub decay: f64,
    /// Sustain level [0, 1].
    pub sustain: f64,
    /// Release time in seconds.
    pub release: f64,
    pub mode: EnvelopeMode,
}

impl Default for Envelope {
    fn default() -> Self {
        Envelope::from_params(&SynthParams::default())
    }
}

/// Sample count of a segment, never less than one sample.
fn segment_samples(seconds: f64, sample_rate: u32) -> usize {
    let seconds = if seconds.is_finite() {
        seconds.max(MIN_SEGMENT_SECONDS)
    } else {
        MIN_SEGMENT_SECONDS
    };
    ((seconds * sample_rate as f64).round() as usize).max(1)
}

/// `from + (to - from) * j / (len - 1)`, the endpoint-inclusive ramp.
fn ramp(from: f64, to: f64, j: usize, len: usize) -> f64 {
    if len <= 1 {
        return to;
    }
    from + (to - from) * (j as f64 / (len - 1) as f64)
}

impl Envelope {
    pub fn from_params(params: &SynthParams) -> Self {
        Envelope {
            attack: params.attack,
            decay: params.decay,
            sustain: params.sustain_level.clamp(0.0, 1.0),
            release: params.release,
            mode: params.envelope_mode,
        }
    }

    /// Attack, decay and release lengths in samples for a note of `n` samples.
    fn layout(&self, n: usize, sample_rate: u32) -> (usize, usize, usize) {
        let a = segment_samples(self.attack, sample_rate);
        let d = segment_samples(self.decay, sample_rate);
        let r = match self.mode {
            EnvelopeMode::NoRelease => 0,
            _ => segment_samples(self.release, sample_rate).min(n),
        };
        (a, d, r)
    }

    /// Which stage sample `i` of an `n`-sample note falls in.
    pub fn stage_at(&self, i: usize, n: usize, sample_rate: u32) -> Stage {
        let (a, d, r) = self.layout(n, sample_rate);
        if i >= n - r {
            Stage::Release
        } else if i < a {
            Stage::Attack
        } else if i < a + d {
            Stage::Decay
        } else {
            Stage::Sustain
        }
    }

    /// Attack/decay/sustain level at sample `i`, ignoring release.
    fn held_level(&self, i: usize, a: usize, d: usize) -> f64 {
        if i < a {
            ramp(0.0, 1.0, i, a)
        } else if i < a + d {
            ramp(1.0, self.sustain, i - a, d)
        } else {
            self.sustain
        }
    }

    /// Render `n` envelope samples in [0, 1].
    pub fn render(&self, n: usize, sample_rate: u32) -> Vec<f64> {
        let (a, d, r) = self.layout(n, sample_rate);
        let release_start = n - r;

        let mut env: Vec<f64> = (0..release_start).map(|i| self.held_level(i, a, d)).collect();

        if r > 0 {
            // Continue from wherever the held curve is; a note that is all
            // release starts from the sustain level.
            let start = if release_start == 0 {
                self.sustain
            } else {
                self.held_level(release_start, a, d)
            };
            env.extend((0..r).map(|j| {
                let linear = ramp(1.0, 0.0, j, r);
                match self.mode {
                    EnvelopeMode::Exponential => start * linear.powf(EXPONENTIAL_POWER),
                    _ => start * linear,
                }
            }));
        }

        env
    }
}
