//! Low-frequency oscillator and its three note-level applications.

use std::f64::consts::TAU;

use crate::params::{LfoMode, LfoWaveform, SynthParams};

use super::oscillator::{saw, sign, triangle};

/// A slow periodic modulation source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lfo {
    /// Rate in Hz.
    pub rate: f64,
    /// Depth [0, 1].
    pub depth: f64,
    pub waveform: LfoWaveform,
}

impl Lfo {
    pub fn new(rate: f64, depth: f64, waveform: LfoWaveform) -> Self {
        Lfo {
            rate,
            depth,
            waveform,
        }
    }

    /// Rate derived from tempo: one cycle per `note_fraction` of a whole note.
    pub fn synced(bpm: f64, note_fraction: f64, depth: f64, waveform: LfoWaveform) -> Self {
        Lfo::new(bpm / (240.0 * note_fraction), depth, waveform)
    }

    pub fn from_params(params: &SynthParams) -> Self {
        Lfo::new(
            params.effective_lfo_rate(),
            params.lfo_depth,
            params.lfo_waveform,
        )
    }

    /// Raw wave at time `t`, in [-1, 1].
    fn shape(&self, t: f64) -> f64 {
        let phase = self.rate * t;
        match self.waveform {
            LfoWaveform::Sine => (TAU * phase).sin(),
            LfoWaveform::Triangle => triangle(phase),
            LfoWaveform::Square => sign((TAU * phase).sin()),
            LfoWaveform::Saw => saw(phase),
        }
    }

    /// Depth-scaled bipolar value in [-depth, depth].
    pub fn bipolar(&self, t: f64) -> f64 {
        self.depth * self.shape(t)
    }

    /// Depth-scaled unipolar value in [0, depth].
    pub fn unipolar(&self, t: f64) -> f64 {
        self.depth * 0.5 * (self.shape(t) + 1.0)
    }

    /// Carrier phase (cycles) under vibrato: the running integral of
    /// `f + f * lfo(t)` sampled at `times`.
    pub fn vibrato_phases(&self, frequency: f64, times: &[f64], sample_rate: u32) -> Vec<f64> {
        let dt = 1.0 / sample_rate as f64;
        let mut phase = 0.0;
        times
            .iter()
            .map(|&t| {
                let current = phase;
                phase += frequency * (1.0 + self.bipolar(t)) * dt;
                current
            })
            .collect()
    }

    /// Apply an amplitude-domain mode in place. Vibrato and `None` are no-ops
    /// here; vibrato acts on the phase before oscillator evaluation.
    pub fn apply(&self, mode: LfoMode, signal: &mut [f64], times: &[f64]) {
        match mode {
            LfoMode::Tremolo => {
                for (s, &t) in signal.iter_mut().zip(times) {
                    *s *= 1.0 + self.unipolar(t);
                }
            }
            LfoMode::Filter => {
                for (s, &t) in signal.iter_mut().zip(times) {
                    *s *= 0.5 + self.unipolar(t);
                }
            }
            LfoMode::Vibrato | LfoMode::None => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::buffer::time_vector;

    #[test]
    fn ranges_respect_depth() {
        let t = time_vector(44100, 44100);
        for waveform in [
            LfoWaveform::Sine,
            LfoWaveform::Triangle,
            LfoWaveform::Square,
            LfoWaveform::Saw,
        ] {
            let lfo = Lfo::new(3.0, 0.4, waveform);
            for &x in &t {
                let b = lfo.bipolar(x);
                let u = lfo.unipolar(x);
                assert!((-0.4..=0.4).contains(&b), "{waveform:?} bipolar {b}");
                assert!((0.0..=0.4).contains(&u), "{waveform:?} unipolar {u}");
            }
        }
    }

    #[test]
    fn synced_rate() {
        let lfo = Lfo::synced(120.0, 0.25, 1.0, LfoWaveform::Sine);
        assert!((lfo.rate - 2.0).abs() < 1e-12);
        let eighth = Lfo::synced(120.0, 0.125, 1.0, LfoWaveform::Sine);
        assert!((eighth.rate - 4.0).abs() < 1e-12);
    }

    #[test]
    fn tremolo_and_filter_gain_bounds() {
        let t = time_vector(4410, 44100);
        let lfo = Lfo::new(5.0, 1.0, LfoWaveform::Sine);

        let mut trem = vec![1.0; t.len()];
        lfo.apply(LfoMode::Tremolo, &mut trem, &t);
        assert!(trem.iter().all(|&g| (1.0..=2.0).contains(&g)));

        let mut filt = vec![1.0; t.len()];
        lfo.apply(LfoMode::Filter, &mut filt, &t);
        assert!(filt.iter().all(|&g| (0.5..=1.5).contains(&g)));

        let mut none = vec![1.0; t.len()];
        lfo.apply(LfoMode::Vibrato, &mut none, &t);
        assert!(none.iter().all(|&g| g == 1.0));
    }

    #[test]
    fn zero_depth_vibrato_is_linear_phase() {
        let t = time_vector(1000, 44100);
        let lfo = Lfo::new(5.0, 0.0, LfoWaveform::Sine);
        let phases = lfo.vibrato_phases(440.0, &t, 44100);
        for (p, &x) in phases.iter().zip(&t) {
            assert!((p - 440.0 * x).abs() < 1e-9, "phase {p} vs {}", 440.0 * x);
        }
    }

    #[test]
    fn vibrato_bends_phase() {
        let t = time_vector(44100, 44100);
        let lfo = Lfo::new(2.0, 0.05, LfoWaveform::Sine);
        let phases = lfo.vibrato_phases(440.0, &t, 44100);
        // A quarter LFO cycle in, the pitch has been raised the whole time.
        let i = 44100 / 8;
        assert!(phases[i] > 440.0 * t[i], "vibrato should run ahead during the rising half");
    }
}
