//! Scale-based melody generator paced by a brainwave band's tempo.
//!
//! Each beat either plays a random scale degree (with an occasional octave
//! shift and a random fraction-of-a-beat length) or rests for the beat.
//! Randomness comes from a seeded `SmallRng`, so a config always renders the
//! same melody.

use log::debug;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::brainwave::BrainwaveBand;
use crate::dsp::buffer::{SampleBuffer, check_frames, peak_normalize, sample_count};
use crate::dsp::renderer::{check_frequency, render_note};
use crate::error::{RenderError, Result, check_range};
use crate::params::{EnvelopeMode, LfoMode, LfoWaveform, OscillatorKind, SynthParams};

/// Chance that a beat sounds a note rather than resting.
pub const NOTE_PROBABILITY: f64 = 0.85;

const BEATS_PER_BAR: u32 = 4;
const NOTE_LENGTHS: [f64; 3] = [0.25, 0.5, 1.0];
/// Octave shifts, weighted toward staying put.
const OCTAVE_SHIFTS: [i32; 4] = [0, 0, 1, -1];

/// Seven-note modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scale {
    #[default]
    Minor,
    Major,
    Dorian,
    #[serde(alias = "phryg")]
    Phrygian,
    Lydian,
    #[serde(alias = "mixol")]
    Mixolydian,
    Locrian,
}

impl Scale {
    /// Semitone offsets from the tonic.
    pub fn intervals(self) -> [i32; 7] {
        match self {
            Scale::Minor => [0, 2, 3, 5, 7, 8, 10],
            Scale::Major => [0, 2, 4, 5, 7, 9, 11],
            Scale::Dorian => [0, 2, 3, 5, 7, 9, 10],
            Scale::Phrygian => [0, 1, 3, 5, 7, 8, 10],
            Scale::Lydian => [0, 2, 4, 6, 7, 9, 11],
            Scale::Mixolydian => [0, 2, 4, 5, 7, 9, 10],
            Scale::Locrian => [0, 1, 3, 5, 6, 8, 10],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MelodyConfig {
    /// Tonic frequency in Hz.
    pub tonic_hz: f64,
    pub band: BrainwaveBand,
    pub scale: Scale,
    pub bars: u32,
    pub volume: f64,
    pub seed: u64,
}

impl Default for MelodyConfig {
    fn default() -> Self {
        MelodyConfig {
            tonic_hz: 432.0,
            band: BrainwaveBand::Alpha,
            scale: Scale::Minor,
            bars: 8,
            volume: 0.7,
            seed: 0,
        }
    }
}

impl MelodyConfig {
    pub fn validate(&self) -> Result<()> {
        check_frequency(self.tonic_hz)?;
        check_range("bars", self.bars as f64, 1.0..=f64::MAX)?;
        check_range("volume", self.volume, 0.0..=1.0)?;
        Ok(())
    }

    /// Seconds per beat at the band's tempo.
    pub fn beat_seconds(&self) -> f64 {
        60.0 / self.band.tempo_bpm()
    }
}

/// Soft sine patch with an exponential release and a slow tremolo.
pub fn melody_params(volume: f64) -> SynthParams {
    SynthParams {
        oscillator_kind: OscillatorKind::Sine,
        attack: 0.01,
        decay: 0.2,
        sustain_level: 0.7,
        release: 0.2,
        envelope_mode: EnvelopeMode::Exponential,
        lfo_rate: 0.1,
        lfo_depth: 0.1,
        lfo_mode: LfoMode::Tremolo,
        lfo_waveform: LfoWaveform::Sine,
        volume,
        ..SynthParams::default()
    }
}

/// Render a generated melody to a peak-normalized mono buffer.
pub fn generate_melody(config: &MelodyConfig, sample_rate: u32) -> Result<SampleBuffer> {
    config.validate()?;
    let spb = config.beat_seconds();
    let beats = config
        .bars
        .checked_mul(BEATS_PER_BAR)
        .ok_or(RenderError::InvalidParameter {
            name: "bars",
            value: config.bars as f64,
        })?;
    // Every beat is at most one beat long.
    check_frames(sample_count(spb * beats as f64, sample_rate)?)?;

    let params = melody_params(config.volume);
    let intervals = config.scale.intervals();
    let mut rng = SmallRng::seed_from_u64(config.seed);
    let mut out = Vec::new();
    let mut notes = 0usize;

    for _ in 0..beats {
        if rng.random::<f64>() < NOTE_PROBABILITY {
            let interval = intervals[rng.random_range(0..intervals.len())];
            let octave = OCTAVE_SHIFTS[rng.random_range(0..OCTAVE_SHIFTS.len())];
            let semitones = (interval + 12 * octave) as f64;
            let freq = config.tonic_hz * (2.0_f64).powf(semitones / 12.0);
            let length = NOTE_LENGTHS[rng.random_range(0..NOTE_LENGTHS.len())];
            let note = render_note(freq, spb * length, &params, sample_rate)?;
            out.extend(note.samples);
            notes += 1;
        } else {
            out.resize(out.len() + sample_count(spb, sample_rate)?, 0.0);
        }
    }

    debug!(
        "generate_melody: {notes}/{beats} beats sounded, {} samples",
        out.len()
    );
    peak_normalize(&mut out);
    Ok(SampleBuffer::mono(out, sample_rate))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: u32 = 8000;

    #[test]
    fn same_seed_same_melody() {
        let config = MelodyConfig {
            bars: 2,
            seed: 42,
            ..MelodyConfig::default()
        };
        let a = generate_melody(&config, SR).unwrap();
        let b = generate_melody(&config, SR).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn different_seeds_differ() {
        let config = |seed| MelodyConfig {
            bars: 2,
            seed,
            ..MelodyConfig::default()
        };
        let a = generate_melody(&config(1), SR).unwrap();
        let b = generate_melody(&config(2), SR).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn output_is_normalized_and_bounded_in_length() {
        let config = MelodyConfig {
            band: BrainwaveBand::Gamma,
            bars: 4,
            ..MelodyConfig::default()
        };
        let buf = generate_melody(&config, SR).unwrap();
        let max_len = (config.beat_seconds() * 16.0 * SR as f64).round() as usize + 16;
        assert!(buf.samples.len() <= max_len, "{} > {max_len}", buf.samples.len());
        assert!(!buf.samples.is_empty());
        assert!(buf.peak() <= 1.0);
    }

    #[test]
    fn config_from_json_with_aliases() {
        let config: MelodyConfig =
            serde_json::from_str(r#"{"band": "theta", "scale": "phryg", "bars": 1}"#).unwrap();
        assert_eq!(config.band, BrainwaveBand::Theta);
        assert_eq!(config.scale, Scale::Phrygian);
        assert_eq!(config.tonic_hz, 432.0);
    }

    #[test]
    fn zero_bars_rejected() {
        let config = MelodyConfig {
            bars: 0,
            ..MelodyConfig::default()
        };
        assert!(generate_melody(&config, SR).is_err());
    }

    #[test]
    fn huge_bar_counts_are_errors() {
        for bars in [1 << 30, u32::MAX, 1 << 20] {
            let config = MelodyConfig {
                bars,
                ..MelodyConfig::default()
            };
            assert!(matches!(
                generate_melody(&config, SR),
                Err(RenderError::InvalidParameter { name: "bars", .. })
                    | Err(RenderError::BufferTooLong { .. })
            ));
        }
    }

    #[test]
    fn scales_start_on_tonic() {
        for scale in [Scale::Minor, Scale::Major, Scale::Dorian, Scale::Locrian] {
            assert_eq!(scale.intervals()[0], 0);
        }
    }
}
