use std::f64::consts::TAU;

use cymatics_core::brainwave::{Timeline, binaural_beats};
use cymatics_core::dsp::envelope::Envelope;
use cymatics_core::dsp::tuning::{FrequencyTable, TuningReference};
use cymatics_core::params::{EnvelopeMode, LfoMode, OscillatorKind};
use cymatics_core::sequencer::{PatternMap, render_track, render_tracks};
use cymatics_core::{
    Pattern, RenderError, SynthParams, TimingConfig, TrackParams, render_chord, render_note,
};

const SR: u32 = 44100;

/// Magnitude of a single DFT bin at `freq` Hz.
fn bin_magnitude(samples: &[f64], freq: f64, sample_rate: u32) -> f64 {
    let (mut re, mut im) = (0.0, 0.0);
    for (i, &s) in samples.iter().enumerate() {
        let w = TAU * freq * i as f64 / sample_rate as f64;
        re += s * w.cos();
        im -= s * w.sin();
    }
    (re * re + im * im).sqrt()
}

/// Frequency in `candidates` with the strongest DFT bin.
fn strongest(samples: &[f64], candidates: &[f64], sample_rate: u32) -> f64 {
    candidates
        .iter()
        .copied()
        .max_by(|a, b| {
            bin_magnitude(samples, *a, sample_rate).total_cmp(&bin_magnitude(samples, *b, sample_rate))
        })
        .unwrap()
}

fn all_kinds() -> [OscillatorKind; 9] {
    [
        OscillatorKind::Sine,
        OscillatorKind::Square,
        OscillatorKind::Saw,
        OscillatorKind::Triangle,
        OscillatorKind::Supersaw,
        OscillatorKind::Noise,
        OscillatorKind::Fm,
        OscillatorKind::Am,
        OscillatorKind::Additive,
    ]
}

#[test]
fn note_length_and_bounds_for_every_kind_and_mode() {
    for kind in all_kinds() {
        for lfo_mode in [LfoMode::None, LfoMode::Vibrato, LfoMode::Tremolo, LfoMode::Filter] {
            let params = SynthParams {
                oscillator_kind: kind,
                lfo_mode,
                lfo_depth: 0.3,
                ..SynthParams::default()
            };
            let buf = render_note(523.25, 0.37, &params, SR).unwrap();
            assert_eq!(buf.samples.len(), (0.37 * SR as f64).round() as usize);
            assert!(
                buf.peak() <= 1.0 + 1e-9,
                "{kind:?}/{lfo_mode:?} peak {}",
                buf.peak()
            );
        }
    }
}

#[test]
fn envelope_endpoints() {
    let linear = Envelope {
        attack: 0.05,
        decay: 0.1,
        sustain: 0.6,
        release: 0.2,
        mode: EnvelopeMode::Linear,
    };
    let env = linear.render(SR as usize, SR);
    let attack_end = (0.05 * SR as f64).round() as usize - 1;
    assert!((env[attack_end] - 1.0).abs() < 1e-9);
    assert!(env.last().unwrap().abs() < 1e-9);

    let held = Envelope {
        mode: EnvelopeMode::NoRelease,
        ..linear
    };
    let env = held.render(SR as usize, SR);
    assert!((env.last().unwrap() - 0.6).abs() < 1e-9);
}

#[test]
fn renders_are_repeatable_without_noise() {
    for kind in all_kinds().into_iter().filter(|k| *k != OscillatorKind::Noise) {
        let params = SynthParams {
            oscillator_kind: kind,
            lfo_mode: LfoMode::Tremolo,
            lfo_depth: 0.5,
            ..SynthParams::default()
        };
        let a = render_chord(&[220.0, 277.18, 329.63], 0.2, &params, SR).unwrap();
        let b = render_chord(&[220.0, 277.18, 329.63], 0.2, &params, SR).unwrap();
        assert_eq!(a, b, "{kind:?} should be deterministic");
    }
}

#[test]
fn single_note_chord_matches_note() {
    let params = SynthParams {
        oscillator_kind: OscillatorKind::Supersaw,
        ..SynthParams::default()
    };
    let chord = render_chord(&[110.0], 0.4, &params, SR).unwrap();
    let note = render_note(110.0, 0.4, &params, SR).unwrap();
    assert_eq!(chord.samples, note.samples);
}

#[test]
fn sixteen_step_pattern_length() {
    let pattern = Pattern::parse("C4 C4 E4 G4 C4 C4 E4 G4 C4 C4 E4 G4 C4 C4 E4 G4");
    let buf = render_track(
        &pattern,
        &FrequencyTable::default(),
        &TimingConfig::default(),
        &SynthParams::default(),
        SR,
    )
    .unwrap();
    let expected = 16.0 * 0.125 * SR as f64;
    assert!((buf.samples.len() as f64 - expected).abs() <= 1.0);
}

#[test]
fn swing_lengthens_odd_steps_by_thirty_percent() {
    let timing = TimingConfig {
        bpm: 60.0,
        swing: 0.3,
        ..TimingConfig::default()
    };
    let bounds = timing.step_boundaries(4, SR);
    let even = (bounds[1] - bounds[0]) as f64;
    let odd = (bounds[2] - bounds[1]) as f64;
    assert!((odd / even - 1.3).abs() < 1e-3, "odd/even = {}", odd / even);

    // Silent patterns expose the step layout directly.
    let buf = render_track(
        &Pattern::parse("- -"),
        &FrequencyTable::default(),
        &timing,
        &SynthParams::default(),
        SR,
    )
    .unwrap();
    assert_eq!(buf.samples.len(), bounds[2]);
}

#[test]
fn gate_half_on_one_second_step() {
    let timing = TimingConfig {
        bpm: 60.0,
        subdivision: cymatics_core::sequencer::Subdivision::Quarter,
        gate: 0.5,
        swing: 0.0,
    };
    let buf = render_track(
        &Pattern::parse("A3"),
        &FrequencyTable::default(),
        &timing,
        &SynthParams::default(),
        SR,
    )
    .unwrap();
    assert_eq!(buf.samples.len(), 44100);
    let last_sound = buf.samples.iter().rposition(|&s| s != 0.0).unwrap();
    assert!(last_sound < 22050, "audio leaked into the gate tail at {last_sound}");
    assert!(last_sound > 22050 - 200, "note ended early at {last_sound}");
}

#[test]
fn binaural_spectral_peaks() {
    let buf = binaural_beats(200.0, 6.0, 1.0, 0.8, SR).unwrap();
    let candidates: Vec<f64> = (190..=216).map(|f| f as f64).collect();
    let left = strongest(&buf.channel(0), &candidates, SR);
    let right = strongest(&buf.channel(1), &candidates, SR);
    assert_eq!(left, 200.0);
    assert_eq!(right, 206.0);
}

#[test]
fn multitrack_mix_with_tuning() {
    let table = FrequencyTable::new(TuningReference::new(432.0).unwrap());
    let mut patterns = PatternMap::new();
    patterns.insert("chords".into(), Pattern::parse("C4+E4+G4 - A3+C4+E4 -"));
    patterns.insert("bass".into(), Pattern::parse("C2 C2 A1 A1"));
    let mut params = TrackParams::new();
    params.insert(
        "bass",
        SynthParams {
            oscillator_kind: OscillatorKind::Saw,
            ..SynthParams::default()
        },
    );
    let timing = TimingConfig {
        gate: 0.75,
        swing: 0.1,
        ..TimingConfig::default()
    };
    let mix = render_tracks(&patterns, &table, &timing, &params, SR).unwrap();
    assert!(mix.peak() <= 1.0 && mix.peak() > 0.99);

    patterns.insert("short".into(), Pattern::parse("C4"));
    assert!(matches!(
        render_tracks(&patterns, &table, &timing, &params, SR),
        Err(RenderError::TrackLengthMismatch { .. })
    ));
}

#[test]
fn timeline_strictness() {
    let ok = Timeline::from_json(
        r#"[{"mode": "hybrid", "carrier": 220, "beat": 18, "duration": 0.1},
            {"mode": "fixed_tone", "frequency": 396, "duration": 0.1}]"#,
    )
    .unwrap()
    .render(SR)
    .unwrap();
    assert_eq!(ok.frames(), 8820);
    assert!(ok.peak() <= 1.0);

    assert!(matches!(
        Timeline::from_json(r#"[{"mode": "chakra", "duration": 1}]"#),
        Err(RenderError::UnknownBrainwaveMode(_))
    ));
}
