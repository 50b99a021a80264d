//! Renders one note or a stacked chord to a normalized mono buffer.
//!
//! Pipeline per note: oscillator (with vibrato phase when active) → tremolo
//! or filter LFO → envelope → volume → peak normalization.

use log::debug;

use crate::error::{RenderError, Result};
use crate::params::{LfoMode, SynthParams};

use super::buffer::{SampleBuffer, check_sample_rate, peak_normalize, sample_count, time_vector};
use super::envelope::Envelope;
use super::lfo::Lfo;
use super::oscillator::Oscillator;

/// Reject frequencies that are not finite and positive.
pub fn check_frequency(frequency: f64) -> Result<()> {
    if !frequency.is_finite() || frequency <= 0.0 {
        return Err(RenderError::InvalidFrequency(frequency));
    }
    Ok(())
}

/// Render `n` samples of one note before normalization.
fn render_samples(frequency: f64, n: usize, params: &SynthParams, sample_rate: u32) -> Vec<f64> {
    let times = time_vector(n, sample_rate);
    let mut osc = Oscillator::from_params(params);
    let lfo = params.lfo_active().then(|| Lfo::from_params(params));

    let mut signal = match (&lfo, params.lfo_mode) {
        (Some(lfo), LfoMode::Vibrato) => {
            let phases = lfo.vibrato_phases(frequency, &times, sample_rate);
            osc.render_phases(&phases, &times)
        }
        _ => osc.render(frequency, &times),
    };

    if let Some(lfo) = &lfo {
        lfo.apply(params.lfo_mode, &mut signal, &times);
    }

    let env = Envelope::from_params(params).render(n, sample_rate);
    for (s, e) in signal.iter_mut().zip(&env) {
        *s *= e * params.volume;
    }
    signal
}

/// Render a single note of `duration` seconds.
///
/// The result holds `round(duration * sample_rate)` samples with peak ≤ 1.
pub fn render_note(
    frequency: f64,
    duration: f64,
    params: &SynthParams,
    sample_rate: u32,
) -> Result<SampleBuffer> {
    check_frequency(frequency)?;
    params.validate()?;
    let n = sample_count(duration, sample_rate)?;
    debug!(
        "render_note: {frequency:.2} Hz, {n} samples, {}",
        params.oscillator_kind.as_str()
    );

    let mut samples = render_samples(frequency, n, params, sample_rate);
    peak_normalize(&mut samples);
    Ok(SampleBuffer::mono(samples, sample_rate))
}

/// Render every frequency with the same parameters, sum and normalize.
///
/// A one-note chord is exactly [`render_note`]; an empty chord is silence.
/// With a noise seed set, each chord member gets `seed + index` so the
/// voices decorrelate.
pub fn render_chord(
    frequencies: &[f64],
    duration: f64,
    params: &SynthParams,
    sample_rate: u32,
) -> Result<SampleBuffer> {
    if let [frequency] = frequencies {
        return render_note(*frequency, duration, params, sample_rate);
    }

    check_sample_rate(sample_rate)?;
    let n = sample_count(duration, sample_rate)?;
    debug!("render_chord: {} notes, {n} samples", frequencies.len());

    let mut mix = vec![0.0; n];
    for (i, &frequency) in frequencies.iter().enumerate() {
        let voice_params = match params.noise_seed {
            Some(seed) => SynthParams {
                noise_seed: Some(seed.wrapping_add(i as u64)),
                ..params.clone()
            },
            None => params.clone(),
        };
        let note = render_note(frequency, duration, &voice_params, sample_rate)?;
        for (m, s) in mix.iter_mut().zip(&note.samples) {
            *m += s;
        }
    }

    peak_normalize(&mut mix);
    Ok(SampleBuffer::mono(mix, sample_rate))
}
