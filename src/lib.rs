pub mod brainwave;
pub mod dsp;
pub mod error;
pub mod generative;
pub mod params;
pub mod sequencer;

use wasm_bindgen::prelude::*;

pub use crate::dsp::buffer::{DEFAULT_SAMPLE_RATE, SampleBuffer};
pub use crate::dsp::renderer::{render_chord, render_note};
pub use crate::error::{RenderError, Result};
pub use crate::params::{SynthParams, TrackParams};
pub use crate::sequencer::{Pattern, Sequence, Step, TimingConfig};

/// The crate version, read from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// WASM-exposed: return the cymatics-core version string.
#[wasm_bindgen]
pub fn core_version() -> String {
    VERSION.to_string()
}

fn to_js(e: RenderError) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Decode a parameter record; an empty string means all defaults.
pub fn params_from_json(json: &str) -> Result<SynthParams> {
    if json.trim().is_empty() {
        return Ok(SynthParams::default());
    }
    SynthParams::from_json(json)
}

/// WASM-exposed: render one note to mono f32 samples.
#[wasm_bindgen]
pub fn render_note_samples(
    frequency: f64,
    duration: f64,
    params_json: &str,
    sample_rate: u32,
) -> std::result::Result<Vec<f32>, JsValue> {
    let params = params_from_json(params_json).map_err(to_js)?;
    let buffer = render_note(frequency, duration, &params, sample_rate).map_err(to_js)?;
    Ok(buffer.to_f32())
}

/// WASM-exposed: render a stacked chord to mono f32 samples.
#[wasm_bindgen]
pub fn render_chord_samples(
    frequencies: Vec<f64>,
    duration: f64,
    params_json: &str,
    sample_rate: u32,
) -> std::result::Result<Vec<f32>, JsValue> {
    let params = params_from_json(params_json).map_err(to_js)?;
    let buffer = render_chord(&frequencies, duration, &params, sample_rate).map_err(to_js)?;
    Ok(buffer.to_f32())
}

/// WASM-exposed: render a multi-track sequence (see [`Sequence`]) to mono f32 samples.
#[wasm_bindgen]
pub fn render_sequence_samples(
    sequence_json: &str,
    sample_rate: u32,
) -> std::result::Result<Vec<f32>, JsValue> {
    let sequence = Sequence::from_json(sequence_json).map_err(to_js)?;
    let buffer = sequence.render(sample_rate).map_err(to_js)?;
    Ok(buffer.to_f32())
}

/// WASM-exposed: render a brainwave timeline.
/// Returns `{ samples, sampleRate, channels }` with interleaved stereo samples.
#[wasm_bindgen]
pub fn render_brainwave_timeline(
    timeline_json: &str,
    sample_rate: u32,
) -> std::result::Result<JsValue, JsValue> {
    let timeline = brainwave::Timeline::from_json(timeline_json).map_err(to_js)?;
    let buffer = timeline.render(sample_rate).map_err(to_js)?;
    serde_wasm_bindgen::to_value(&buffer).map_err(|e| JsValue::from_str(&format!("{e}")))
}

/// WASM-exposed: render a generated melody (see [`generative::MelodyConfig`]).
#[wasm_bindgen]
pub fn generate_melody_samples(
    config_json: &str,
    sample_rate: u32,
) -> std::result::Result<Vec<f32>, JsValue> {
    let config: generative::MelodyConfig = serde_json::from_str(config_json)
        .map_err(|e| to_js(RenderError::from(e)))?;
    let buffer = generative::generate_melody(&config, sample_rate).map_err(to_js)?;
    Ok(buffer.to_f32())
}
