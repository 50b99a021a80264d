//! DSP core: pure Rust offline synthesis.
//!
//! Every renderer is a pure function of its inputs: a frequency, a duration,
//! a parameter record and a sample rate in, a finished buffer out.

pub mod buffer;
pub mod envelope;
pub mod lfo;
pub mod mixer;
pub mod oscillator;
pub mod renderer;
pub mod tuning;
