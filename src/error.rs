use thiserror::Error;

/// Errors surfaced by the rendering core.
///
/// Soft failures (unknown oscillator kind, unknown note name in a pattern,
/// zero-length envelope segments) never reach this type; they fall back to
/// a documented default instead.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("frequency must be finite and > 0 Hz, got {0}")]
    InvalidFrequency(f64),

    #[error("duration must be finite and >= 0 s, got {0}")]
    InvalidDuration(f64),

    #[error("sample rate must be > 0")]
    InvalidSampleRate,

    #[error("requested {frames} frames, ceiling is {max}")]
    BufferTooLong { frames: usize, max: usize },

    #[error("parameter `{name}` out of range: {value}")]
    InvalidParameter { name: &'static str, value: f64 },

    #[error("track '{track}' renders {found} samples, expected {expected}")]
    TrackLengthMismatch {
        track: String,
        expected: usize,
        found: usize,
    },

    #[error("unknown brainwave mode '{0}'")]
    UnknownBrainwaveMode(String),

    #[error("brainwave segment is missing its `mode` tag")]
    MissingBrainwaveMode,

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RenderError>;

/// Reject values outside `range` (or NaN) with [`RenderError::InvalidParameter`].
pub(crate) fn check_range(
    name: &'static str,
    value: f64,
    range: std::ops::RangeInclusive<f64>,
) -> Result<()> {
    if range.contains(&value) {
        Ok(())
    } else {
        Err(RenderError::InvalidParameter { name, value })
    }
}
