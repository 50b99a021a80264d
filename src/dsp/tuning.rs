//! Tuning reference, note-name parsing and the note → frequency table.
//!
//! The A4 reference is an explicit value threaded into every conversion;
//! nothing here holds process-wide state.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{RenderError, Result};

/// Standard concert pitch for A4.
pub const CONCERT_A4: f64 = 440.0;

/// The A4 frequency that equal-tempered conversions are anchored to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TuningReference {
    pub a4_hz: f64,
}

impl Default for TuningReference {
    fn default() -> Self {
        TuningReference { a4_hz: CONCERT_A4 }
    }
}

impl TuningReference {
    pub fn new(a4_hz: f64) -> Result<Self> {
        if !a4_hz.is_finite() || a4_hz <= 0.0 {
            return Err(RenderError::InvalidFrequency(a4_hz));
        }
        Ok(TuningReference { a4_hz })
    }

    /// `a4 * 2^((midi - 69) / 12)`.
    pub fn midi_to_frequency(&self, midi: i32) -> f64 {
        self.a4_hz * (2.0_f64).powf((midi as f64 - 69.0) / 12.0)
    }

    /// Nearest (fractional) MIDI note number for `freq`.
    pub fn frequency_to_midi(&self, freq: f64) -> f64 {
        69.0 + 12.0 * (freq / self.a4_hz).log2()
    }

    pub fn note_to_frequency(&self, note: &str) -> Option<f64> {
        note_to_midi(note).map(|m| self.midi_to_frequency(m))
    }
}

/// Parse a note name (e.g. "C4", "F#3", "Bb5") into a MIDI note number.
///
/// C4 = 60. Returns `None` for malformed names or results outside 0–127.
pub fn note_to_midi(note: &str) -> Option<i32> {
    let note = note.trim();
    let mut chars = note.chars();
    let semitone = match chars.next()?.to_ascii_uppercase() {
        'C' => 0,
        'D' => 2,
        'E' => 4,
        'F' => 5,
        'G' => 7,
        'A' => 9,
        'B' => 11,
        _ => return None,
    };

    let rest = chars.as_str();
    let (semitone, octave_str) = if let Some(r) = rest.strip_prefix('#') {
        (semitone + 1, r)
    } else if let Some(r) = rest.strip_prefix('b') {
        (semitone - 1, r)
    } else {
        (semitone, rest)
    };

    let octave: i32 = octave_str.parse().ok()?;
    let midi = (octave + 1) * 12 + semitone;
    (0..=127).contains(&midi).then_some(midi)
}

const SHARP_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];
const FLAT_NAMES: [&str; 12] = [
    "C", "Db", "D", "Eb", "E", "F", "Gb", "G", "Ab", "A", "Bb", "B",
];

/// Note name → Hz for every MIDI note, built once per tuning reference.
///
/// Each pitch is reachable under both its sharp and flat spelling.
#[derive(Debug, Clone)]
pub struct FrequencyTable {
    tuning: TuningReference,
    table: HashMap<String, f64>,
}

impl FrequencyTable {
    pub fn new(tuning: TuningReference) -> Self {
        let mut table = HashMap::with_capacity(128 * 2);
        for midi in 0..=127 {
            let freq = tuning.midi_to_frequency(midi);
            let octave = midi / 12 - 1;
            let pc = (midi % 12) as usize;
            table.insert(format!("{}{octave}", SHARP_NAMES[pc]), freq);
            table.insert(format!("{}{octave}", FLAT_NAMES[pc]), freq);
        }
        FrequencyTable { tuning, table }
    }

    pub fn tuning(&self) -> TuningReference {
        self.tuning
    }

    /// Frequency for `note`. Canonical spellings hit the table; anything else
    /// [`note_to_midi`] accepts (`c4`, `E#4`, `Cb4`) is converted directly.
    pub fn get(&self, note: &str) -> Option<f64> {
        let note = note.trim();
        self.table
            .get(note)
            .copied()
            .or_else(|| self.tuning.note_to_frequency(note))
    }

    pub fn contains(&self, note: &str) -> bool {
        self.get(note).is_some()
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl Default for FrequencyTable {
    fn default() -> Self {
        FrequencyTable::new(TuningReference::default())
    }
}
