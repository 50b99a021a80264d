//! Patterns, steps and sequencer timing.

use serde::{Deserialize, Serialize};

use crate::error::{Result, check_range};

// ── Steps ───────────────────────────────────────────────────

/// One sequencer step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawStep", into = "RawStep")]
pub enum Step {
    Silence,
    Note(String),
    Chord(Vec<String>),
}

/// JSON shape of a step: `null`, `"C4"` or `["C4", "E4"]`.
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawStep {
    Name(String),
    Names(Vec<String>),
    Rest(()),
}

impl From<RawStep> for Step {
    fn from(raw: RawStep) -> Self {
        match raw {
            RawStep::Name(name) => Step::parse(&name),
            RawStep::Names(names) => Step::chord(names),
            RawStep::Rest(()) => Step::Silence,
        }
    }
}

impl From<Step> for RawStep {
    fn from(step: Step) -> Self {
        match step {
            Step::Silence => RawStep::Rest(()),
            Step::Note(name) => RawStep::Name(name),
            Step::Chord(names) => RawStep::Names(names),
        }
    }
}

fn is_rest_token(token: &str) -> bool {
    matches!(token, "" | "-" | "." | "~")
}

impl Step {
    /// Build a step from a list of note names. Duplicates and rest tokens are
    /// dropped; zero names is silence, one name is a single note.
    pub fn chord<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut unique: Vec<String> = Vec::new();
        for name in names {
            let name = name.as_ref().trim();
            if !is_rest_token(name) && !unique.iter().any(|n| n == name) {
                unique.push(name.to_string());
            }
        }
        match unique.len() {
            0 => Step::Silence,
            1 => Step::Note(unique.remove(0)),
            _ => Step::Chord(unique),
        }
    }

    /// Parse a single token: a rest (`-`, `.`, `~` or empty), a note
    /// (`C4`) or a `+`-joined chord (`C4+E4+G4`).
    pub fn parse(token: &str) -> Self {
        let token = token.trim();
        if token.contains('+') {
            Step::chord(token.split('+'))
        } else if is_rest_token(token) {
            Step::Silence
        } else {
            Step::Note(token.to_string())
        }
    }

    pub fn is_silence(&self) -> bool {
        matches!(self, Step::Silence)
    }

    /// Note names referenced by this step.
    pub fn note_names(&self) -> &[String] {
        match self {
            Step::Silence => &[],
            Step::Note(name) => std::slice::from_ref(name),
            Step::Chord(names) => names,
        }
    }
}

/// An ordered run of steps for one track.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Pattern {
    pub steps: Vec<Step>,
}

impl Pattern {
    pub fn new(steps: Vec<Step>) -> Self {
        Pattern { steps }
    }

    /// Parse whitespace-separated step tokens, e.g. `"C4 - E4 C4+E4+G4"`.
    pub fn parse(text: &str) -> Self {
        Pattern {
            steps: text.split_whitespace().map(Step::parse).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Step> {
        self.steps.iter()
    }
}

impl From<Vec<Step>> for Pattern {
    fn from(steps: Vec<Step>) -> Self {
        Pattern { steps }
    }
}

// ── Timing ──────────────────────────────────────────────────

/// Rhythmic grid, as notes per whole note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum Subdivision {
    Quarter,
    Eighth,
    #[default]
    Sixteenth,
    ThirtySecond,
}

impl Subdivision {
    pub fn divisor(self) -> u32 {
        match self {
            Subdivision::Quarter => 4,
            Subdivision::Eighth => 8,
            Subdivision::Sixteenth => 16,
            Subdivision::ThirtySecond => 32,
        }
    }
}

impl TryFrom<u32> for Subdivision {
    type Error = String;

    fn try_from(value: u32) -> std::result::Result<Self, Self::Error> {
        match value {
            4 => Ok(Subdivision::Quarter),
            8 => Ok(Subdivision::Eighth),
            16 => Ok(Subdivision::Sixteenth),
            32 => Ok(Subdivision::ThirtySecond),
            other => Err(format!(
                "unsupported subdivision {other}, expected 4, 8, 16 or 32"
            )),
        }
    }
}

impl From<Subdivision> for u32 {
    fn from(s: Subdivision) -> Self {
        s.divisor()
    }
}

/// Tempo, grid, gate and swing for a sequence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub bpm: f64,
    pub subdivision: Subdivision,
    /// Sounding fraction of each step, (0, 1].
    pub gate: f64,
    /// Lengthening of every second step, [-0.5, 0.5].
    pub swing: f64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        TimingConfig {
            bpm: 120.0,
            subdivision: Subdivision::Sixteenth,
            gate: 1.0,
            swing: 0.0,
        }
    }
}

impl TimingConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let timing: TimingConfig = serde_json::from_str(json)?;
        timing.validate()?;
        Ok(timing)
    }

    pub fn validate(&self) -> Result<()> {
        check_range("bpm", self.bpm, f64::MIN_POSITIVE..=f64::MAX)?;
        check_range("gate", self.gate, f64::MIN_POSITIVE..=1.0)?;
        check_range("swing", self.swing, -0.5..=0.5)?;
        Ok(())
    }

    /// Nominal step length: `(60 / bpm) * (4 / subdivision)`.
    pub fn step_seconds(&self) -> f64 {
        (60.0 / self.bpm) * (4.0 / self.subdivision.divisor() as f64)
    }

    /// Length of step `index` (0-based) with swing applied to every second step.
    pub fn step_duration(&self, index: usize) -> f64 {
        if index % 2 == 1 {
            self.step_seconds() * (1.0 + self.swing)
        } else {
            self.step_seconds()
        }
    }

    /// Sample offsets of every step boundary, `steps + 1` entries.
    ///
    /// Boundaries are rounded from cumulative time so the total never drifts
    /// by more than one sample, whatever the per-step rounding.
    pub fn step_boundaries(&self, steps: usize, sample_rate: u32) -> Vec<usize> {
        let sr = sample_rate as f64;
        let mut elapsed = 0.0;
        let mut bounds = Vec::with_capacity(steps + 1);
        bounds.push(0);
        for i in 0..steps {
            elapsed += self.step_duration(i);
            bounds.push((elapsed * sr).round() as usize);
        }
        bounds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_tokens() {
        assert_eq!(Step::parse("-"), Step::Silence);
        assert_eq!(Step::parse("."), Step::Silence);
        assert_eq!(Step::parse("C4"), Step::Note("C4".into()));
        assert_eq!(
            Step::parse("C4+E4+G4"),
            Step::Chord(vec!["C4".into(), "E4".into(), "G4".into()])
        );
        assert_eq!(Step::parse("C4+"), Step::Note("C4".into()));
    }

    #[test]
    fn chord_collapses() {
        assert_eq!(Step::chord(Vec::<String>::new()), Step::Silence);
        assert_eq!(Step::chord(["A4", "A4"]), Step::Note("A4".into()));
        assert_eq!(Step::chord(["A4", "C5"]).note_names().len(), 2);
    }

    #[test]
    fn pattern_parse() {
        let p = Pattern::parse("C4 - E4  C4+E4+G4");
        assert_eq!(p.len(), 4);
        assert!(p.steps[1].is_silence());
        assert_eq!(p.steps[3].note_names().len(), 3);
    }

    #[test]
    fn pattern_json_shapes() {
        let p: Pattern =
            serde_json::from_str(r#"["C4", null, ["E4", "G4"], "", [], ["A4"]]"#).unwrap();
        assert_eq!(
            p.steps,
            vec![
                Step::Note("C4".into()),
                Step::Silence,
                Step::Chord(vec!["E4".into(), "G4".into()]),
                Step::Silence,
                Step::Silence,
                Step::Note("A4".into()),
            ]
        );
        let back = serde_json::to_string(&p).unwrap();
        assert_eq!(back, r#"["C4",null,["E4","G4"],null,null,"A4"]"#);
    }

    #[test]
    fn step_seconds_sixteenths_at_120() {
        let t = TimingConfig::default();
        assert!((t.step_seconds() - 0.125).abs() < 1e-12);
        let q = TimingConfig {
            subdivision: Subdivision::Quarter,
            bpm: 60.0,
            ..t
        };
        assert!((q.step_seconds() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn boundaries_do_not_drift() {
        // 0.125 s * 44100 = 5512.5 samples per step
        let bounds = TimingConfig::default().step_boundaries(16, 44100);
        assert_eq!(bounds.len(), 17);
        assert_eq!(*bounds.last().unwrap(), 88200);
    }

    #[test]
    fn swing_lengthens_odd_steps() {
        let t = TimingConfig {
            swing: 0.3,
            ..TimingConfig::default()
        };
        assert!((t.step_duration(1) / t.step_duration(0) - 1.3).abs() < 1e-12);
        assert_eq!(t.step_duration(2), t.step_duration(0));
    }

    #[test]
    fn timing_validation() {
        assert!(TimingConfig::from_json(r#"{"gate": 0.0}"#).is_err());
        assert!(TimingConfig::from_json(r#"{"swing": 0.6}"#).is_err());
        assert!(TimingConfig::from_json(r#"{"bpm": -10}"#).is_err());
        assert!(TimingConfig::from_json(r#"{"subdivision": 12}"#).is_err());
        let t = TimingConfig::from_json(r#"{"bpm": 90, "subdivision": 8, "gate": 0.5}"#).unwrap();
        assert_eq!(t.subdivision, Subdivision::Eighth);
        assert_eq!(t.swing, 0.0);
    }
}
