//! Canonical step types shared by every pipeline stage.
//!
//! Only the normalizer ever sees [`RawStep`]; everything downstream works
//! with fully-populated [`Step`]s.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Rationale used when the source did not provide one.
pub const DEFAULT_WHY: &str = "Reduces friction to zero.";

// ─── Step ────────────────────────────────────────────────────────────────────

/// Qualitative estimate of the mental effort a step needs. Never numeric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CognitiveLoad {
    VeryLight,
    #[default]
    Light,
    Moderate,
}

impl CognitiveLoad {
    /// The label the model is asked to emit.
    pub fn label(self) -> &'static str {
        match self {
            CognitiveLoad::VeryLight => "Very Light",
            CognitiveLoad::Light => "Light",
            CognitiveLoad::Moderate => "Moderate",
        }
    }

    /// Parse a model-provided label.
    ///
    /// Case, spaces, hyphens and underscores are ignored, so `"Very Light"`,
    /// `"very_light"` and `"VeryLight"` all map to the same tag.
    pub fn parse(raw: &str) -> Option<Self> {
        let folded: String = raw
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
            .flat_map(char::to_lowercase)
            .collect();
        match folded.as_str() {
            "verylight" => Some(CognitiveLoad::VeryLight),
            "light" => Some(CognitiveLoad::Light),
            "moderate" => Some(CognitiveLoad::Moderate),
            _ => None,
        }
    }

    /// Parse with the `Light` default for absent or unknown labels.
    pub fn parse_or_default(raw: Option<&str>) -> Self {
        raw.and_then(Self::parse).unwrap_or_default()
    }
}

impl fmt::Display for CognitiveLoad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for CognitiveLoad {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for CognitiveLoad {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw).unwrap_or_default())
    }
}

/// A single physically executable micro-action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub action: String,
    pub why: String,
    pub load: CognitiveLoad,
}

impl Step {
    /// Wrap a bare instruction with the default rationale and load.
    pub fn from_action(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            why: DEFAULT_WHY.to_string(),
            load: CognitiveLoad::Light,
        }
    }
}

// ─── StepSequence ────────────────────────────────────────────────────────────

/// Ordered list of steps. Serialized as a plain JSON array.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StepSequence(Vec<Step>);

impl StepSequence {
    pub fn new(steps: Vec<Step>) -> Self {
        Self(steps)
    }

    /// Build a sequence of default-annotated steps from plain instructions.
    pub fn from_actions<I, S>(actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(actions.into_iter().map(Step::from_action).collect())
    }

    pub fn steps(&self) -> &[Step] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The action text of every step, in order.
    pub fn actions(&self) -> Vec<&str> {
        self.0.iter().map(|s| s.action.as_str()).collect()
    }

    pub fn truncate(&mut self, len: usize) {
        self.0.truncate(len);
    }

    pub fn into_inner(self) -> Vec<Step> {
        self.0
    }
}

impl From<Vec<Step>> for StepSequence {
    fn from(steps: Vec<Step>) -> Self {
        Self(steps)
    }
}

impl IntoIterator for StepSequence {
    type Item = Step;
    type IntoIter = std::vec::IntoIter<Step>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a StepSequence {
    type Item = &'a Step;
    type IntoIter = std::slice::Iter<'a, Step>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

// ─── Boundary shapes ─────────────────────────────────────────────────────────

/// A step as it may arrive from the model or from an older cache entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawStep {
    /// Legacy shape: a bare instruction string.
    Text(String),
    /// Current shape, possibly missing fields.
    Record(PartialStep),
}

/// Structured step with every field optional.
///
/// `why` and `load` stay untyped so a number or object in either slot
/// degrades to the default instead of losing the whole step.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PartialStep {
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub why: Option<serde_json::Value>,
    #[serde(default)]
    pub load: Option<serde_json::Value>,
}

// ─── Preferences ─────────────────────────────────────────────────────────────

/// Voice the user asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Quiet,
    Gentle,
}

impl Tone {
    pub fn as_str(self) -> &'static str {
        match self {
            Tone::Quiet => "quiet",
            Tone::Gentle => "gentle",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextLength {
    Short,
    #[default]
    Normal,
}

/// User preferences that shape the prompt.
///
/// Owned by the UI; the core only reads them. Unknown fields written by the
/// UI (font size, audio, contrast) are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    #[serde(default)]
    pub tone: Option<Tone>,
    #[serde(default)]
    pub text_length: TextLength,
    #[serde(default)]
    pub support_needs: String,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            tone: Some(Tone::Quiet),
            text_length: TextLength::Normal,
            support_needs: String::new(),
        }
    }
}

impl Preferences {
    /// Tone name used in prompts and cache keys; `"calm"` when unset.
    pub fn tone_label(&self) -> &'static str {
        self.tone.map(Tone::as_str).unwrap_or("calm")
    }

    pub fn with_tone(mut self, tone: Tone) -> Self {
        self.tone = Some(tone);
        self
    }
}

// ─── Decisions ───────────────────────────────────────────────────────────────

/// Outcome of decision mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionResult {
    /// Literal text of the chosen option.
    pub answer: String,
    pub reason: String,
    pub steps: StepSequence,
}

// ─── Tests ───────────────────────────────────────────────────────────────────
