use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::dialogue::{DialogueLine, FeedbackConstruction};
use crate::ids::{CharacterId, InteractionId};

/// The kind of exchange an interaction models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InteractionKind {
    /// A single pick from a list of labeled candidates.
    #[serde(rename = "one-step")]
    OneStep,
    /// An understanding check followed by a detailed response.
    #[serde(rename = "two-step")]
    TwoStep,
    /// Sentence reordering scored against tiered phrase lists.
    #[serde(rename = "reord")]
    Reorder,
    /// A yes/no grid scored by correct-count ranges.
    #[serde(rename = "multichoice")]
    Multichoice,
    /// Scripted lines played back to back.
    #[serde(rename = "dialogue")]
    Dialogue,
    /// A closing exchange with a single presented response.
    #[serde(rename = "end-point")]
    EndPoint,
}

impl InteractionKind {
    /// The authored name of this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OneStep => "one-step",
            Self::TwoStep => "two-step",
            Self::Reorder => "reord",
            Self::Multichoice => "multichoice",
            Self::Dialogue => "dialogue",
            Self::EndPoint => "end-point",
        }
    }
}

impl fmt::Display for InteractionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A labeled attribute of a response candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attribute {
    /// What the response is about.
    Topic,
    /// The communicative function (ask, apologize, ...).
    Function,
    /// Emotional tone.
    Tone,
    /// Register.
    Formality,
}

impl Attribute {
    /// All attributes in scoring order.
    pub const ALL: [Self; 4] = [Self::Topic, Self::Function, Self::Tone, Self::Formality];

    /// The authored field name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Topic => "topic",
            Self::Function => "function",
            Self::Tone => "tone",
            Self::Formality => "formality",
        }
    }
}

/// A named success bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Best outcome.
    High,
    /// Partial outcome.
    Medium,
    /// Weakest accepted outcome.
    Low,
}

impl Tier {
    /// Tiers in matching order.
    pub const ALL: [Self; 3] = [Self::High, Self::Medium, Self::Low];

    /// The lowercase label.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }

    /// Numeric response id recorded for a reorder submission in this tier.
    pub fn response_id(self) -> i64 {
        match self {
            Self::High => 0,
            Self::Medium => 1,
            Self::Low => 2,
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A yes/no value as authored (`"yes"` / `"no"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum YesNo {
    /// Affirmative.
    Yes,
    /// Negative.
    No,
}

impl YesNo {
    /// Convert from a boolean pick.
    pub fn from_bool(value: bool) -> Self {
        if value { Self::Yes } else { Self::No }
    }

    /// Whether this is `Yes`.
    pub fn is_yes(self) -> bool {
        self == Self::Yes
    }
}

/// Audio flag that accepts `true`/`false` as well as `"yes"`/`"no"`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AudioFlag(pub bool);

impl Serialize for AudioFlag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bool(self.0)
    }
}

impl<'de> Deserialize<'de> for AudioFlag {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Bool(bool),
            Text(String),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Bool(b) => Self(b),
            Raw::Text(s) => Self(s.eq_ignore_ascii_case("yes") || s.eq_ignore_ascii_case("true")),
        })
    }
}

/// One string or a list of strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "PhraseRepr")]
pub struct PhraseList(pub Vec<String>);

#[derive(Deserialize)]
#[serde(untagged)]
enum PhraseRepr {
    One(String),
    Many(Vec<String>),
}

impl From<PhraseRepr> for PhraseList {
    fn from(repr: PhraseRepr) -> Self {
        match repr {
            PhraseRepr::One(s) => Self(vec![s]),
            PhraseRepr::Many(v) => Self(v),
        }
    }
}

impl PhraseList {
    /// Whether `value` is one of the listed phrases.
    pub fn contains(&self, value: &str) -> bool {
        self.0.iter().any(|p| p == value)
    }

    /// Iterate over the phrases.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

/// NPC descriptor for an interaction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Npc {
    /// Speaking character.
    #[serde(default)]
    pub character_id: CharacterId,
    /// Display name of the character.
    #[serde(default)]
    pub character_name: String,
    /// Default line when no feedback applies.
    #[serde(default)]
    pub text: String,
    /// Reactions to the learner's previous response.
    #[serde(default)]
    pub feedback: Vec<FeedbackEntry>,
    /// Prompt appended after a feedback reaction.
    #[serde(default)]
    pub new_prompt: Option<Prompt>,
    /// Interaction whose last response selects the feedback (default: the previous id).
    #[serde(default)]
    pub feedback_from: Option<InteractionId>,
}

/// A reaction to one of the previous interaction's responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackEntry {
    /// Response id this reaction answers. Without it the entry's position is used.
    #[serde(default)]
    pub id: Option<i64>,
    /// Reaction text.
    pub text: String,
}

/// Follow-up prompt text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prompt {
    /// Prompt text.
    pub text: String,
}

/// A presented option in a one-step, two-step or end-point interaction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseCandidate {
    /// Numeric response id used by navigation rules and feedback tables.
    #[serde(default)]
    pub id: Option<i64>,
    /// What the learner says.
    pub text: String,
    /// Topic label.
    #[serde(default)]
    pub topic: Option<String>,
    /// Function label.
    #[serde(default)]
    pub function: Option<String>,
    /// Tone label.
    #[serde(default)]
    pub tone: Option<String>,
    /// Formality label.
    #[serde(default)]
    pub formality: Option<String>,
    /// Whether the learner's pick is echoed aloud.
    #[serde(default)]
    pub audio: AudioFlag,
    /// Whether the option button itself plays audio (defaults to `audio`).
    #[serde(default)]
    pub audio_button: Option<AudioFlag>,
}

impl ResponseCandidate {
    /// The value of one attribute label.
    pub fn attribute(&self, attribute: Attribute) -> Option<&str> {
        match attribute {
            Attribute::Topic => self.topic.as_deref(),
            Attribute::Function => self.function.as_deref(),
            Attribute::Tone => self.tone.as_deref(),
            Attribute::Formality => self.formality.as_deref(),
        }
    }

    /// Whether selecting this option plays the learner echo.
    pub fn echoes(&self) -> bool {
        self.audio.0
    }
}

/// One row of a multichoice grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultichoiceOption {
    /// Statement shown to the learner.
    pub text: String,
    /// The correct pick for this row.
    pub expected_response: YesNo,
}

/// A draggable piece of a reorder sentence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReorderSegment {
    /// Segment text.
    pub text: String,
}

/// Header labels for the multichoice yes/no columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnHeaders {
    /// First column.
    pub text_1: String,
    /// Second column.
    pub text_2: String,
}

/// Inclusive correct-count range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountRange {
    /// Lower bound.
    pub min: u32,
    /// Upper bound.
    pub max: u32,
}

impl CountRange {
    /// Whether `count` lies within the range.
    pub fn contains(&self, count: u32) -> bool {
        (self.min..=self.max).contains(&count)
    }
}

/// Multichoice thresholds per tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierRanges {
    /// Range for the high tier.
    pub high: CountRange,
    /// Range for the medium tier.
    pub medium: CountRange,
    /// Range for the low tier.
    pub low: CountRange,
}

impl TierRanges {
    /// Range for one tier.
    pub fn range(&self, tier: Tier) -> CountRange {
        match tier {
            Tier::High => self.high,
            Tier::Medium => self.medium,
            Tier::Low => self.low,
        }
    }
}

/// Reorder phrase lists per tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierPhrases {
    /// Phrases scoring the high tier.
    pub high: PhraseList,
    /// Phrases scoring the medium tier.
    #[serde(default)]
    pub medium: PhraseList,
    /// Phrases scoring the low tier.
    #[serde(default)]
    pub low: PhraseList,
}

impl TierPhrases {
    /// Phrases for one tier.
    pub fn phrases(&self, tier: Tier) -> &PhraseList {
        match tier {
            Tier::High => &self.high,
            Tier::Medium => &self.medium,
            Tier::Low => &self.low,
        }
    }
}

/// Accepted attribute values for a labeled response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttributeExpectations {
    /// Expected topic (equality).
    #[serde(default)]
    pub topic: Option<String>,
    /// Accepted functions.
    #[serde(default)]
    pub function: Option<PhraseList>,
    /// Accepted tones.
    #[serde(default)]
    pub tone: Option<PhraseList>,
    /// Accepted formality levels.
    #[serde(default)]
    pub formality: Option<PhraseList>,
}

impl AttributeExpectations {
    /// Whether `value` satisfies the expectation for `attribute`.
    ///
    /// Returns `None` when the attribute carries no expectation.
    pub fn accepts(&self, attribute: Attribute, value: Option<&str>) -> Option<bool> {
        match attribute {
            Attribute::Topic => self.topic.as_deref().map(|t| value == Some(t)),
            Attribute::Function => self.function.as_ref().map(|l| value.is_some_and(|v| l.contains(v))),
            Attribute::Tone => self.tone.as_ref().map(|l| value.is_some_and(|v| l.contains(v))),
            Attribute::Formality => {
                self.formality.as_ref().map(|l| value.is_some_and(|v| l.contains(v)))
            }
        }
    }

    /// Expected values for `attribute`, if any.
    pub fn values(&self, attribute: Attribute) -> Vec<&str> {
        match attribute {
            Attribute::Topic => self.topic.iter().map(String::as_str).collect(),
            Attribute::Function => self.function.iter().flat_map(|l| l.iter()).collect(),
            Attribute::Tone => self.tone.iter().flat_map(|l| l.iter()).collect(),
            Attribute::Formality => self.formality.iter().flat_map(|l| l.iter()).collect(),
        }
    }
}

/// What a correct response looks like for an interaction.
///
/// The authored shape decides the variant: `{min,max}` tiers for multichoice,
/// tiered phrase lists for reorder, attribute labels otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Expectations {
    /// Multichoice correct-count ranges.
    Ranges(TierRanges),
    /// Reorder phrase lists.
    Phrases(TierPhrases),
    /// Attribute labels.
    Attributes(AttributeExpectations),
}

impl Expectations {
    /// Attribute expectations, if this is that shape.
    pub fn attributes(&self) -> Option<&AttributeExpectations> {
        match self {
            Self::Attributes(a) => Some(a),
            _ => None,
        }
    }

    /// Reorder phrase lists, if this is that shape.
    pub fn phrases(&self) -> Option<&TierPhrases> {
        match self {
            Self::Phrases(p) => Some(p),
            _ => None,
        }
    }

    /// Multichoice ranges, if this is that shape.
    pub fn ranges(&self) -> Option<&TierRanges> {
        match self {
            Self::Ranges(r) => Some(r),
            _ => None,
        }
    }
}

/// Weight per attribute.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AttributeWeights {
    /// Topic weight.
    #[serde(default)]
    pub topic: f64,
    /// Function weight.
    #[serde(default)]
    pub function: f64,
    /// Tone weight.
    #[serde(default)]
    pub tone: f64,
    /// Formality weight.
    #[serde(default)]
    pub formality: f64,
}

impl AttributeWeights {
    /// Weight of one attribute.
    pub fn weight(&self, attribute: Attribute) -> f64 {
        match attribute {
            Attribute::Topic => self.topic,
            Attribute::Function => self.function,
            Attribute::Tone => self.tone,
            Attribute::Formality => self.formality,
        }
    }
}

/// Numeric weights an interaction awards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SuccessWeights {
    /// Weights for single-stage attribute scoring.
    #[serde(flatten)]
    pub attributes: AttributeWeights,
    /// High tier weight.
    #[serde(default)]
    pub high: f64,
    /// Medium tier weight.
    #[serde(default)]
    pub medium: f64,
    /// Low tier weight.
    #[serde(default)]
    pub low: f64,
    /// Two-step understanding stage weights.
    #[serde(default)]
    pub understanding_stage: AttributeWeights,
    /// Two-step response stage weights.
    #[serde(default)]
    pub response_stage: AttributeWeights,
}

impl SuccessWeights {
    /// Weight of one tier.
    pub fn tier(&self, tier: Tier) -> f64 {
        match tier {
            Tier::High => self.high,
            Tier::Medium => self.medium,
            Tier::Low => self.low,
        }
    }
}

/// Ids of earlier interactions whose stored response picks a content set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SelectorSource {
    /// A single interaction.
    One(InteractionId),
    /// Candidates tried in order.
    Many(Vec<InteractionId>),
}

impl SelectorSource {
    /// Candidate ids in priority order.
    pub fn ids(&self) -> &[InteractionId] {
        match self {
            Self::One(id) => std::slice::from_ref(id),
            Self::Many(ids) => ids,
        }
    }
}

/// Reference to the interaction(s) that choose among content sets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentSelection {
    /// Where the selector value is read from.
    pub from_interaction: SelectorSource,
}

/// An alternate bundle of options and expectations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentSet {
    /// Understanding-stage options.
    #[serde(default)]
    pub understanding_check: Option<Vec<ResponseCandidate>>,
    /// Response-stage options.
    #[serde(default)]
    pub detailed_responses: Option<Vec<ResponseCandidate>>,
    /// Multichoice rows.
    #[serde(default)]
    pub multi_choice_option: Option<Vec<MultichoiceOption>>,
    /// Expectations or thresholds.
    #[serde(default)]
    pub expectations: Option<Expectations>,
    /// Multichoice column headers.
    #[serde(default)]
    pub column_headers: Option<ColumnHeaders>,
}

/// One catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    /// Unique id.
    #[serde(rename = "interaction_id")]
    pub id: InteractionId,
    /// Kind of exchange.
    #[serde(rename = "interaction_type")]
    pub kind: InteractionKind,
    /// Speaking NPC.
    #[serde(default)]
    pub npc: Npc,
    /// Two-step understanding options.
    #[serde(default)]
    pub understanding_check: Vec<ResponseCandidate>,
    /// Response options (one-step, two-step second stage, end-point).
    #[serde(default)]
    pub detailed_responses: Vec<ResponseCandidate>,
    /// Default expectations.
    #[serde(default)]
    pub expectations: Option<Expectations>,
    /// Scoring weights.
    #[serde(default)]
    pub success_weights: SuccessWeights,
    /// Content-set selector reference.
    #[serde(default)]
    pub content_selection: Option<ContentSelection>,
    /// Alternate content keyed by selector value.
    #[serde(default)]
    pub content_sets: BTreeMap<String, ContentSet>,
    /// Reorder segments in authored order.
    #[serde(default)]
    pub reord_segments: Vec<ReorderSegment>,
    /// Default multichoice rows.
    #[serde(default)]
    pub multi_choice_option: Vec<MultichoiceOption>,
    /// Default multichoice headers.
    #[serde(default)]
    pub column_headers: Option<ColumnHeaders>,
    /// Dialogue lines in playback order.
    #[serde(default)]
    pub lines: Vec<DialogueLine>,
    /// Synthesized dialogue lines.
    #[serde(default)]
    pub feedback_constructions: Vec<FeedbackConstruction>,
    /// Pre-recorded audio keyed by line number or inclusive range (`"3-5"`).
    #[serde(default)]
    pub recordings: BTreeMap<String, String>,
    /// Authored hint text.
    #[serde(default)]
    pub hint: Option<String>,
}

impl Interaction {
    /// Default attribute expectations, if any.
    pub fn attribute_expectations(&self) -> Option<&AttributeExpectations> {
        self.expectations.as_ref().and_then(Expectations::attributes)
    }

    /// The feedback construction targeting dialogue line `line`, if any.
    pub fn construction_for(&self, line: u32) -> Option<&FeedbackConstruction> {
        self.feedback_constructions.iter().find(|c| c.line == line)
    }

    /// Pre-recorded audio for dialogue line `line`.
    ///
    /// An exact key wins over a range covering the line.
    pub fn recording_for(&self, line: u32) -> Option<&str> {
        if let Some(url) = self.recordings.get(&line.to_string()) {
            return Some(url);
        }
        self.recordings.iter().find_map(|(key, url)| {
            let (lo, hi) = key.split_once('-')?;
            let lo: u32 = lo.trim().parse().ok()?;
            let hi: u32 = hi.trim().parse().ok()?;
            (lo..=hi).contains(&line).then_some(url.as_str())
        })
    }

    /// Number of dialogue lines.
    pub fn line_count(&self) -> u32 {
        u32::try_from(self.lines.len()).unwrap_or(u32::MAX)
    }
}
