use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ids::InteractionId;
use crate::interaction::Tier;

/// What a rule matches the completed interaction's outcome against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKey {
    /// The chosen response id.
    ResponseId(i64),
    /// The exact success score (reorder).
    SuccessScore(f64),
    /// The success tier (multichoice).
    SuccessLevel(Tier),
    /// Any outcome (dialogue completion).
    #[default]
    Any,
}

impl fmt::Display for MatchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ResponseId(id) => write!(f, "response {id}"),
            Self::SuccessScore(s) => write!(f, "score {s}"),
            Self::SuccessLevel(t) => write!(f, "level {t}"),
            Self::Any => f.write_str("any"),
        }
    }
}

/// A declarative endpoint-navigation rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavigationRule {
    /// Interaction the rule belongs to.
    pub interaction_id: InteractionId,
    /// Outcome to match.
    #[serde(default)]
    pub when: MatchKey,
    /// Endpoint flag written when the rule fires. Absent means "no jump".
    #[serde(default)]
    pub endpoint: Option<bool>,
    /// Index into the rule set's slot pool.
    #[serde(default)]
    pub slot: Option<usize>,
    /// Literal written to the slot.
    #[serde(default)]
    pub value: Option<i64>,
    /// Free-form note for authors.
    #[serde(default)]
    pub description: Option<String>,
}

/// Rule group, in matching priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleKind {
    /// Consequence rules (checked before choice rules).
    Consequence,
    /// Choice rules.
    Choice,
    /// Reorder score rules.
    Reorder,
    /// Multichoice tier rules.
    Multichoice,
    /// Dialogue completion rules.
    Dialogue,
}

impl RuleKind {
    /// All groups in priority order.
    pub const ALL: [Self; 5] = [
        Self::Consequence,
        Self::Choice,
        Self::Reorder,
        Self::Multichoice,
        Self::Dialogue,
    ];

    /// Lowercase group name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Consequence => "consequence",
            Self::Choice => "choice",
            Self::Reorder => "reorder",
            Self::Multichoice => "multichoice",
            Self::Dialogue => "dialogue",
        }
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Navigation rules grouped by kind, plus the pool of feedback slot names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleSet {
    /// Session keys rules may write a feedback value to, referenced by index.
    pub slots: Vec<String>,
    /// Consequence rules.
    pub consequence: Vec<NavigationRule>,
    /// Choice rules.
    pub choice: Vec<NavigationRule>,
    /// Reorder rules.
    pub reorder: Vec<NavigationRule>,
    /// Multichoice rules.
    pub multichoice: Vec<NavigationRule>,
    /// Dialogue rules.
    pub dialogue: Vec<NavigationRule>,
}

impl RuleSet {
    /// Parse a rule set from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Rules of one group in authored order.
    pub fn group(&self, kind: RuleKind) -> &[NavigationRule] {
        match kind {
            RuleKind::Consequence => &self.consequence,
            RuleKind::Choice => &self.choice,
            RuleKind::Reorder => &self.reorder,
            RuleKind::Multichoice => &self.multichoice,
            RuleKind::Dialogue => &self.dialogue,
        }
    }

    /// Slot name at `index`.
    pub fn slot_name(&self, index: usize) -> Option<&str> {
        self.slots.get(index).map(String::as_str)
    }

    /// Every rule with its group, in priority order.
    pub fn iter(&self) -> impl Iterator<Item = (RuleKind, &NavigationRule)> {
        RuleKind::ALL
            .into_iter()
            .flat_map(move |kind| self.group(kind).iter().map(move |rule| (kind, rule)))
    }

    /// Total number of rules.
    pub fn len(&self) -> usize {
        RuleKind::ALL.iter().map(|k| self.group(*k).len()).sum()
    }

    /// Whether there are no rules at all.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
