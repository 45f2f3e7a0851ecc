use std::collections::{BTreeSet, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, CatalogResult};
use crate::ids::{CharacterId, InteractionId};
use crate::interaction::{Attribute, Expectations, Interaction, InteractionKind, Tier};
use crate::navigation::{MatchKey, RuleKind, RuleSet};

/// Human-readable description of an attribute label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelDescription {
    /// What the label means.
    #[serde(default)]
    pub description: String,
    /// How to phrase the expectation in a hint.
    #[serde(default)]
    pub expectation_description: Option<String>,
}

impl LabelDescription {
    /// Text used in hints: the expectation phrasing if present, else the description.
    pub fn hint_text(&self) -> &str {
        self.expectation_description.as_deref().unwrap_or(&self.description)
    }
}

/// Description tables for attribute labels.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Descriptions {
    /// Topic labels.
    pub topics: HashMap<String, LabelDescription>,
    /// Function labels.
    pub functions: HashMap<String, LabelDescription>,
    /// Tone labels.
    pub tones: HashMap<String, LabelDescription>,
    /// Formality labels.
    pub formality: HashMap<String, LabelDescription>,
}

impl Descriptions {
    /// Look up the description of `label` for `attribute`.
    pub fn describe(&self, attribute: Attribute, label: &str) -> Option<&LabelDescription> {
        let table = match attribute {
            Attribute::Topic => &self.topics,
            Attribute::Function => &self.functions,
            Attribute::Tone => &self.tones,
            Attribute::Formality => &self.formality,
        };
        table.get(label)
    }
}

/// The authored catalog document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogDocument {
    /// Interactions in authored order.
    pub interactions: Vec<Interaction>,
    /// Label description tables.
    #[serde(default)]
    pub descriptions: Descriptions,
}

/// Read-only collection of interactions, indexed by id.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    interactions: Vec<Interaction>,
    index: HashMap<InteractionId, usize>,
    descriptions: Descriptions,
}

impl Catalog {
    /// Build a catalog, rejecting duplicate ids.
    pub fn new(interactions: Vec<Interaction>) -> CatalogResult<Self> {
        let mut index = HashMap::with_capacity(interactions.len());
        for (pos, interaction) in interactions.iter().enumerate() {
            if index.insert(interaction.id, pos).is_some() {
                return Err(CatalogError::DuplicateInteraction(interaction.id));
            }
        }
        Ok(Self {
            interactions,
            index,
            descriptions: Descriptions::default(),
        })
    }

    /// Parse a `{ "interactions": [...], "descriptions": {...} }` document.
    pub fn from_json(json: &str) -> CatalogResult<Self> {
        Self::from_document(serde_json::from_str(json)?)
    }

    /// Build a catalog from an already parsed document.
    pub fn from_document(doc: CatalogDocument) -> CatalogResult<Self> {
        Ok(Self::new(doc.interactions)?.with_descriptions(doc.descriptions))
    }

    /// Attach label description tables.
    pub fn with_descriptions(mut self, descriptions: Descriptions) -> Self {
        self.descriptions = descriptions;
        self
    }

    /// Look up an interaction.
    pub fn get(&self, id: InteractionId) -> CatalogResult<&Interaction> {
        self.index
            .get(&id)
            .map(|&pos| &self.interactions[pos])
            .ok_or(CatalogError::InteractionNotFound(id))
    }

    /// Whether an interaction exists.
    pub fn contains(&self, id: InteractionId) -> bool {
        self.index.contains_key(&id)
    }

    /// All interactions in authored order.
    pub fn interactions(&self) -> &[Interaction] {
        &self.interactions
    }

    /// Label description tables.
    pub fn descriptions(&self) -> &Descriptions {
        &self.descriptions
    }

    /// Number of interactions.
    pub fn len(&self) -> usize {
        self.interactions.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.interactions.is_empty()
    }

    /// Distinct NPC characters across non-dialogue interactions.
    pub fn characters(&self) -> BTreeSet<&CharacterId> {
        self.interactions
            .iter()
            .filter(|i| i.kind != InteractionKind::Dialogue)
            .map(|i| &i.npc.character_id)
            .filter(|c| !c.as_str().is_empty())
            .collect()
    }

    /// Cross-check the catalog against a rule set.
    pub fn validate(&self, rules: &RuleSet) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();

        for interaction in &self.interactions {
            if let Some(selection) = &interaction.content_selection {
                for source in selection.from_interaction.ids() {
                    if !self.contains(*source) {
                        issues.push(ValidationIssue::DanglingSelector {
                            interaction: interaction.id,
                            source: *source,
                        });
                    }
                }
            }

            let range_sets = interaction
                .expectations
                .iter()
                .chain(interaction.content_sets.values().filter_map(|s| s.expectations.as_ref()));
            for expectations in range_sets {
                if let Expectations::Ranges(ranges) = expectations {
                    for tier in Tier::ALL {
                        let range = ranges.range(tier);
                        if range.min > range.max {
                            issues.push(ValidationIssue::InvertedRange {
                                interaction: interaction.id,
                                tier,
                            });
                        }
                    }
                }
            }

            for construction in &interaction.feedback_constructions {
                if !self.contains(construction.source_interaction) {
                    issues.push(ValidationIssue::DanglingSelector {
                        interaction: interaction.id,
                        source: construction.source_interaction,
                    });
                }
            }
        }

        for (kind, rule) in rules.iter() {
            match self.get(rule.interaction_id) {
                Err(_) => issues.push(ValidationIssue::UnknownRuleTarget {
                    kind,
                    interaction: rule.interaction_id,
                }),
                Ok(target) if !rule_fits(kind, target.kind, rule.when) => {
                    issues.push(ValidationIssue::RuleKindMismatch {
                        kind,
                        interaction: rule.interaction_id,
                        interaction_kind: target.kind,
                    });
                }
                Ok(_) => {}
            }
            if let Some(slot) = rule.slot {
                if rules.slot_name(slot).is_none() {
                    issues.push(ValidationIssue::SlotOutOfRange {
                        kind,
                        interaction: rule.interaction_id,
                        slot,
                    });
                }
            }
        }

        issues
    }
}

/// `Any` fits every group; other keys must match the group's outcome shape.
fn rule_fits(kind: RuleKind, target: InteractionKind, when: MatchKey) -> bool {
    match kind {
        RuleKind::Consequence | RuleKind::Choice => {
            matches!(target, InteractionKind::OneStep | InteractionKind::TwoStep)
                && matches!(when, MatchKey::ResponseId(_) | MatchKey::Any)
        }
        RuleKind::Reorder => {
            target == InteractionKind::Reorder
                && matches!(when, MatchKey::SuccessScore(_) | MatchKey::Any)
        }
        RuleKind::Multichoice => {
            target == InteractionKind::Multichoice
                && matches!(when, MatchKey::SuccessLevel(_) | MatchKey::Any)
        }
        RuleKind::Dialogue => target == InteractionKind::Dialogue,
    }
}

/// A problem found by [`Catalog::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    /// A content selector or feedback construction references a missing interaction.
    DanglingSelector {
        /// The referencing interaction.
        interaction: InteractionId,
        /// The missing id.
        source: InteractionId,
    },
    /// A multichoice tier range has `min > max`.
    InvertedRange {
        /// The interaction.
        interaction: InteractionId,
        /// The inverted tier.
        tier: Tier,
    },
    /// A rule targets an interaction that does not exist.
    UnknownRuleTarget {
        /// Rule group.
        kind: RuleKind,
        /// The missing id.
        interaction: InteractionId,
    },
    /// A rule's group or match key does not suit its interaction's kind.
    RuleKindMismatch {
        /// Rule group.
        kind: RuleKind,
        /// Target interaction.
        interaction: InteractionId,
        /// Its kind.
        interaction_kind: InteractionKind,
    },
    /// A rule references a slot index outside the pool.
    SlotOutOfRange {
        /// Rule group.
        kind: RuleKind,
        /// Target interaction.
        interaction: InteractionId,
        /// The bad index.
        slot: usize,
    },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DanglingSelector { interaction, source } => {
                write!(f, "interaction {interaction} references unknown interaction {source}")
            }
            Self::InvertedRange { interaction, tier } => {
                write!(f, "interaction {interaction} has an inverted {tier} range")
            }
            Self::UnknownRuleTarget { kind, interaction } => {
                write!(f, "{kind} rule targets unknown interaction {interaction}")
            }
            Self::RuleKindMismatch {
                kind,
                interaction,
                interaction_kind,
            } => write!(
                f,
                "{kind} rule does not fit interaction {interaction} ({interaction_kind})"
            ),
            Self::SlotOutOfRange {
                kind,
                interaction,
                slot,
            } => write!(
                f,
                "{kind} rule for interaction {interaction} uses unknown slot {slot}"
            ),
        }
    }
}
