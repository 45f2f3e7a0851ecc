//! Endpoint navigation: matches a completed interaction against declarative
//! rules and writes the endpoint flag and feedback slot.

use rh_core::{
    InteractionId, InteractionKind, MatchKey, NavigationRule, RuleKind, RuleSet, SessionKey,
    SessionVars, Tier,
};

use crate::machine::Stage;

const SCORE_EPSILON: f64 = 1e-9;

/// The outcome a navigation call carries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Outcome {
    /// The learner's response id.
    Response(i64),
    /// A reorder score.
    Score(f64),
    /// A multichoice tier.
    Level(Tier),
    /// Dialogue completion.
    Completed,
}

/// A request to apply navigation rules.
#[derive(Debug, Clone, PartialEq)]
pub struct NavigationCall<'a> {
    /// Interaction the call was issued for.
    pub interaction: InteractionId,
    /// Its kind.
    pub kind: InteractionKind,
    /// Stage at issue time.
    pub stage: Stage,
    /// The learner's outcome; `None` when the call carries no learner response.
    pub outcome: Option<Outcome>,
    /// Function label of the learner's response, if any.
    pub function: Option<&'a str>,
}

/// Why a call was ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// The learner has since moved to another interaction.
    Stale {
        /// Interaction now current.
        current: InteractionId,
    },
    /// The response asked for a repeat.
    RepeatRequest,
    /// The call came from NPC speech finishing, not from the learner.
    NpcSpeech,
}

/// What applying the rules will do.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// Ignore the call; nothing is written.
    Rejected(Rejection),
    /// A rule matched.
    Fire {
        /// Its group.
        kind: RuleKind,
        /// The rule.
        rule: NavigationRule,
    },
    /// Nothing matched; the endpoint flag is reset.
    NoMatch,
}

impl Decision {
    /// Whether a rule matched.
    pub fn fires(&self) -> bool {
        matches!(self, Self::Fire { .. })
    }
}

/// Rule matcher.
#[derive(Debug, Clone)]
pub struct Navigator {
    rules: RuleSet,
    repeat_function: String,
}

impl Navigator {
    /// Create a navigator over `rules`.
    pub fn new(rules: RuleSet, repeat_function: impl Into<String>) -> Self {
        Self {
            rules,
            repeat_function: repeat_function.into(),
        }
    }

    /// The rule set.
    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Check the guards and find the first matching rule. Reads only.
    pub fn decide(&self, vars: &SessionVars<'_>, call: &NavigationCall<'_>) -> Decision {
        if let Some(current) = vars.current_interaction().filter(|c| *c != call.interaction) {
            return Decision::Rejected(Rejection::Stale { current });
        }
        if call.function == Some(self.repeat_function.as_str()) {
            return Decision::Rejected(Rejection::RepeatRequest);
        }
        if call.outcome.is_none()
            && call.kind != InteractionKind::Dialogue
            && vars.text(&SessionKey::NpcText).is_some()
        {
            return Decision::Rejected(Rejection::NpcSpeech);
        }

        self.find(call)
            .map(|(kind, rule)| Decision::Fire {
                kind,
                rule: rule.clone(),
            })
            .unwrap_or(Decision::NoMatch)
    }

    /// Write what `decision` calls for. Returns whether a rule fired.
    pub fn commit(&self, vars: &SessionVars<'_>, interaction: InteractionId, decision: &Decision) -> bool {
        match decision {
            Decision::Rejected(reason) => {
                tracing::debug!(interaction = %interaction, ?reason, "navigation call ignored");
                false
            }
            Decision::NoMatch => {
                vars.set_endpoint(false);
                tracing::debug!(interaction = %interaction, "no navigation rule matched");
                false
            }
            Decision::Fire { kind, rule } => {
                if let (Some(index), Some(value)) = (rule.slot, rule.value) {
                    match self.rules.slot_name(index) {
                        Some(name) => vars.set(&SessionKey::Slot(name.to_string()), value),
                        None => tracing::warn!(
                            interaction = %interaction,
                            slot = index,
                            "navigation rule names a slot outside the pool"
                        ),
                    }
                }
                let endpoint = rule.endpoint.unwrap_or(false);
                vars.set_endpoint(endpoint);
                tracing::info!(
                    interaction = %interaction,
                    group = %kind,
                    when = %rule.when,
                    endpoint,
                    "navigation rule fired"
                );
                true
            }
        }
    }

    /// Decide and commit immediately. Returns whether a rule fired.
    pub fn apply(&self, vars: &SessionVars<'_>, call: &NavigationCall<'_>) -> bool {
        let decision = self.decide(vars, call);
        self.commit(vars, call.interaction, &decision)
    }

    fn find(&self, call: &NavigationCall<'_>) -> Option<(RuleKind, &NavigationRule)> {
        let groups: &[RuleKind] = match (call.kind, call.stage, call.outcome) {
            (
                InteractionKind::OneStep | InteractionKind::TwoStep,
                Stage::Response,
                Some(Outcome::Response(_)),
            ) => &[RuleKind::Consequence, RuleKind::Choice],
            (InteractionKind::Reorder, Stage::Reorder, Some(Outcome::Score(_))) => {
                &[RuleKind::Reorder]
            }
            (InteractionKind::Multichoice, Stage::Multichoice, Some(Outcome::Level(_))) => {
                &[RuleKind::Multichoice]
            }
            (InteractionKind::Dialogue, _, _) => &[RuleKind::Dialogue],
            _ => &[],
        };

        groups.iter().find_map(|kind| {
            self.rules
                .group(*kind)
                .iter()
                .find(|rule| rule.interaction_id == call.interaction && key_matches(rule.when, call))
                .map(|rule| (*kind, rule))
        })
    }
}

fn key_matches(when: MatchKey, call: &NavigationCall<'_>) -> bool {
    match (when, call.outcome) {
        (_, _) if call.kind == InteractionKind::Dialogue => true,
        (MatchKey::Any, _) => true,
        (MatchKey::ResponseId(id), Some(Outcome::Response(r))) => id == r,
        (MatchKey::SuccessScore(s), Some(Outcome::Score(score))) => (s - score).abs() < SCORE_EPSILON,
        (MatchKey::SuccessLevel(t), Some(Outcome::Level(level))) => t == level,
        _ => false,
    }
}
