//! Hints describing what the NPC expects.

use rh_core::{Attribute, Descriptions, Interaction, InteractionKind, LabelDescription};

use crate::machine::Stage;
use crate::selector::ResolvedContent;

const NEUTRAL: &str = "neutral";

/// Build the hint for `interaction` at `stage`, if one applies.
///
/// One-step interactions and the two-step response stage list the expected
/// labels with positive weight; reorder interactions use their authored hint.
pub fn build_hint(
    interaction: &Interaction,
    stage: Stage,
    content: &ResolvedContent<'_>,
    descriptions: &Descriptions,
) -> Option<String> {
    match (interaction.kind, stage) {
        (InteractionKind::Reorder, _) => interaction.hint.clone(),
        (InteractionKind::OneStep, _) | (InteractionKind::TwoStep, Stage::Response) => {
            Some(expectation_hint(interaction, content, descriptions))
        }
        _ => None,
    }
}

fn expectation_hint(
    interaction: &Interaction,
    content: &ResolvedContent<'_>,
    descriptions: &Descriptions,
) -> String {
    let expectations = content.expectations.and_then(|e| e.attributes());
    let mut parts = Vec::new();

    if let Some(expectations) = expectations {
        for attribute in Attribute::ALL {
            if weight(interaction, attribute) <= 0.0 {
                continue;
            }
            let texts: Vec<&str> = expectations
                .values(attribute)
                .into_iter()
                .filter(|label| !label.is_empty() && *label != NEUTRAL)
                .filter_map(|label| descriptions.describe(attribute, label))
                .map(|d| describe(attribute, d))
                .collect();
            match attribute {
                // Each formality level gets its own bullet.
                Attribute::Formality => parts.extend(texts.into_iter().map(str::to_string)),
                _ if !texts.is_empty() => parts.push(texts.join(" / ")),
                _ => {}
            }
        }
    }

    let mut hint = format!("{} expects you:\n", interaction.npc.character_name);
    if parts.is_empty() {
        hint.push_str("\n• No specific expectations found");
    } else {
        for part in parts {
            hint.push_str("\n• ");
            hint.push_str(&part);
        }
    }
    hint
}

fn describe(attribute: Attribute, description: &LabelDescription) -> &str {
    match attribute {
        Attribute::Topic => description.hint_text(),
        _ => &description.description,
    }
}

/// Top-level weight, or the larger stage weight for two-step interactions.
fn weight(interaction: &Interaction, attribute: Attribute) -> f64 {
    let w = &interaction.success_weights;
    let top = w.attributes.weight(attribute);
    if interaction.kind == InteractionKind::TwoStep {
        top.max(w.understanding_stage.weight(attribute))
            .max(w.response_stage.weight(attribute))
    } else {
        top
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptions() -> Descriptions {
        serde_json::from_str(
            r#"{
                "topics": {"delay": {"description": "the delay", "expectation_description": "Talk about the delay"}},
                "functions": {
                    "apologize": {"description": "Apologize"},
                    "explain": {"description": "Explain yourself"}
                },
                "tones": {"polite": {"description": "Stay polite"}, "neutral": {"description": "n/a"}},
                "formality": {"formal": {"description": "Keep it formal"}}
            }"#,
        )
        .unwrap()
    }

    fn resolved(i: &Interaction) -> ResolvedContent<'_> {
        ResolvedContent {
            selector: None,
            understanding_check: &i.understanding_check,
            detailed_responses: &i.detailed_responses,
            multichoice_options: &i.multi_choice_option,
            expectations: i.expectations.as_ref(),
            column_headers: None,
        }
    }

    #[test]
    fn lists_weighted_expectations() {
        let i: Interaction = serde_json::from_str(
            r#"{
                "interaction_id": 2, "interaction_type": "one-step",
                "npc": {"character_id": 2, "character_name": "Ana"},
                "expectations": {"topic": "delay", "function": ["apologize", "explain"], "tone": ["neutral", "polite"], "formality": ["formal"]},
                "success_weights": {"topic": 0.3, "function": 0.3, "tone": 0.2, "formality": 0.0}
            }"#,
        )
        .unwrap();
        let hint = build_hint(&i, Stage::Response, &resolved(&i), &descriptions()).unwrap();
        insta::assert_snapshot!(hint, @r"
        Ana expects you:

        • Talk about the delay
        • Apologize / Explain yourself
        • Stay polite
        ");
    }

    #[test]
    fn empty_hint_says_so() {
        let i: Interaction = serde_json::from_str(
            r#"{"interaction_id": 2, "interaction_type": "one-step", "npc": {"character_name": "Ana"}}"#,
        )
        .unwrap();
        let hint = build_hint(&i, Stage::Response, &resolved(&i), &descriptions()).unwrap();
        assert!(hint.ends_with("• No specific expectations found"));
    }

    #[test]
    fn reorder_uses_authored_hint() {
        let i: Interaction = serde_json::from_str(
            r#"{"interaction_id": 4, "interaction_type": "reord", "hint": "Start with the subject."}"#,
        )
        .unwrap();
        assert_eq!(
            build_hint(&i, Stage::Reorder, &resolved(&i), &descriptions()).as_deref(),
            Some("Start with the subject.")
        );
    }

    #[test]
    fn no_hint_during_understanding() {
        let i: Interaction =
            serde_json::from_str(r#"{"interaction_id": 3, "interaction_type": "two-step"}"#).unwrap();
        assert!(build_hint(&i, Stage::Understanding, &resolved(&i), &descriptions()).is_none());
    }
}
