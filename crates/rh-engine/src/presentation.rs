//! What the learner sees on entering an interaction or advancing a stage.

use rand::Rng;
use rh_core::interaction::ColumnHeaders;
use rh_core::{InteractionId, InteractionKind, MultichoiceOption, ResponseCandidate};
use serde::{Deserialize, Serialize};

use crate::machine::Stage;
use crate::selector::ResolvedContent;
use crate::shuffle::{shuffle_all, shuffle_keep_last};

const NPC_NAME_PLACEHOLDER: &str = "{characterName}";

/// The options presented for the current stage, in display order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "items", rename_all = "snake_case")]
pub enum Options {
    /// Labeled response candidates.
    Candidates(Vec<ResponseCandidate>),
    /// Reorder segments.
    Segments(Vec<String>),
    /// A yes/no grid.
    Grid {
        /// Column labels.
        headers: Option<ColumnHeaders>,
        /// Rows.
        rows: Vec<MultichoiceOption>,
    },
    /// Number of dialogue lines to play.
    Lines(u32),
}

impl Options {
    /// Number of selectable entries.
    pub fn len(&self) -> usize {
        match self {
            Self::Candidates(c) => c.len(),
            Self::Segments(s) => s.len(),
            Self::Grid { rows, .. } => rows.len(),
            Self::Lines(n) => usize::try_from(*n).unwrap_or(usize::MAX),
        }
    }

    /// Whether nothing is presented.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A stage as shown to the learner.
#[derive(Debug, Clone, PartialEq)]
pub struct Presentation {
    /// Interaction on screen.
    pub interaction: InteractionId,
    /// Its kind.
    pub kind: InteractionKind,
    /// Stage being presented.
    pub stage: Stage,
    /// NPC display name.
    pub npc_name: String,
    /// What the NPC says.
    pub npc_text: String,
    /// Presented options.
    pub options: Options,
    /// Hint for this stage, if any.
    pub hint: Option<String>,
}

/// Order the options for `stage`.
///
/// Candidate lists keep their last entry in place when it is the
/// understanding check or a one-step list; response-stage and grid content
/// is shuffled fully. End-point interactions present only their first
/// response.
pub fn arrange<R: Rng + ?Sized>(
    kind: InteractionKind,
    stage: Stage,
    content: &ResolvedContent<'_>,
    segments: &[String],
    lines: u32,
    npc_name: &str,
    rng: &mut R,
) -> Options {
    match (kind, stage) {
        (InteractionKind::OneStep, _) => {
            let mut items = named(content.detailed_responses, npc_name);
            shuffle_keep_last(&mut items, rng);
            Options::Candidates(items)
        }
        (InteractionKind::TwoStep, Stage::Understanding) => {
            let mut items = named(content.understanding_check, npc_name);
            shuffle_keep_last(&mut items, rng);
            Options::Candidates(items)
        }
        (InteractionKind::TwoStep, _) => {
            let mut items = named(content.detailed_responses, npc_name);
            shuffle_all(&mut items, rng);
            Options::Candidates(items)
        }
        (InteractionKind::EndPoint, _) => {
            let first = content
                .detailed_responses
                .first()
                .map(std::slice::from_ref)
                .unwrap_or_default();
            Options::Candidates(named(first, npc_name))
        }
        (InteractionKind::Reorder, _) => {
            let mut items: Vec<String> = segments.iter().map(|s| s.replace('\u{00A0}', " ")).collect();
            shuffle_all(&mut items, rng);
            Options::Segments(items)
        }
        (InteractionKind::Multichoice, _) => {
            let mut rows = content.multichoice_options.to_vec();
            shuffle_all(&mut rows, rng);
            Options::Grid {
                headers: content.column_headers.cloned(),
                rows,
            }
        }
        (InteractionKind::Dialogue, _) => Options::Lines(lines),
    }
}

fn named(candidates: &[ResponseCandidate], npc_name: &str) -> Vec<ResponseCandidate> {
    candidates
        .iter()
        .map(|c| {
            let mut c = c.clone();
            if c.text.contains(NPC_NAME_PLACEHOLDER) {
                c.text = c.text.replace(NPC_NAME_PLACEHOLDER, npc_name);
            }
            c
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use rh_core::{Interaction, YesNo};

    fn content(i: &Interaction) -> ResolvedContent<'_> {
        ResolvedContent {
            selector: None,
            understanding_check: &i.understanding_check,
            detailed_responses: &i.detailed_responses,
            multichoice_options: &i.multi_choice_option,
            expectations: i.expectations.as_ref(),
            column_headers: i.column_headers.as_ref(),
        }
    }

    fn candidates(n: usize) -> String {
        let items: Vec<String> = (0..n)
            .map(|i| format!(r#"{{"id": {i}, "text": "option {i}"}}"#))
            .collect();
        items.join(",")
    }

    #[test]
    fn one_step_keeps_last_option() {
        let json = format!(
            r#"{{"interaction_id": 2, "interaction_type": "one-step", "detailed_responses": [{}, {{"id": 9, "text": "Could you say that again, {{characterName}}?", "function": "ask_repeat"}}]}}"#,
            candidates(3)
        );
        let i: Interaction = serde_json::from_str(&json).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let Options::Candidates(items) =
            arrange(i.kind, Stage::Response, &content(&i), &[], 0, "Ana", &mut rng)
        else {
            panic!("expected candidates");
        };
        assert_eq!(items.len(), 4);
        assert_eq!(items[3].id, Some(9));
        assert_eq!(items[3].text, "Could you say that again, Ana?");
    }

    #[test]
    fn end_point_presents_first_response() {
        let json = format!(
            r#"{{"interaction_id": 20, "interaction_type": "end-point", "detailed_responses": [{}]}}"#,
            candidates(3)
        );
        let i: Interaction = serde_json::from_str(&json).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let options = arrange(i.kind, Stage::Response, &content(&i), &[], 0, "Ana", &mut rng);
        match options {
            Options::Candidates(items) => {
                assert_eq!(items.len(), 1);
                assert_eq!(items[0].id, Some(0));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn segments_lose_non_breaking_spaces() {
        let i: Interaction =
            serde_json::from_str(r#"{"interaction_id": 4, "interaction_type": "reord"}"#).unwrap();
        let segments = vec!["I'm\u{00A0}sorry".to_string()];
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(
            arrange(i.kind, Stage::Reorder, &content(&i), &segments, 0, "", &mut rng),
            Options::Segments(vec!["I'm sorry".into()])
        );
    }

    #[test]
    fn grid_keeps_every_row() {
        let i: Interaction = serde_json::from_str(
            r#"{
                "interaction_id": 5, "interaction_type": "multichoice",
                "multi_choice_option": [
                    {"text": "tent", "expected_response": "yes"},
                    {"text": "map", "expected_response": "yes"},
                    {"text": "piano", "expected_response": "no"}
                ],
                "column_headers": {"text_1": "Pack", "text_2": "Leave"}
            }"#,
        )
        .unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        let Options::Grid { headers, mut rows } =
            arrange(i.kind, Stage::Multichoice, &content(&i), &[], 0, "", &mut rng)
        else {
            panic!("expected grid");
        };
        assert_eq!(headers.map(|h| h.text_1), Some("Pack".into()));
        rows.sort_by(|a, b| a.text.cmp(&b.text));
        assert_eq!(rows[1].text, "piano");
        assert_eq!(rows[1].expected_response, YesNo::No);
    }

    #[test]
    fn options_serialize_tagged() {
        let json = serde_json::to_string(&Options::Lines(3)).unwrap();
        assert_eq!(json, r#"{"kind":"lines","items":3}"#);
    }
}
