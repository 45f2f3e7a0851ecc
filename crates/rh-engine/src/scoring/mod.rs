//! Scoring: pure functions from (interaction content, learner response, stage)
//! to a success score in `[0, 1]`.

mod multichoice;
mod reorder;

pub use multichoice::{MultichoiceOutcome, count_correct, score_multichoice, tier_for_count};
pub use reorder::{ReorderOutcome, normalize, score_reorder};

use rh_core::interaction::{AttributeExpectations, AttributeWeights, SuccessWeights};
use rh_core::{Attribute, InteractionKind, ResponseCandidate};

use crate::machine::Stage;
use crate::selector::ResolvedContent;

/// Attempt-decay multiplier: full credit first, half on the second try, nothing after.
pub fn decay(attempts: u32) -> f64 {
    match attempts {
        0 => 1.0,
        1 => 0.5,
        _ => 0.0,
    }
}

/// Clamp to `[0, 1]`; NaN becomes 0.
pub fn clamp_score(score: f64) -> f64 {
    if score.is_nan() { 0.0 } else { score.clamp(0.0, 1.0) }
}

/// Sum the weights of `attributes` whose expectation the response meets.
///
/// Attributes without an expectation award nothing.
pub fn attribute_sum(
    expectations: Option<&AttributeExpectations>,
    weights: &AttributeWeights,
    response: &ResponseCandidate,
    attributes: &[Attribute],
) -> f64 {
    let Some(expectations) = expectations else {
        return 0.0;
    };
    attributes
        .iter()
        .filter(|a| expectations.accepts(**a, response.attribute(**a)) == Some(true))
        .map(|a| weights.weight(*a).max(0.0))
        .sum()
}

/// A learner response in the shape its interaction kind expects.
#[derive(Debug, Clone, Copy)]
pub enum Response<'a> {
    /// A labeled candidate (one-step, two-step, end-point).
    Candidate(&'a ResponseCandidate),
    /// A reorder sentence.
    Sentence(&'a str),
    /// Yes/no picks, one per presented multichoice row.
    Picks(&'a [bool]),
}

/// Session-derived inputs to scoring.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScoreContext {
    /// Attempt counter for the stage being scored.
    pub attempts: u32,
    /// Score already committed by the two-step understanding stage.
    pub prior: f64,
}

/// Score a response.
///
/// Mismatched kind/response combinations and unscored kinds score 0.
pub fn score(
    kind: InteractionKind,
    stage: Stage,
    content: &ResolvedContent<'_>,
    weights: &SuccessWeights,
    response: Response<'_>,
    ctx: ScoreContext,
) -> f64 {
    let attrs = content.expectations.and_then(|e| e.attributes());
    let raw = match (kind, stage, response) {
        (InteractionKind::OneStep | InteractionKind::EndPoint, _, Response::Candidate(c)) => {
            attribute_sum(attrs, &weights.attributes, c, &Attribute::ALL)
        }
        (InteractionKind::TwoStep, Stage::Understanding, Response::Candidate(c)) => {
            let sum = attribute_sum(
                attrs,
                &weights.understanding_stage,
                c,
                &[Attribute::Topic, Attribute::Function],
            );
            sum * decay(ctx.attempts)
        }
        (InteractionKind::TwoStep, _, Response::Candidate(c)) => {
            let sum = attribute_sum(
                attrs,
                &weights.response_stage,
                c,
                &[Attribute::Tone, Attribute::Formality],
            );
            ctx.prior + sum
        }
        (InteractionKind::Reorder, _, Response::Sentence(text)) => {
            let phrases = content.expectations.and_then(|e| e.phrases());
            score_reorder(phrases, weights, text, ctx.attempts).score
        }
        (InteractionKind::Multichoice, _, Response::Picks(picks)) => {
            let ranges = content.expectations.and_then(|e| e.ranges());
            score_multichoice(ranges, weights, content.multichoice_options, picks).score
        }
        _ => 0.0,
    };
    let score = clamp_score(raw);
    tracing::debug!(kind = %kind, stage = %stage, raw, score, "scored response");
    score
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rh_core::{Expectations, Interaction};

    fn one_step() -> Interaction {
        serde_json::from_str(
            r#"{
                "interaction_id": 2,
                "interaction_type": "one-step",
                "expectations": {"topic": "delay", "function": ["apologize", "explain"], "tone": ["polite"]},
                "success_weights": {"topic": 0.4, "function": 0.4, "tone": 0.3, "formality": 0.5}
            }"#,
        )
        .unwrap()
    }

    fn two_step() -> Interaction {
        serde_json::from_str(
            r#"{
                "interaction_id": 3,
                "interaction_type": "two-step",
                "expectations": {"topic": "delay", "function": ["ask"], "tone": ["polite"], "formality": ["formal"]},
                "success_weights": {
                    "understanding_stage": {"topic": 0.3, "function": 0.3},
                    "response_stage": {"tone": 0.2, "formality": 0.2}
                }
            }"#,
        )
        .unwrap()
    }

    fn content(i: &Interaction) -> ResolvedContent<'_> {
        ResolvedContent {
            selector: None,
            understanding_check: &i.understanding_check,
            detailed_responses: &i.detailed_responses,
            multichoice_options: &i.multi_choice_option,
            expectations: i.expectations.as_ref(),
            column_headers: None,
        }
    }

    fn candidate(topic: &str, function: &str, tone: &str, formality: &str) -> ResponseCandidate {
        ResponseCandidate {
            id: Some(1),
            text: "text".into(),
            topic: Some(topic.into()),
            function: Some(function.into()),
            tone: Some(tone.into()),
            formality: Some(formality.into()),
            audio: Default::default(),
            audio_button: None,
        }
    }

    #[test]
    fn decay_multipliers() {
        assert_eq!(decay(0), 1.0);
        assert_eq!(decay(1), 0.5);
        assert_eq!(decay(2), 0.0);
        assert_eq!(decay(9), 0.0);
    }

    #[test]
    fn one_step_adds_matching_weights_and_clamps() {
        let i = one_step();
        let c = candidate("delay", "explain", "polite", "casual");
        let s = score(
            i.kind,
            Stage::Response,
            &content(&i),
            &i.success_weights,
            Response::Candidate(&c),
            ScoreContext::default(),
        );
        // 0.4 + 0.4 + 0.3 = 1.1, formality has no expectation.
        assert_eq!(s, 1.0);

        let c = candidate("weather", "explain", "rude", "formal");
        let s = score(
            i.kind,
            Stage::Response,
            &content(&i),
            &i.success_weights,
            Response::Candidate(&c),
            ScoreContext::default(),
        );
        assert!((s - 0.4).abs() < 1e-9);
    }

    #[test]
    fn understanding_decays_with_attempts() {
        let i = two_step();
        let c = candidate("delay", "ask", "rude", "casual");
        let at = |attempts| {
            score(
                i.kind,
                Stage::Understanding,
                &content(&i),
                &i.success_weights,
                Response::Candidate(&c),
                ScoreContext { attempts, prior: 0.0 },
            )
        };
        assert!((at(0) - 0.6).abs() < 1e-9);
        assert!((at(1) - 0.3).abs() < 1e-9);
        assert_eq!(at(2), 0.0);
    }

    #[test]
    fn response_stage_builds_on_prior() {
        let i = two_step();
        let c = candidate("other", "other", "polite", "formal");
        let s = score(
            i.kind,
            Stage::Response,
            &content(&i),
            &i.success_weights,
            Response::Candidate(&c),
            ScoreContext { attempts: 0, prior: 0.6 },
        );
        assert!((s - 1.0).abs() < 1e-9);

        let s = score(
            i.kind,
            Stage::Response,
            &content(&i),
            &i.success_weights,
            Response::Candidate(&c),
            ScoreContext { attempts: 0, prior: 0.9 },
        );
        assert_eq!(s, 1.0);
    }

    #[test]
    fn missing_expectations_award_nothing() {
        let mut i = one_step();
        i.expectations = None;
        let c = candidate("delay", "explain", "polite", "formal");
        let s = score(
            i.kind,
            Stage::Response,
            &content(&i),
            &i.success_weights,
            Response::Candidate(&c),
            ScoreContext::default(),
        );
        assert_eq!(s, 0.0);
    }

    #[test]
    fn mismatched_response_scores_zero() {
        let i = one_step();
        let s = score(
            i.kind,
            Stage::Response,
            &content(&i),
            &i.success_weights,
            Response::Sentence("hello"),
            ScoreContext::default(),
        );
        assert_eq!(s, 0.0);
    }

    #[test]
    fn dialogue_is_not_scored() {
        let i: Interaction =
            serde_json::from_str(r#"{"interaction_id": 9, "interaction_type": "dialogue"}"#).unwrap();
        let c = candidate("a", "b", "c", "d");
        let s = score(
            i.kind,
            Stage::Line(0),
            &content(&i),
            &i.success_weights,
            Response::Candidate(&c),
            ScoreContext::default(),
        );
        assert_eq!(s, 0.0);
    }

    proptest! {
        #[test]
        fn score_stays_in_unit_range(
            topic_w in -2.0f64..3.0,
            function_w in -2.0f64..3.0,
            tone_w in -2.0f64..3.0,
            formality_w in -2.0f64..3.0,
            prior in -1.0f64..2.0,
            attempts in 0u32..4,
            matches in proptest::collection::vec(any::<bool>(), 4),
        ) {
            let weights = AttributeWeights {
                topic: topic_w,
                function: function_w,
                tone: tone_w,
                formality: formality_w,
            };
            let all = SuccessWeights {
                attributes: weights,
                understanding_stage: weights,
                response_stage: weights,
                ..SuccessWeights::default()
            };
            let expectations: Expectations = serde_json::from_str(
                r#"{"topic": "t", "function": ["f"], "tone": ["n"], "formality": ["m"]}"#,
            )
            .unwrap();
            let pick = |hit: bool, good: &str| if hit { good.to_string() } else { "x".to_string() };
            let c = candidate(
                &pick(matches[0], "t"),
                &pick(matches[1], "f"),
                &pick(matches[2], "n"),
                &pick(matches[3], "m"),
            );
            let content = ResolvedContent {
                selector: None,
                understanding_check: &[],
                detailed_responses: &[],
                multichoice_options: &[],
                expectations: Some(&expectations),
                column_headers: None,
            };
            for (kind, stage) in [
                (InteractionKind::OneStep, Stage::Response),
                (InteractionKind::EndPoint, Stage::Response),
                (InteractionKind::TwoStep, Stage::Understanding),
                (InteractionKind::TwoStep, Stage::Response),
            ] {
                let s = score(kind, stage, &content, &all, Response::Candidate(&c), ScoreContext { attempts, prior });
                prop_assert!((0.0..=1.0).contains(&s));
            }
        }
    }
}
