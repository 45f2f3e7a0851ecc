use rh_core::interaction::{SuccessWeights, TierPhrases};
use rh_core::Tier;

use super::{clamp_score, decay};

/// Result of scoring a reorder submission.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReorderOutcome {
    /// First tier whose phrase list contains the sentence.
    pub tier: Option<Tier>,
    /// Tier weight after attempt decay.
    pub score: f64,
}

/// Canonical form of a reorder sentence.
///
/// Curly and prime apostrophes and backticks become `'`, non-breaking
/// spaces become plain spaces, and surrounding whitespace is trimmed.
pub fn normalize(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\u{2018}' | '\u{2019}' | '\u{2032}' | '`' => '\'',
            '\u{00A0}' => ' ',
            other => other,
        })
        .collect::<String>()
        .trim()
        .to_string()
}

/// Score a reorder sentence against tiered phrase lists, high to low.
pub fn score_reorder(
    phrases: Option<&TierPhrases>,
    weights: &SuccessWeights,
    submitted: &str,
    attempts: u32,
) -> ReorderOutcome {
    let sentence = normalize(submitted);
    let tier = phrases.and_then(|p| {
        Tier::ALL
            .into_iter()
            .find(|t| p.phrases(*t).iter().any(|candidate| normalize(candidate) == sentence))
    });
    let score = tier
        .map(|t| clamp_score(weights.tier(t).max(0.0) * decay(attempts)))
        .unwrap_or(0.0);
    ReorderOutcome { tier, score }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn phrases() -> TierPhrases {
        serde_json::from_str(
            r#"{"high": ["I'm sorry I'm late."], "medium": "Sorry, I'm late.", "low": ["Late, sorry."]}"#,
        )
        .unwrap()
    }

    fn weights() -> SuccessWeights {
        serde_json::from_str(r#"{"high": 1.0, "medium": 0.6, "low": 0.2}"#).unwrap()
    }

    #[test]
    fn tiers_checked_high_to_low() {
        let p = phrases();
        let w = weights();
        let high = score_reorder(Some(&p), &w, "I'm sorry I'm late.", 0);
        assert_eq!(high.tier, Some(Tier::High));
        assert_eq!(high.score, 1.0);
        let medium = score_reorder(Some(&p), &w, "Sorry, I'm late.", 0);
        assert_eq!(medium.tier, Some(Tier::Medium));
        assert!((medium.score - 0.6).abs() < 1e-9);
        let none = score_reorder(Some(&p), &w, "Late I'm sorry.", 0);
        assert_eq!(none, ReorderOutcome { tier: None, score: 0.0 });
    }

    #[test]
    fn apostrophes_and_nbsp_are_equivalent() {
        let p = phrases();
        let w = weights();
        let straight = score_reorder(Some(&p), &w, "I'm sorry I'm late.", 0);
        let curly = score_reorder(Some(&p), &w, "I\u{2019}m sorry\u{00A0}I\u{2018}m late.  ", 0);
        assert_eq!(straight, curly);
    }

    #[test]
    fn second_attempt_is_half() {
        let p = phrases();
        let w = weights();
        let first = score_reorder(Some(&p), &w, "Sorry, I'm late.", 0);
        let second = score_reorder(Some(&p), &w, "Sorry, I'm late.", 1);
        assert_eq!(second.score, first.score / 2.0);
        assert_eq!(score_reorder(Some(&p), &w, "Sorry, I'm late.", 2).score, 0.0);
    }

    #[test]
    fn no_phrases_scores_zero() {
        let out = score_reorder(None, &weights(), "anything", 0);
        assert_eq!(out.tier, None);
        assert_eq!(out.score, 0.0);
    }
}
