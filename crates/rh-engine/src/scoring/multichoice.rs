use rh_core::interaction::{SuccessWeights, TierRanges};
use rh_core::{MultichoiceOption, Tier};

use super::clamp_score;

/// Result of scoring a multichoice submission.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MultichoiceOutcome {
    /// Rows whose pick matched the expected response.
    pub correct: u32,
    /// Tier the count falls in.
    pub tier: Tier,
    /// Weight of that tier.
    pub score: f64,
}

/// Count picks that equal their row's expected response.
///
/// Rows without a pick are not counted.
pub fn count_correct(options: &[MultichoiceOption], picks: &[bool]) -> u32 {
    let hits = options
        .iter()
        .zip(picks)
        .filter(|(option, pick)| option.expected_response.is_yes() == **pick)
        .count();
    u32::try_from(hits).unwrap_or(u32::MAX)
}

/// Tier whose inclusive range contains `count`, checked high to low.
///
/// Counts outside every range, or no ranges at all, fall to `Low`.
pub fn tier_for_count(ranges: Option<&TierRanges>, count: u32) -> Tier {
    ranges
        .and_then(|r| Tier::ALL.into_iter().find(|t| r.range(*t).contains(count)))
        .unwrap_or(Tier::Low)
}

/// Score a multichoice submission.
pub fn score_multichoice(
    ranges: Option<&TierRanges>,
    weights: &SuccessWeights,
    options: &[MultichoiceOption],
    picks: &[bool],
) -> MultichoiceOutcome {
    let correct = count_correct(options, picks);
    let tier = tier_for_count(ranges, correct);
    MultichoiceOutcome {
        correct,
        tier,
        score: clamp_score(weights.tier(tier)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rh_core::YesNo;

    fn ranges() -> TierRanges {
        serde_json::from_str(
            r#"{"high": {"min": 3, "max": 4}, "medium": {"min": 1, "max": 2}, "low": {"min": 0, "max": 0}}"#,
        )
        .unwrap()
    }

    fn options() -> Vec<MultichoiceOption> {
        [YesNo::Yes, YesNo::No, YesNo::Yes, YesNo::Yes]
            .into_iter()
            .enumerate()
            .map(|(i, expected_response)| MultichoiceOption {
                text: format!("item {i}"),
                expected_response,
            })
            .collect()
    }

    #[test]
    fn three_correct_is_high() {
        let weights: SuccessWeights =
            serde_json::from_str(r#"{"high": 0.9, "medium": 0.5, "low": 0.1}"#).unwrap();
        let out = score_multichoice(
            Some(&ranges()),
            &weights,
            &options(),
            &[true, false, true, false],
        );
        assert_eq!(out.correct, 3);
        assert_eq!(out.tier, Tier::High);
        assert_eq!(out.score, weights.high);
    }

    #[test]
    fn tier_boundaries() {
        let r = ranges();
        assert_eq!(tier_for_count(Some(&r), 0), Tier::Low);
        assert_eq!(tier_for_count(Some(&r), 2), Tier::Medium);
        assert_eq!(tier_for_count(Some(&r), 4), Tier::High);
        assert_eq!(tier_for_count(Some(&r), 9), Tier::Low);
        assert_eq!(tier_for_count(None, 4), Tier::Low);
    }

    #[test]
    fn missing_picks_are_not_correct() {
        assert_eq!(count_correct(&options(), &[true]), 1);
        assert_eq!(count_correct(&options(), &[]), 0);
    }
}
