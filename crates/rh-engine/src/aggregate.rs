//! Running per-character and overall success averages.

use rh_core::{CharacterId, InteractionId, SessionKey, SessionVars};
use serde::Serialize;

/// Current averages after a scored submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Standing {
    /// Overall running average.
    pub overall: f64,
    /// Running average with the interaction's character.
    pub character: Option<(CharacterId, f64)>,
}

/// Maintains `total / count` averages in the session store.
///
/// Counts start at 1 and the first interaction of a session does not
/// increment them, so its score alone forms the first average.
#[derive(Debug, Clone, Copy)]
pub struct AggregateTracker {
    first_interaction: InteractionId,
}

impl AggregateTracker {
    /// Create a tracker; `first_interaction` never increments counts.
    pub fn new(first_interaction: InteractionId) -> Self {
        Self { first_interaction }
    }

    /// Seed the aggregate keys without disturbing non-zero values.
    pub fn initialize<'c>(
        &self,
        vars: &SessionVars<'_>,
        characters: impl IntoIterator<Item = &'c CharacterId>,
    ) {
        seed(vars, &SessionKey::OverallCount, 1.0);
        seed(vars, &SessionKey::OverallTotal, 0.0);
        seed(vars, &SessionKey::OverallAverage, 0.0);
        seed(vars, &SessionKey::InteractionSuccess, 0.0);
        for character in characters {
            seed(vars, &SessionKey::CharacterCount(character.clone()), 1.0);
            seed(vars, &SessionKey::CharacterTotal(character.clone()), 0.0);
            seed(vars, &SessionKey::CharacterAverage(character.clone()), 0.0);
        }
    }

    /// Fold a terminal-stage score into the overall and per-character averages.
    pub fn record(
        &self,
        vars: &SessionVars<'_>,
        interaction: InteractionId,
        character: &CharacterId,
        score: f64,
    ) -> Standing {
        let step = if interaction == self.first_interaction { 0.0 } else { 1.0 };

        let overall = accumulate(
            vars,
            &SessionKey::OverallTotal,
            &SessionKey::OverallCount,
            &SessionKey::OverallAverage,
            score,
            step,
        );

        let per_character = (!character.as_str().is_empty()).then(|| {
            let average = accumulate(
                vars,
                &SessionKey::CharacterTotal(character.clone()),
                &SessionKey::CharacterCount(character.clone()),
                &SessionKey::CharacterAverage(character.clone()),
                score,
                step,
            );
            (character.clone(), average)
        });

        tracing::debug!(interaction = %interaction, score, overall, "aggregates updated");
        Standing {
            overall,
            character: per_character,
        }
    }

    /// Read the current averages without changing them.
    pub fn standing(&self, vars: &SessionVars<'_>, character: Option<&CharacterId>) -> Standing {
        Standing {
            overall: vars.number(&SessionKey::OverallAverage).unwrap_or(0.0),
            character: character.filter(|c| !c.as_str().is_empty()).map(|c| {
                let avg = vars
                    .number(&SessionKey::CharacterAverage(c.clone()))
                    .unwrap_or(0.0);
                (c.clone(), avg)
            }),
        }
    }
}

fn seed(vars: &SessionVars<'_>, key: &SessionKey, value: f64) {
    let current = vars.number(key).unwrap_or(0.0);
    if current == 0.0 {
        vars.set(key, value);
    }
}

fn accumulate(
    vars: &SessionVars<'_>,
    total_key: &SessionKey,
    count_key: &SessionKey,
    average_key: &SessionKey,
    score: f64,
    step: f64,
) -> f64 {
    let total = vars.number(total_key).unwrap_or(0.0) + score;
    let count = vars.number(count_key).filter(|c| *c >= 1.0).unwrap_or(1.0) + step;
    let average = (total / count).min(1.0);
    vars.set(total_key, total);
    vars.set(count_key, count);
    vars.set(average_key, average);
    average
}

#[cfg(test)]
mod tests {
    use super::*;
    use rh_core::{MemoryStore, SessionStore, StoreValue};

    #[test]
    fn first_interaction_does_not_count() {
        let store = MemoryStore::new();
        let vars = SessionVars::new(&store);
        let tracker = AggregateTracker::new(InteractionId(1));
        let ana = CharacterId::new("2");

        let s = tracker.record(&vars, InteractionId(1), &ana, 0.8);
        assert_eq!(s.overall, 0.8);
        assert_eq!(store.get("totalInteractionCount"), Some(StoreValue::Number(1.0)));

        let s = tracker.record(&vars, InteractionId(2), &ana, 0.4);
        assert!((s.overall - 0.6).abs() < 1e-9);
        assert_eq!(store.get("characterInteractionCount_2"), Some(StoreValue::Number(2.0)));
        assert_eq!(s.character.map(|(c, _)| c), Some(ana));
    }

    #[test]
    fn averages_capped_at_one() {
        let store = MemoryStore::new();
        let vars = SessionVars::new(&store);
        let tracker = AggregateTracker::new(InteractionId(1));
        let ana = CharacterId::new("2");
        // Repeated perfect scores on the first interaction grow the total without the count.
        for _ in 0..5 {
            let s = tracker.record(&vars, InteractionId(1), &ana, 1.0);
            assert!(s.overall <= 1.0);
        }
        for id in 2..20 {
            let s = tracker.record(&vars, InteractionId(id), &ana, 1.0);
            assert!(s.overall <= 1.0);
            assert!(s.character.unwrap().1 <= 1.0);
        }
    }

    #[test]
    fn initialize_keeps_existing_values() {
        let store = MemoryStore::new();
        store.set("overallSuccess_total", StoreValue::Number(2.5));
        let vars = SessionVars::new(&store);
        let tracker = AggregateTracker::new(InteractionId(1));
        let ana = CharacterId::new("2");
        tracker.initialize(&vars, [&ana]);

        assert_eq!(store.get("overallSuccess_total"), Some(StoreValue::Number(2.5)));
        assert_eq!(store.get("totalInteractionCount"), Some(StoreValue::Number(1.0)));
        assert_eq!(store.get("characterInteractionCount_2"), Some(StoreValue::Number(1.0)));
        assert_eq!(store.get("withCharacterSuccess_2"), Some(StoreValue::Number(0.0)));
    }

    #[test]
    fn unnamed_character_skipped() {
        let store = MemoryStore::new();
        let vars = SessionVars::new(&store);
        let tracker = AggregateTracker::new(InteractionId(1));
        let s = tracker.record(&vars, InteractionId(3), &CharacterId::default(), 0.5);
        assert!(s.character.is_none());
        assert_eq!(store.len(), 3);
    }
}
