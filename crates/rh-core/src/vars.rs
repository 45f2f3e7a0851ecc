use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::ids::InteractionId;
use crate::keys::{AttemptKind, SessionKey};
use crate::store::{SessionStore, StoreValue};

/// Typed accessors over a [`SessionStore`].
///
/// Only keys named by [`SessionKey`] are ever touched.
#[derive(Clone, Copy)]
pub struct SessionVars<'a> {
    store: &'a dyn SessionStore,
}

impl<'a> SessionVars<'a> {
    /// Wrap a store.
    pub fn new(store: &'a dyn SessionStore) -> Self {
        Self { store }
    }

    /// Raw read.
    pub fn get(&self, key: &SessionKey) -> Option<StoreValue> {
        self.store.get(&key.to_string())
    }

    /// Raw write.
    pub fn set(&self, key: &SessionKey, value: impl Into<StoreValue>) {
        self.store.set(&key.to_string(), value.into());
    }

    /// Numeric read.
    pub fn number(&self, key: &SessionKey) -> Option<f64> {
        self.get(key).and_then(|v| v.as_f64())
    }

    /// Text read; numbers and flags are rendered, blank text is `None`.
    pub fn text(&self, key: &SessionKey) -> Option<String> {
        self.get(key).filter(|v| !v.is_blank()).map(|v| v.to_string())
    }

    /// Read and parse a serialized payload.
    ///
    /// A malformed payload is logged and treated as absent.
    pub fn load_json<T: DeserializeOwned>(&self, key: &SessionKey) -> Option<T> {
        let raw = self.text(key)?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "malformed session payload ignored");
                None
            }
        }
    }

    /// Serialize and write a payload.
    pub fn store_json<T: Serialize + ?Sized>(&self, key: &SessionKey, value: &T) {
        match serde_json::to_string(value) {
            Ok(json) => self.set(key, json),
            Err(e) => tracing::warn!(key = %key, error = %e, "could not serialize session payload"),
        }
    }

    /// Interaction currently on screen.
    pub fn current_interaction(&self) -> Option<InteractionId> {
        self.get(&SessionKey::CurrentInteraction)
            .and_then(|v| v.as_i64())
            .and_then(|n| u32::try_from(n).ok())
            .map(InteractionId)
    }

    /// Record the interaction now on screen.
    pub fn set_current_interaction(&self, id: InteractionId) {
        self.set(&SessionKey::CurrentInteraction, id.0);
    }

    /// Value of an attempt counter (0 when unset).
    pub fn attempts(&self, kind: AttemptKind) -> u32 {
        self.number(&SessionKey::Attempts(kind))
            .filter(|n| *n > 0.0)
            .map(|n| n as u32)
            .unwrap_or(0)
    }

    /// Overwrite an attempt counter.
    pub fn set_attempts(&self, kind: AttemptKind, value: u32) {
        self.set(&SessionKey::Attempts(kind), value);
    }

    /// Most recently stored score (0 when unset).
    pub fn interaction_success(&self) -> f64 {
        self.number(&SessionKey::InteractionSuccess).unwrap_or(0.0)
    }

    /// Store a score both as the current score and under the interaction's own key.
    pub fn record_score(&self, id: InteractionId, score: f64) {
        self.set(&SessionKey::InteractionSuccess, score);
        self.set(&SessionKey::InteractionSuccessFor(id), score);
    }

    /// Last committed response of an interaction.
    pub fn last_response(&self, id: InteractionId) -> Option<i64> {
        self.get(&SessionKey::LastResponse(id)).and_then(|v| v.as_i64())
    }

    /// Commit an interaction's last response.
    pub fn set_last_response(&self, id: InteractionId, value: i64) {
        self.set(&SessionKey::LastResponse(id), value);
    }

    /// Visited interaction ids in first-visit order.
    pub fn visited(&self) -> Vec<InteractionId> {
        self.load_json(&SessionKey::Visited).unwrap_or_default()
    }

    /// Add an id to the visited set. Returns `false` if it was already there.
    pub fn mark_visited(&self, id: InteractionId) -> bool {
        let mut visited = self.visited();
        if visited.contains(&id) {
            return false;
        }
        visited.push(id);
        self.store_json(&SessionKey::Visited, &visited);
        true
    }

    /// Whether speech is playing.
    pub fn speech_playing(&self) -> bool {
        self.get(&SessionKey::SpeechPlaying)
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }

    /// Set the speech flag.
    pub fn set_speech_playing(&self, playing: bool) {
        self.set(&SessionKey::SpeechPlaying, playing);
    }

    /// The endpoint flag, if ever written.
    pub fn endpoint(&self) -> Option<bool> {
        self.get(&SessionKey::Endpoint).and_then(|v| v.as_bool())
    }

    /// Write the endpoint flag.
    pub fn set_endpoint(&self, jump: bool) {
        self.set(&SessionKey::Endpoint, jump);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn visited_only_grows() {
        let store = MemoryStore::new();
        let vars = SessionVars::new(&store);
        assert!(vars.mark_visited(InteractionId(3)));
        assert!(vars.mark_visited(InteractionId(1)));
        assert!(!vars.mark_visited(InteractionId(3)));
        assert_eq!(vars.visited(), vec![InteractionId(3), InteractionId(1)]);
    }

    #[test]
    fn malformed_visited_is_empty() {
        let store = MemoryStore::new();
        store.set("visitedInteractions", "[1,".into());
        let vars = SessionVars::new(&store);
        assert!(vars.visited().is_empty());
        assert!(vars.mark_visited(InteractionId(2)));
        assert_eq!(vars.visited(), vec![InteractionId(2)]);
    }

    #[test]
    fn host_strings_are_coerced() {
        let store = MemoryStore::new();
        store.set("currentInteractionId", "9".into());
        store.set("GoToEndPoint", "True".into());
        store.set("reordAttempts", "2".into());
        let vars = SessionVars::new(&store);
        assert_eq!(vars.current_interaction(), Some(InteractionId(9)));
        assert_eq!(vars.endpoint(), Some(true));
        assert_eq!(vars.attempts(AttemptKind::Reorder), 2);
        assert_eq!(vars.attempts(AttemptKind::Understanding), 0);
    }

    #[test]
    fn score_written_twice() {
        let store = MemoryStore::new();
        let vars = SessionVars::new(&store);
        vars.record_score(InteractionId(4), 0.75);
        assert_eq!(vars.interaction_success(), 0.75);
        assert_eq!(store.get("interactionSuccess_4"), Some(StoreValue::Number(0.75)));
    }
}
