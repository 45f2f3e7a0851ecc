//! Configuration for an interaction engine.

use std::time::Duration;

use rh_core::InteractionId;
use serde::{Deserialize, Serialize};

/// Configuration for an interaction engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// RNG seed for reproducible option shuffling.
    pub seed: u64,
    /// How often a deferred commit checks whether speech has finished.
    pub poll_interval_ms: u64,
    /// Give up waiting for speech after this long and commit anyway.
    pub speech_timeout_ms: u64,
    /// Response function that asks the NPC to repeat itself.
    pub repeat_function: String,
    /// First interaction of a session; it never counts toward aggregates.
    pub first_interaction_id: InteractionId,
    /// Learner's display name.
    pub learner_name: String,
    /// Voice used when echoing the learner.
    pub learner_voice: String,
    /// When false no speech is requested and every commit is immediate.
    pub audio_enabled: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            poll_interval_ms: 50,
            speech_timeout_ms: 120_000,
            repeat_function: "ask_repeat".to_string(),
            first_interaction_id: InteractionId(1),
            learner_name: "Learner".to_string(),
            learner_voice: "learner".to_string(),
            audio_enabled: true,
        }
    }
}

impl EngineConfig {
    /// Set the RNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the speech polling interval (at least 1ms).
    pub fn with_poll_interval_ms(mut self, ms: u64) -> Self {
        self.poll_interval_ms = ms.max(1);
        self
    }

    /// Set the speech wait timeout.
    pub fn with_speech_timeout_ms(mut self, ms: u64) -> Self {
        self.speech_timeout_ms = ms;
        self
    }

    /// Set the learner's name.
    pub fn with_learner_name(mut self, name: impl Into<String>) -> Self {
        self.learner_name = name.into();
        self
    }

    /// Set the learner's voice id.
    pub fn with_learner_voice(mut self, voice: impl Into<String>) -> Self {
        self.learner_voice = voice.into();
        self
    }

    /// Enable or disable speech.
    pub fn with_audio(mut self, enabled: bool) -> Self {
        self.audio_enabled = enabled;
        self
    }

    /// Set the first interaction id.
    pub fn with_first_interaction(mut self, id: InteractionId) -> Self {
        self.first_interaction_id = id;
        self
    }

    /// Polling interval as a duration.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    /// Speech timeout as a duration.
    pub fn speech_timeout(&self) -> Duration {
        Duration::from_millis(self.speech_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.seed, 42);
        assert_eq!(cfg.poll_interval(), Duration::from_millis(50));
        assert_eq!(cfg.repeat_function, "ask_repeat");
        assert!(cfg.audio_enabled);
    }

    #[test]
    fn builder_methods() {
        let cfg = EngineConfig::default()
            .with_seed(7)
            .with_learner_name("Sam")
            .with_audio(false);
        assert_eq!(cfg.seed, 7);
        assert_eq!(cfg.learner_name, "Sam");
        assert!(!cfg.audio_enabled);
    }

    #[test]
    fn poll_interval_clamped() {
        let cfg = EngineConfig::default().with_poll_interval_ms(0);
        assert_eq!(cfg.poll_interval_ms, 1);
    }

    #[test]
    fn partial_json_uses_defaults() {
        let cfg: EngineConfig = serde_json::from_str(r#"{"learner_name":"Kai"}"#).unwrap();
        assert_eq!(cfg.learner_name, "Kai");
        assert_eq!(cfg.seed, 42);
    }
}
