//! Speech synthesis port, the speech-in-progress gate, and generation tickets
//! that invalidate work issued for an interaction the learner has left.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use rh_core::{InteractionId, SessionVars};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::error::SpeechError;

/// A request to speak a piece of text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeechRequest {
    /// Text to speak.
    pub text: String,
    /// Voice to speak it in.
    pub voice_id: String,
    /// Delivery tone, if the line specifies one.
    pub tone: Option<String>,
    /// Surrounding conversation, for synthesizers that use it for prosody.
    pub context: Option<String>,
}

impl SpeechRequest {
    /// A request with no tone or context.
    pub fn new(text: impl Into<String>, voice_id: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            voice_id: voice_id.into(),
            tone: None,
            context: None,
        }
    }

    /// Set the delivery tone.
    pub fn with_tone(mut self, tone: Option<String>) -> Self {
        self.tone = tone;
        self
    }

    /// Set the conversational context.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

/// Text-to-speech playback.
///
/// Both playback methods resolve when audio ends and fail on transport or
/// decoding errors.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize and play `request`.
    async fn speak(&self, request: SpeechRequest) -> Result<(), SpeechError>;

    /// Play pre-recorded audio.
    async fn play_recording(&self, url: &str) -> Result<(), SpeechError>;

    /// Stop whatever is playing.
    fn stop(&self);
}

/// Captures the generation an operation was issued under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    /// Interaction the operation belongs to.
    pub interaction: InteractionId,
    /// Generation at issue time.
    pub generation: u64,
}

/// Monotonic counter advanced on every interaction entry.
#[derive(Debug, Default)]
pub struct Generation {
    current: AtomicU64,
    interaction: AtomicU64,
}

impl Generation {
    /// Start a new generation for `interaction`.
    pub fn advance(&self, interaction: InteractionId) -> Ticket {
        self.interaction.store(u64::from(interaction.0), Ordering::SeqCst);
        let generation = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        Ticket {
            interaction,
            generation,
        }
    }

    /// Ticket for the current generation.
    pub fn ticket(&self) -> Ticket {
        let raw = self.interaction.load(Ordering::SeqCst);
        Ticket {
            interaction: InteractionId(u32::try_from(raw).unwrap_or(u32::MAX)),
            generation: self.current.load(Ordering::SeqCst),
        }
    }

    /// Whether no entry has happened since `ticket` was issued.
    pub fn is_live(&self, ticket: Ticket) -> bool {
        self.current.load(Ordering::SeqCst) == ticket.generation
    }
}

/// How a wait for silence ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wait {
    /// Speech finished.
    Silent,
    /// The learner moved on while waiting.
    Stale,
    /// Speech never finished within the timeout.
    TimedOut,
}

/// Wraps a synthesizer so at most one request plays at a time and the
/// session's speech flag tracks playback.
pub struct SpeechGate<T: ?Sized> {
    synth: Arc<T>,
    playback: AtomicU64,
}

impl<T: SpeechSynthesizer + ?Sized> SpeechGate<T> {
    /// Wrap a synthesizer.
    pub fn new(synth: Arc<T>) -> Self {
        Self {
            synth,
            playback: AtomicU64::new(0),
        }
    }

    /// Speak, stopping anything already playing.
    ///
    /// Returns `false` if the synthesizer failed; the failure is logged and
    /// otherwise treated as finished playback.
    pub async fn speak(&self, vars: SessionVars<'_>, request: SpeechRequest) -> bool {
        let id = self.begin(vars);
        let result = self.synth.speak(request).await;
        self.finish(vars, id, result)
    }

    /// Play a recording, stopping anything already playing.
    pub async fn play_recording(&self, vars: SessionVars<'_>, url: &str) -> bool {
        let id = self.begin(vars);
        let result = self.synth.play_recording(url).await;
        self.finish(vars, id, result)
    }

    /// Poll the speech flag until it clears, the ticket goes stale, or the
    /// timeout elapses. The first check happens one interval after the call.
    pub async fn wait_for_silence(
        &self,
        vars: SessionVars<'_>,
        generation: &Generation,
        ticket: Ticket,
        interval: Duration,
        timeout: Duration,
    ) -> Wait {
        let started = Instant::now();
        loop {
            tokio::time::sleep(interval).await;
            if !generation.is_live(ticket) {
                return Wait::Stale;
            }
            if !vars.speech_playing() {
                return Wait::Silent;
            }
            if started.elapsed() >= timeout {
                tracing::warn!(
                    interaction = %ticket.interaction,
                    timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                    "speech did not finish; committing anyway"
                );
                return Wait::TimedOut;
            }
        }
    }

    fn begin(&self, vars: SessionVars<'_>) -> u64 {
        if vars.speech_playing() {
            self.synth.stop();
        }
        vars.set_speech_playing(true);
        self.playback.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn finish(&self, vars: SessionVars<'_>, id: u64, result: Result<(), SpeechError>) -> bool {
        // A newer request owns the flag now.
        if self.playback.load(Ordering::SeqCst) == id {
            vars.set_speech_playing(false);
        }
        match result {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "speech failed; continuing");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rh_core::MemoryStore;

    #[tokio::test]
    async fn speech_flag_tracks_playback() {
        let store = MemoryStore::new();
        let vars = SessionVars::new(&store);
        let mut mock = MockSpeechSynthesizer::new();
        mock.expect_stop().never();
        mock.expect_speak().times(1).returning(|_| Ok(()));
        let gate = SpeechGate::new(Arc::new(mock));

        assert!(gate.speak(vars, SpeechRequest::new("hi", "npc")).await);
        assert!(!vars.speech_playing());
    }

    #[tokio::test]
    async fn playing_audio_is_stopped_first() {
        let store = MemoryStore::new();
        let vars = SessionVars::new(&store);
        vars.set_speech_playing(true);
        let mut mock = MockSpeechSynthesizer::new();
        mock.expect_stop().times(1).return_const(());
        mock.expect_play_recording().times(1).returning(|_| Ok(()));
        let gate = SpeechGate::new(Arc::new(mock));

        assert!(gate.play_recording(vars, "line.mp3").await);
        assert!(!vars.speech_playing());
    }

    #[tokio::test]
    async fn failure_still_clears_flag() {
        let store = MemoryStore::new();
        let vars = SessionVars::new(&store);
        let mut mock = MockSpeechSynthesizer::new();
        mock.expect_speak()
            .returning(|_| Err(SpeechError::Transport("offline".into())));
        let gate = SpeechGate::new(Arc::new(mock));

        assert!(!gate.speak(vars, SpeechRequest::new("hi", "npc")).await);
        assert!(!vars.speech_playing());
    }

    #[test]
    fn generation_invalidates_old_tickets() {
        let generation = Generation::default();
        let first = generation.advance(InteractionId(8));
        assert!(generation.is_live(first));
        assert_eq!(generation.ticket(), first);
        let second = generation.advance(InteractionId(9));
        assert!(!generation.is_live(first));
        assert!(generation.is_live(second));
        assert_eq!(second.interaction, InteractionId(9));
    }

    #[tokio::test]
    async fn wait_returns_when_silent() {
        let store = MemoryStore::new();
        let vars = SessionVars::new(&store);
        let gate = SpeechGate::new(Arc::new(MockSpeechSynthesizer::new()));
        let generation = Generation::default();
        let ticket = generation.advance(InteractionId(1));
        let wait = gate
            .wait_for_silence(vars, &generation, ticket, Duration::from_millis(1), Duration::from_secs(5))
            .await;
        assert_eq!(wait, Wait::Silent);
    }

    #[tokio::test]
    async fn wait_times_out_and_detects_stale() {
        let store = MemoryStore::new();
        let vars = SessionVars::new(&store);
        vars.set_speech_playing(true);
        let gate = SpeechGate::new(Arc::new(MockSpeechSynthesizer::new()));
        let generation = Generation::default();
        let ticket = generation.advance(InteractionId(1));

        let wait = gate
            .wait_for_silence(vars, &generation, ticket, Duration::from_millis(1), Duration::from_millis(5))
            .await;
        assert_eq!(wait, Wait::TimedOut);

        generation.advance(InteractionId(2));
        let wait = gate
            .wait_for_silence(vars, &generation, ticket, Duration::from_millis(1), Duration::from_secs(5))
            .await;
        assert_eq!(wait, Wait::Stale);
    }
}
