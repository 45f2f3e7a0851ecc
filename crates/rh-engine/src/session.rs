//! The interaction engine: drives one learner session through a catalog.
//!
//! Every operation reads and writes session state through the store, so a
//! host that also watches the store sees the same keys the engine uses.

use std::sync::{Arc, Mutex, PoisonError};

use rand::SeedableRng;
use rand::rngs::StdRng;
use rh_core::{
    AttemptKind, Attribute, Catalog, Interaction, InteractionId, InteractionKind,
    ResponseCandidate, RuleSet, SessionKey, SessionStore, SessionVars, Tier, YesNo,
};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::aggregate::{AggregateTracker, Standing};
use crate::config::EngineConfig;
use crate::dialogue::{self, RecordedPick, ResolvedLine};
use crate::error::{EngineError, EngineResult};
use crate::hint;
use crate::machine::Stage;
use crate::navigation::{NavigationCall, Navigator, Outcome};
use crate::presentation::{self, Options, Presentation};
use crate::scoring::{self, Response, ScoreContext};
use crate::selector;
use crate::speech::{Generation, SpeechGate, SpeechRequest, SpeechSynthesizer, Ticket, Wait};

/// Result of a learner submission.
#[derive(Debug, Clone, PartialEq)]
pub enum Submitted {
    /// The learner asked to hear the prompt again. Nothing was scored.
    Repeated,
    /// A non-terminal stage was scored.
    Advanced {
        /// Stage the interaction is now in.
        stage: Stage,
        /// Score recorded for the submission.
        score: f64,
        /// New presentation when the stage changed.
        presentation: Option<Presentation>,
    },
    /// The interaction's terminal stage was scored and navigation ran.
    Completed(Completion),
}

/// Summary of a completed interaction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Completion {
    /// Completed interaction.
    pub interaction: InteractionId,
    /// Final score.
    pub score: f64,
    /// Tier reached, for reorder and multichoice.
    pub tier: Option<Tier>,
    /// Correct rows, for multichoice.
    pub correct: Option<u32>,
    /// Whether the learner may try a reorder again.
    pub retry: bool,
    /// Whether a navigation rule fired.
    pub fired: bool,
    /// Averages after this score.
    pub standing: Standing,
}

/// One step of a dialogue.
#[derive(Debug, Clone, PartialEq)]
pub enum DialogueStep {
    /// A line was played and more follow.
    Spoke(ResolvedLine),
    /// The last line was played and navigation ran.
    Finished {
        /// The final line; `None` for a dialogue with no lines.
        line: Option<ResolvedLine>,
        /// Whether a dialogue rule fired.
        fired: bool,
    },
    /// The learner moved on while the line played.
    Stale(ResolvedLine),
}

/// Everything a dialogue played in one run.
#[derive(Debug, Clone, PartialEq)]
pub struct DialogueRun {
    /// Lines in playback order.
    pub lines: Vec<ResolvedLine>,
    /// Whether the last line was reached.
    pub finished: bool,
    /// Whether a dialogue rule fired.
    pub fired: bool,
}

/// Drives a session: entering interactions, scoring submissions, speaking
/// lines and applying navigation rules.
pub struct InteractionEngine<S, T: ?Sized> {
    catalog: Arc<Catalog>,
    store: Arc<S>,
    speech: SpeechGate<T>,
    navigator: Navigator,
    aggregates: AggregateTracker,
    generation: Generation,
    rng: Mutex<StdRng>,
    config: EngineConfig,
}

impl<S: SessionStore, T: SpeechSynthesizer + ?Sized> InteractionEngine<S, T> {
    /// Create an engine over a validated catalog and rule set.
    pub fn new(
        catalog: Arc<Catalog>,
        rules: RuleSet,
        store: Arc<S>,
        synth: Arc<T>,
        config: EngineConfig,
    ) -> Self {
        Self {
            navigator: Navigator::new(rules, config.repeat_function.clone()),
            aggregates: AggregateTracker::new(config.first_interaction_id),
            rng: Mutex::new(StdRng::seed_from_u64(config.seed)),
            speech: SpeechGate::new(synth),
            generation: Generation::default(),
            catalog,
            store,
            config,
        }
    }

    /// The catalog.
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// The session store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Engine settings.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The navigation rules.
    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    fn vars(&self) -> SessionVars<'_> {
        SessionVars::new(self.store.as_ref())
    }

    /// Seed aggregate keys and clear the speech flag.
    pub fn start(&self) {
        let vars = self.vars();
        self.aggregates.initialize(&vars, self.catalog.characters());
        vars.set_speech_playing(false);
        info!(interactions = self.catalog.len(), "session started");
    }

    /// Enter interaction `id`: reset its counters, pick the NPC text and
    /// present the entry stage.
    pub fn enter(&self, id: InteractionId) -> EngineResult<Presentation> {
        let interaction = self.catalog.get(id)?;
        self.generation.advance(id);

        let vars = self.vars();
        vars.set_current_interaction(id);
        vars.set(&SessionKey::InteractionType, interaction.kind.as_str());
        for kind in AttemptKind::ALL {
            vars.set_attempts(kind, 0);
        }

        if interaction.kind == InteractionKind::Dialogue {
            vars.set(&SessionKey::DialogueTurn, 0u32);
        } else {
            vars.set(&SessionKey::InteractionSuccess, 0.0);
            if interaction.kind == InteractionKind::Reorder {
                vars.set(&SessionKey::ReorderResponse(id), "");
            }
            let npc_text = npc_text(interaction, &vars);
            vars.set(&SessionKey::NpcText, npc_text.as_str());
            vars.set(&SessionKey::NpcTextFor(id), npc_text);
            vars.set(&SessionKey::NpcName, interaction.npc.character_name.as_str());
        }

        info!(interaction = %id, kind = %interaction.kind, "entered interaction");
        Ok(self.present(interaction, Stage::entry(interaction.kind), &vars))
    }

    /// The current interaction and its stage.
    pub fn current(&self) -> EngineResult<(&Interaction, Stage)> {
        let vars = self.vars();
        let id = vars.current_interaction().ok_or(EngineError::NotEntered)?;
        let interaction = self.catalog.get(id)?;
        let stage = vars
            .text(&SessionKey::Stage)
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(|| Stage::entry(interaction.kind));
        Ok((interaction, stage))
    }

    /// Pick presented option `index`.
    pub async fn choose(&self, index: usize) -> EngineResult<Submitted> {
        let presented = match self.vars().load_json::<Options>(&SessionKey::PresentedOptions) {
            Some(Options::Candidates(items)) => items,
            _ => Vec::new(),
        };
        let candidate = presented
            .get(index)
            .cloned()
            .ok_or(EngineError::OptionOutOfRange {
                index,
                available: presented.len(),
            })?;
        self.submit_response(candidate).await
    }

    /// Submit a response from its JSON payload. A malformed payload is
    /// treated as a response with no labels.
    pub async fn submit_payload(&self, payload: &str) -> EngineResult<Submitted> {
        let candidate = serde_json::from_str(payload).unwrap_or_else(|e| {
            warn!(error = %e, "malformed response payload; treating as empty");
            ResponseCandidate::default()
        });
        self.submit_response(candidate).await
    }

    /// Submit a labeled response to a one-step, two-step or end-point interaction.
    pub async fn submit_response(&self, candidate: ResponseCandidate) -> EngineResult<Submitted> {
        let (interaction, stage) = self.current()?;
        expect_kind(
            interaction,
            &[
                InteractionKind::OneStep,
                InteractionKind::TwoStep,
                InteractionKind::EndPoint,
            ],
            "submit a response",
        )?;
        if stage == Stage::Done {
            return Err(wrong_stage(interaction, stage, "submit a response"));
        }

        if candidate.function.as_deref() == Some(self.config.repeat_function.as_str()) {
            self.repeat(interaction, &candidate).await;
            return Ok(Submitted::Repeated);
        }

        match stage {
            Stage::Understanding if interaction.kind == InteractionKind::TwoStep => {
                self.understand(interaction, candidate).await
            }
            Stage::Response => self.complete_response(interaction, candidate).await,
            _ => Err(wrong_stage(interaction, stage, "submit a response")),
        }
    }

    /// Submit a reorder sentence.
    pub async fn submit_reorder(&self, sentence: &str) -> EngineResult<Submitted> {
        let (interaction, stage) = self.current()?;
        expect_kind(interaction, &[InteractionKind::Reorder], "submit a sentence")?;
        if stage != Stage::Reorder {
            return Err(wrong_stage(interaction, stage, "submit a sentence"));
        }

        let vars = self.vars();
        let ticket = self.generation.ticket();
        let id = interaction.id;
        vars.set(&SessionKey::ReorderResponse(id), sentence);

        let content = selector::resolve(interaction, &vars);
        let weights = &interaction.success_weights;
        let attempts = vars.attempts(AttemptKind::Reorder);
        let outcome = scoring::score_reorder(
            content.expectations.and_then(|e| e.phrases()),
            weights,
            sentence,
            attempts,
        );
        vars.record_score(id, outcome.score);
        // Reorder stays open for a retry and is left out of the running averages.
        let standing = self
            .aggregates
            .standing(&vars, Some(&interaction.npc.character_id));

        let threshold = if weights.high > 0.0 { weights.high } else { 1.0 };
        let below = outcome.score < threshold;
        if below {
            vars.set_attempts(AttemptKind::Reorder, attempts + 1);
        }
        info!(interaction = %id, tier = ?outcome.tier, score = outcome.score, attempts, "reorder scored");

        let call = NavigationCall {
            interaction: id,
            kind: interaction.kind,
            stage,
            outcome: Some(Outcome::Score(outcome.score)),
            function: None,
        };
        let echo = (outcome.score > 0.0).then_some(sentence);
        let fired = self
            .settle(ticket, &call, outcome.tier.map(Tier::response_id), echo)
            .await;

        Ok(Submitted::Completed(Completion {
            interaction: id,
            score: outcome.score,
            tier: outcome.tier,
            correct: None,
            retry: below && attempts == 0,
            fired,
            standing,
        }))
    }

    /// Submit presented reorder segments in the learner's order.
    pub async fn submit_reorder_segments(&self, order: &[usize]) -> EngineResult<Submitted> {
        let (interaction, _) = self.current()?;
        expect_kind(interaction, &[InteractionKind::Reorder], "submit a sentence")?;
        let segments = match self.vars().load_json::<Options>(&SessionKey::PresentedOptions) {
            Some(Options::Segments(items)) => items,
            _ => Vec::new(),
        };

        let mut sentence = String::new();
        for &index in order {
            let segment = segments.get(index).ok_or(EngineError::OptionOutOfRange {
                index,
                available: segments.len(),
            })?;
            sentence.push_str(segment);
        }
        self.submit_reorder(&sentence).await
    }

    /// Submit yes/no picks for the presented multichoice rows, in display order.
    pub async fn submit_multichoice(&self, picks: &[bool]) -> EngineResult<Submitted> {
        let (interaction, stage) = self.current()?;
        expect_kind(interaction, &[InteractionKind::Multichoice], "submit picks")?;
        if stage != Stage::Multichoice {
            return Err(wrong_stage(interaction, stage, "submit picks"));
        }

        let vars = self.vars();
        let ticket = self.generation.ticket();
        let id = interaction.id;
        let content = selector::resolve(interaction, &vars);
        let rows = match vars.load_json::<Options>(&SessionKey::PresentedOptions) {
            Some(Options::Grid { rows, .. }) => rows,
            _ => content.multichoice_options.to_vec(),
        };
        if picks.len() > rows.len() {
            return Err(EngineError::OptionOutOfRange {
                index: picks.len() - 1,
                available: rows.len(),
            });
        }

        let outcome = scoring::score_multichoice(
            content.expectations.and_then(|e| e.ranges()),
            &interaction.success_weights,
            &rows,
            picks,
        );
        let recorded: Vec<RecordedPick> = rows
            .iter()
            .zip(picks)
            .map(|(row, pick)| RecordedPick {
                option: row.text.clone(),
                selection: YesNo::from_bool(*pick),
            })
            .collect();
        vars.store_json(&SessionKey::MultichoiceResponse(id), &recorded);
        vars.set(&SessionKey::MultichoiceCorrectCount, outcome.correct);
        vars.record_score(id, outcome.score);
        vars.set(&SessionKey::Stage, Stage::Done.to_string());
        let standing = self.record_aggregate(interaction, outcome.score);
        info!(interaction = %id, correct = outcome.correct, tier = %outcome.tier, "multichoice scored");

        let call = NavigationCall {
            interaction: id,
            kind: interaction.kind,
            stage,
            outcome: Some(Outcome::Level(outcome.tier)),
            function: None,
        };
        let last = content
            .selector
            .unwrap_or_else(|| outcome.tier.response_id());
        let fired = self.settle(ticket, &call, Some(last), None).await;

        Ok(Submitted::Completed(Completion {
            interaction: id,
            score: outcome.score,
            tier: Some(outcome.tier),
            correct: Some(outcome.correct),
            retry: false,
            fired,
            standing,
        }))
    }

    /// Play the next dialogue line. After the last line the dialogue is
    /// recorded as visited, its rules run and it accepts no further lines.
    pub async fn advance_dialogue(&self) -> EngineResult<DialogueStep> {
        let (interaction, stage) = self.current()?;
        expect_kind(interaction, &[InteractionKind::Dialogue], "play a line")?;
        if stage == Stage::Done {
            return Err(wrong_stage(interaction, stage, "play a line"));
        }

        let vars = self.vars();
        let ticket = self.generation.ticket();
        let count = interaction.line_count();
        if count == 0 {
            let fired = self.finish_dialogue(interaction, Stage::Line(0), &vars);
            return Ok(DialogueStep::Finished { line: None, fired });
        }

        let turn = vars
            .number(&SessionKey::DialogueTurn)
            .map(|n| n.max(0.0) as u32)
            .unwrap_or(0)
            .min(count - 1);
        let line = dialogue::resolve_line(
            &self.catalog,
            interaction,
            turn,
            &vars,
            &self.config.learner_name,
        )?;

        vars.set(&SessionKey::Stage, Stage::Line(turn).to_string());
        vars.set(&SessionKey::DialogueLineText, line.text.as_str());
        vars.set(&SessionKey::NpcText, line.text.as_str());
        vars.set(&SessionKey::NpcName, line.speaker_name.as_str());
        debug!(interaction = %interaction.id, turn, learner = line.learner, "dialogue line");

        self.voice_line(interaction, &line, vars).await;
        if !self.generation.is_live(ticket) {
            debug!(interaction = %interaction.id, turn, "dialogue abandoned");
            return Ok(DialogueStep::Stale(line));
        }

        if turn + 1 < count {
            vars.set(&SessionKey::DialogueTurn, turn + 1);
            vars.set(&SessionKey::Stage, Stage::Line(turn + 1).to_string());
            return Ok(DialogueStep::Spoke(line));
        }

        let fired = self.finish_dialogue(interaction, Stage::Line(turn), &vars);
        Ok(DialogueStep::Finished {
            line: Some(line),
            fired,
        })
    }

    /// Play the current dialogue to its end.
    pub async fn run_dialogue(&self) -> EngineResult<DialogueRun> {
        let mut lines = Vec::new();
        loop {
            match self.advance_dialogue().await? {
                DialogueStep::Spoke(line) => lines.push(line),
                DialogueStep::Finished { line, fired } => {
                    lines.extend(line);
                    return Ok(DialogueRun {
                        lines,
                        finished: true,
                        fired,
                    });
                }
                DialogueStep::Stale(line) => {
                    lines.push(line);
                    return Ok(DialogueRun {
                        lines,
                        finished: false,
                        fired: false,
                    });
                }
            }
        }
    }

    /// Build and store the hint for the current stage.
    pub fn hint(&self) -> EngineResult<Option<String>> {
        let (interaction, stage) = self.current()?;
        let vars = self.vars();
        let content = selector::resolve(interaction, &vars);
        let hint = hint::build_hint(interaction, stage, &content, self.catalog.descriptions());
        if let Some(text) = &hint {
            vars.set(&SessionKey::Hint, text.as_str());
        }
        Ok(hint)
    }

    /// Speak the current NPC prompt. Returns whether anything played.
    pub async fn play_prompt(&self) -> EngineResult<bool> {
        let (interaction, _) = self.current()?;
        if !self.config.audio_enabled {
            return Ok(false);
        }
        Ok(self.speak_prompt(interaction).await)
    }

    /// Current averages, including the current interaction's character.
    pub fn standing(&self) -> Standing {
        let vars = self.vars();
        let character = self
            .current()
            .ok()
            .map(|(interaction, _)| &interaction.npc.character_id);
        self.aggregates.standing(&vars, character)
    }

    /// The endpoint flag written by the last navigation.
    pub fn endpoint(&self) -> Option<bool> {
        self.vars().endpoint()
    }

    fn present(&self, interaction: &Interaction, stage: Stage, vars: &SessionVars<'_>) -> Presentation {
        let content = selector::resolve(interaction, vars);
        let segments: Vec<String> = interaction
            .reord_segments
            .iter()
            .map(|s| s.text.clone())
            .collect();
        let options = {
            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            presentation::arrange(
                interaction.kind,
                stage,
                &content,
                &segments,
                interaction.line_count(),
                &interaction.npc.character_name,
                &mut *rng,
            )
        };

        vars.set(&SessionKey::Stage, stage.to_string());
        vars.store_json(&SessionKey::PresentedOptions, &options);
        if let Options::Grid {
            headers: Some(headers),
            ..
        } = &options
        {
            vars.set(&SessionKey::ColumnHeader(1), headers.text_1.as_str());
            vars.set(&SessionKey::ColumnHeader(2), headers.text_2.as_str());
        }
        let hint = hint::build_hint(interaction, stage, &content, self.catalog.descriptions());
        if let Some(text) = &hint {
            vars.set(&SessionKey::Hint, text.as_str());
        }

        Presentation {
            interaction: interaction.id,
            kind: interaction.kind,
            stage,
            npc_name: interaction.npc.character_name.clone(),
            npc_text: vars.text(&SessionKey::NpcText).unwrap_or_default(),
            options,
            hint,
        }
    }

    async fn understand(
        &self,
        interaction: &Interaction,
        candidate: ResponseCandidate,
    ) -> EngineResult<Submitted> {
        let vars = self.vars();
        let content = selector::resolve(interaction, &vars);
        let attempts = vars.attempts(AttemptKind::Understanding);
        let score = scoring::score(
            interaction.kind,
            Stage::Understanding,
            &content,
            &interaction.success_weights,
            Response::Candidate(&candidate),
            ScoreContext { attempts, prior: 0.0 },
        );
        vars.record_score(interaction.id, score);

        let understood = content
            .expectations
            .and_then(|e| e.attributes())
            .and_then(|a| a.accepts(Attribute::Function, candidate.function.as_deref()))
            .unwrap_or(true);
        let stage = Stage::after_understanding(understood);
        let presentation = if understood {
            Some(self.present(interaction, stage, &vars))
        } else {
            vars.set_attempts(AttemptKind::Understanding, attempts + 1);
            None
        };
        info!(interaction = %interaction.id, understood, score, attempts, "understanding scored");

        if candidate.echoes() && self.config.audio_enabled {
            let request = SpeechRequest::new(candidate.text, self.config.learner_voice.as_str());
            self.speech.speak(vars, request).await;
        }
        Ok(Submitted::Advanced {
            stage,
            score,
            presentation,
        })
    }

    async fn complete_response(
        &self,
        interaction: &Interaction,
        candidate: ResponseCandidate,
    ) -> EngineResult<Submitted> {
        let vars = self.vars();
        let ticket = self.generation.ticket();
        let id = interaction.id;
        let content = selector::resolve(interaction, &vars);
        let prior = if interaction.kind == InteractionKind::TwoStep {
            vars.interaction_success()
        } else {
            0.0
        };
        let score = scoring::score(
            interaction.kind,
            Stage::Response,
            &content,
            &interaction.success_weights,
            Response::Candidate(&candidate),
            ScoreContext {
                attempts: vars.attempts(AttemptKind::Response),
                prior,
            },
        );
        vars.record_score(id, score);
        vars.set(&SessionKey::Stage, Stage::Done.to_string());
        let standing = self.record_aggregate(interaction, score);

        let payload_key = if interaction.kind == InteractionKind::EndPoint {
            SessionKey::EndPointResponse(id)
        } else {
            SessionKey::ChoiceResponse(id)
        };
        vars.store_json(&payload_key, &candidate);
        info!(interaction = %id, response = ?candidate.id, score, "response scored");

        let call = NavigationCall {
            interaction: id,
            kind: interaction.kind,
            stage: Stage::Response,
            outcome: candidate.id.map(Outcome::Response),
            function: candidate.function.as_deref(),
        };
        let echo = candidate.echoes().then_some(candidate.text.as_str());
        let fired = self.settle(ticket, &call, candidate.id, echo).await;

        Ok(Submitted::Completed(Completion {
            interaction: id,
            score,
            tier: None,
            correct: None,
            retry: false,
            fired,
            standing,
        }))
    }

    /// Record the learner's response and run navigation.
    ///
    /// With an echo, the response is recorded only after the echo finishes
    /// and navigation commits only after the speech flag clears. Either step
    /// is dropped if the learner has entered another interaction meanwhile.
    async fn settle(
        &self,
        ticket: Ticket,
        call: &NavigationCall<'_>,
        last_response: Option<i64>,
        echo: Option<&str>,
    ) -> bool {
        let vars = self.vars();
        let decision = self.navigator.decide(&vars, call);
        let record = || {
            if let Some(value) = last_response {
                vars.set_last_response(call.interaction, value);
            }
            if vars.mark_visited(call.interaction) {
                debug!(interaction = %call.interaction, "first visit recorded");
            }
        };

        let Some(text) = echo.filter(|_| self.config.audio_enabled) else {
            record();
            return self.navigator.commit(&vars, call.interaction, &decision);
        };

        let request = SpeechRequest::new(text, self.config.learner_voice.as_str());
        let spoken = async {
            self.speech.speak(vars, request).await;
            if self.generation.is_live(ticket) {
                record();
            } else {
                debug!(interaction = %call.interaction, "left before the echo finished; response not recorded");
            }
        };
        let navigated = async {
            let wait = self
                .speech
                .wait_for_silence(
                    vars,
                    &self.generation,
                    ticket,
                    self.config.poll_interval(),
                    self.config.speech_timeout(),
                )
                .await;
            match wait {
                Wait::Stale => {
                    debug!(interaction = %call.interaction, "navigation dropped for a stale interaction");
                    false
                }
                Wait::Silent | Wait::TimedOut => {
                    self.navigator.commit(&vars, call.interaction, &decision)
                }
            }
        };

        let ((), fired) = tokio::join!(spoken, navigated);
        fired
    }

    fn finish_dialogue(&self, interaction: &Interaction, stage: Stage, vars: &SessionVars<'_>) -> bool {
        vars.set(&SessionKey::Stage, Stage::Done.to_string());
        vars.set_last_response(interaction.id, 0);
        vars.mark_visited(interaction.id);
        info!(interaction = %interaction.id, "dialogue finished");
        let call = NavigationCall {
            interaction: interaction.id,
            kind: interaction.kind,
            stage,
            outcome: Some(Outcome::Completed),
            function: None,
        };
        self.navigator.apply(vars, &call)
    }

    fn record_aggregate(&self, interaction: &Interaction, score: f64) -> Standing {
        self.aggregates
            .record(&self.vars(), interaction.id, &interaction.npc.character_id, score)
    }

    async fn repeat(&self, interaction: &Interaction, candidate: &ResponseCandidate) {
        info!(interaction = %interaction.id, "repeat requested");
        if !self.config.audio_enabled {
            return;
        }
        if candidate.echoes() {
            let request =
                SpeechRequest::new(candidate.text.as_str(), self.config.learner_voice.as_str());
            self.speech.speak(self.vars(), request).await;
        }
        self.speak_prompt(interaction).await;
    }

    async fn speak_prompt(&self, interaction: &Interaction) -> bool {
        let vars = self.vars();
        let text = vars
            .text(&SessionKey::NpcTextFor(interaction.id))
            .unwrap_or_else(|| interaction.npc.text.clone());
        if text.is_empty() {
            return false;
        }
        let request = SpeechRequest::new(text, interaction.npc.character_id.as_str());
        self.speech.speak(vars, request).await
    }

    async fn voice_line(&self, interaction: &Interaction, line: &ResolvedLine, vars: SessionVars<'_>) {
        if !self.config.audio_enabled {
            return;
        }
        if let Some(url) = &line.recording {
            self.speech.play_recording(vars, url).await;
            return;
        }
        let request = if line.learner {
            SpeechRequest::new(line.text.as_str(), self.config.learner_voice.as_str())
        } else {
            let voice = line.speaker.as_ref().unwrap_or(&interaction.npc.character_id);
            SpeechRequest::new(line.text.as_str(), voice.as_str())
                .with_context(dialogue::speech_context(interaction, line))
        };
        self.speech.speak(vars, request.with_tone(line.tone.clone())).await;
    }
}

/// NPC text for entering `interaction`: feedback on the learner's previous
/// response followed by the new prompt, or the default text.
fn npc_text(interaction: &Interaction, vars: &SessionVars<'_>) -> String {
    let npc = &interaction.npc;
    let source = npc.feedback_from.or_else(|| interaction.id.previous());
    let feedback = source.and_then(|s| vars.last_response(s)).and_then(|response| {
        npc.feedback.iter().find(|f| f.id == Some(response)).or_else(|| {
            usize::try_from(response)
                .ok()
                .and_then(|i| npc.feedback.get(i))
                .filter(|f| f.id.is_none())
        })
    });

    match (feedback, &npc.new_prompt) {
        (Some(f), Some(prompt)) if !prompt.text.is_empty() => format!("{}\n{}", f.text, prompt.text),
        (Some(f), _) => f.text.clone(),
        (None, _) => npc.text.clone(),
    }
}

fn expect_kind(
    interaction: &Interaction,
    kinds: &[InteractionKind],
    action: &'static str,
) -> EngineResult<()> {
    if kinds.contains(&interaction.kind) {
        Ok(())
    } else {
        Err(EngineError::WrongKind {
            interaction: interaction.id,
            kind: interaction.kind,
            action,
        })
    }
}

fn wrong_stage(interaction: &Interaction, stage: Stage, action: &'static str) -> EngineError {
    EngineError::WrongStage {
        interaction: interaction.id,
        stage,
        action,
    }
}
