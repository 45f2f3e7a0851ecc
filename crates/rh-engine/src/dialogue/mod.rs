//! Dialogue line resolution: dynamic variants, constructed feedback lines,
//! learner-spoken lines and pre-recorded audio.

mod feedback;
mod variant;

pub use feedback::{construct, fill_placeholders, format_item_list};
pub use variant::{RecordedPick, VariantChoice, select_variant};

use rh_core::{
    Catalog, CatalogError, CharacterId, DialogueLine, FeedbackConstruction, Interaction,
    InteractionId, SelectionType, SessionKey, SessionVars, Utterance, Variant, YesNo,
};
use serde::Serialize;

use crate::error::EngineResult;
use crate::selector;

/// A dialogue line ready to be shown and spoken.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedLine {
    /// Line index.
    pub turn: u32,
    /// Final text with placeholders filled.
    pub text: String,
    /// Speaker id, if known.
    pub speaker: Option<CharacterId>,
    /// Speaker display name.
    pub speaker_name: String,
    /// Delivery tone.
    pub tone: Option<String>,
    /// Whether the learner speaks this line.
    pub learner: bool,
    /// Pre-recorded audio for this line.
    pub recording: Option<String>,
    /// Variant chosen for a dynamic line.
    pub variant: Option<Variant>,
}

/// Resolve line `turn` of a dialogue interaction.
///
/// Fails if the line, the variant it selects, or an interaction it draws
/// from does not exist.
pub fn resolve_line(
    catalog: &Catalog,
    interaction: &Interaction,
    turn: u32,
    vars: &SessionVars<'_>,
    learner_name: &str,
) -> EngineResult<ResolvedLine> {
    let line = usize::try_from(turn)
        .ok()
        .and_then(|i| interaction.lines.get(i))
        .ok_or(CatalogError::LineNotFound {
            interaction: interaction.id,
            line: turn,
        })?;

    let (utterance, choice) = match line {
        DialogueLine::Fixed(u) => (u, None),
        DialogueLine::Dynamic {
            source_interaction,
            dynamic_variants,
        } => {
            let choice = variant_for(catalog, *source_interaction, vars)?;
            let u = dynamic_variants
                .get(&choice.variant)
                .ok_or(CatalogError::VariantNotFound {
                    interaction: interaction.id,
                    line: turn,
                    variant: choice.variant,
                })?;
            (u, Some(choice))
        }
    };

    let constructed = match interaction.construction_for(turn) {
        Some(c) if c.logic.selection_type != SelectionType::DynamicLineSelection => {
            constructed_text(catalog, c, vars)?
        }
        _ => None,
    };
    let text = constructed.unwrap_or_else(|| {
        let (missing, unnecessary) = choice
            .as_ref()
            .map(|c| (c.missing.as_slice(), c.unnecessary.as_slice()))
            .unwrap_or_default();
        fill_placeholders(&utterance.text, learner_name, missing, unnecessary)
    });

    let (speaker, speaker_name) = speaker(interaction, utterance);
    let learner = speaker.as_ref().is_some_and(CharacterId::is_learner)
        || (!learner_name.is_empty()
            && (speaker_name == learner_name
                || speaker.as_ref().is_some_and(|c| c.as_str() == learner_name)));

    Ok(ResolvedLine {
        turn,
        text,
        speaker,
        speaker_name,
        tone: utterance.tone.clone(),
        learner,
        recording: interaction.recording_for(turn).map(str::to_string),
        variant: choice.map(|c| c.variant),
    })
}

/// Context passed to speech synthesis for an NPC line.
pub fn speech_context(interaction: &Interaction, line: &ResolvedLine) -> String {
    let tone = line.tone.as_deref().unwrap_or("neutral");
    let previous = line
        .turn
        .checked_sub(1)
        .and_then(|p| usize::try_from(p).ok())
        .and_then(|p| interaction.lines.get(p))
        .and_then(|l| match l {
            DialogueLine::Fixed(u) if !u.text.is_empty() => Some(u),
            _ => None,
        });
    match previous {
        Some(prev) => format!(
            "Previous line ({}): \"{}\"\n\nCurrent response ({}): \"{}\"\n\nTone: {tone}",
            prev.character_name.as_deref().unwrap_or_default(),
            prev.text,
            line.speaker_name,
            line.text,
        ),
        None => format!(
            "First line of dialogue ({}): \"{}\"\n\nTone: {tone}",
            line.speaker_name, line.text,
        ),
    }
}

fn speaker(interaction: &Interaction, utterance: &Utterance) -> (Option<CharacterId>, String) {
    let npc = &interaction.npc;
    let id = utterance.character_id.clone().or_else(|| {
        (!npc.character_id.as_str().is_empty()).then(|| npc.character_id.clone())
    });
    let name = utterance
        .character_name
        .clone()
        .unwrap_or_else(|| npc.character_name.clone());
    (id, name)
}

fn recorded_picks(vars: &SessionVars<'_>, source: InteractionId) -> Option<Vec<RecordedPick>> {
    vars.load_json(&SessionKey::MultichoiceResponse(source))
}

fn variant_for(
    catalog: &Catalog,
    source: InteractionId,
    vars: &SessionVars<'_>,
) -> EngineResult<VariantChoice> {
    let source_interaction = catalog.get(source)?;
    let options = selector::resolve(source_interaction, vars).multichoice_options;
    let picks = recorded_picks(vars, source);
    Ok(select_variant(options, picks.as_deref()))
}

fn constructed_text(
    catalog: &Catalog,
    construction: &FeedbackConstruction,
    vars: &SessionVars<'_>,
) -> EngineResult<Option<String>> {
    let source = catalog.get(construction.source_interaction)?;
    let wanted = match construction.logic.selection_type {
        SelectionType::Yes => YesNo::Yes,
        SelectionType::No => YesNo::No,
        SelectionType::DynamicLineSelection => return Ok(None),
    };
    let Some(picks) = recorded_picks(vars, construction.source_interaction) else {
        tracing::debug!(source = %construction.source_interaction, "no recorded picks for feedback line");
        return Ok(None);
    };
    let items: Vec<String> = picks
        .into_iter()
        .filter(|p| p.selection == wanted)
        .map(|p| p.option)
        .collect();

    let mut text = construct(&construction.template, &items);
    if let Some(prompt) = source.npc.new_prompt.as_ref().filter(|p| !p.text.is_empty()) {
        text.push('\n');
        text.push_str(&prompt.text);
    }
    Ok(Some(text))
}
