use std::fmt;

use crate::ids::{CharacterId, InteractionId};

/// Which attempt counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttemptKind {
    /// Two-step understanding stage.
    Understanding,
    /// Response stage.
    Response,
    /// Reorder submissions.
    Reorder,
}

impl AttemptKind {
    /// Every counter, reset together on interaction entry.
    pub const ALL: [Self; 3] = [Self::Understanding, Self::Response, Self::Reorder];
}

/// Every session variable the engine reads or writes.
///
/// `Display` yields the host key string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SessionKey {
    /// Id of the interaction currently on screen.
    CurrentInteraction,
    /// Current stage name.
    Stage,
    /// Current interaction kind.
    InteractionType,
    /// Most recent score.
    InteractionSuccess,
    /// Score recorded for one interaction.
    InteractionSuccessFor(InteractionId),
    /// Last committed response of one interaction.
    LastResponse(InteractionId),
    /// Running score total with one character.
    CharacterTotal(CharacterId),
    /// Scored interaction count with one character.
    CharacterCount(CharacterId),
    /// Running average with one character.
    CharacterAverage(CharacterId),
    /// Running score total overall.
    OverallTotal,
    /// Scored interaction count overall.
    OverallCount,
    /// Running average overall.
    OverallAverage,
    /// An attempt counter.
    Attempts(AttemptKind),
    /// Serialized list of visited interaction ids.
    Visited,
    /// Whether speech is playing.
    SpeechPlaying,
    /// Whether the presentation layer should jump to an alternate ending.
    Endpoint,
    /// NPC text currently shown.
    NpcText,
    /// NPC text shown for one interaction.
    NpcTextFor(InteractionId),
    /// NPC name currently shown.
    NpcName,
    /// Current dialogue line.
    DialogueTurn,
    /// Text of the current dialogue line.
    DialogueLineText,
    /// Reorder sentence submitted for one interaction.
    ReorderResponse(InteractionId),
    /// Chosen one-step / two-step candidate.
    ChoiceResponse(InteractionId),
    /// Chosen end-point candidate.
    EndPointResponse(InteractionId),
    /// Recorded multichoice picks.
    MultichoiceResponse(InteractionId),
    /// Correct picks of the latest multichoice submission.
    MultichoiceCorrectCount,
    /// Serialized options currently presented.
    PresentedOptions,
    /// Multichoice column header (1 or 2).
    ColumnHeader(u8),
    /// Hint text for the current stage.
    Hint,
    /// A feedback slot from the rule set's pool.
    Slot(String),
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CurrentInteraction => f.write_str("currentInteractionId"),
            Self::Stage => f.write_str("interactionStage"),
            Self::InteractionType => f.write_str("interactionType"),
            Self::InteractionSuccess => f.write_str("interactionSuccess"),
            Self::InteractionSuccessFor(id) => write!(f, "interactionSuccess_{id}"),
            Self::LastResponse(id) => write!(f, "lastResponse_{id}"),
            Self::CharacterTotal(c) => write!(f, "withCharacterSuccess_total_{c}"),
            Self::CharacterCount(c) => write!(f, "characterInteractionCount_{c}"),
            Self::CharacterAverage(c) => write!(f, "withCharacterSuccess_{c}"),
            Self::OverallTotal => f.write_str("overallSuccess_total"),
            Self::OverallCount => f.write_str("totalInteractionCount"),
            Self::OverallAverage => f.write_str("overallSuccess"),
            Self::Attempts(AttemptKind::Understanding) => f.write_str("understandingAttempts"),
            Self::Attempts(AttemptKind::Response) => f.write_str("responseAttempts"),
            Self::Attempts(AttemptKind::Reorder) => f.write_str("reordAttempts"),
            Self::Visited => f.write_str("visitedInteractions"),
            Self::SpeechPlaying => f.write_str("isSpeechPlaying"),
            Self::Endpoint => f.write_str("GoToEndPoint"),
            Self::NpcText => f.write_str("npcText"),
            Self::NpcTextFor(id) => write!(f, "npcText_{id}"),
            Self::NpcName => f.write_str("npcName"),
            Self::DialogueTurn => f.write_str("dialogueTurn"),
            Self::DialogueLineText => f.write_str("dialogueText"),
            Self::ReorderResponse(id) => write!(f, "reordResponse_{id}"),
            Self::ChoiceResponse(id) => write!(f, "MCQResponse_{id}"),
            Self::EndPointResponse(id) => write!(f, "endPointResponse_{id}"),
            Self::MultichoiceResponse(id) => write!(f, "multichoiceResponse_{id}"),
            Self::MultichoiceCorrectCount => f.write_str("multiChoiceCorrectCount"),
            Self::PresentedOptions => f.write_str("presentedOptions"),
            Self::ColumnHeader(n) => write!(f, "column_header_{n}"),
            Self::Hint => f.write_str("currentHint"),
            Self::Slot(name) => f.write_str(name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parameterized_keys() {
        assert_eq!(SessionKey::LastResponse(InteractionId(4)).to_string(), "lastResponse_4");
        assert_eq!(
            SessionKey::CharacterTotal(CharacterId::new("2")).to_string(),
            "withCharacterSuccess_total_2"
        );
        assert_eq!(
            SessionKey::Attempts(AttemptKind::Reorder).to_string(),
            "reordAttempts"
        );
        assert_eq!(SessionKey::Slot("lastResponse1".into()).to_string(), "lastResponse1");
    }
}
