use rh_core::{CatalogError, InteractionId, InteractionKind};

use crate::machine::Stage;

/// Alias for `Result<T, EngineError>`.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors returned by engine operations.
///
/// Every error is raised before any session write.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Catalog lookup failed.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// No interaction has been entered yet.
    #[error("no interaction has been entered")]
    NotEntered,

    /// The submission does not fit the current interaction's kind.
    #[error("interaction {interaction} is {kind}; cannot {action}")]
    WrongKind {
        /// Current interaction.
        interaction: InteractionId,
        /// Its kind.
        kind: InteractionKind,
        /// What was attempted.
        action: &'static str,
    },

    /// The submission does not fit the current stage.
    #[error("interaction {interaction} is at stage {stage}; cannot {action}")]
    WrongStage {
        /// Current interaction.
        interaction: InteractionId,
        /// Current stage.
        stage: Stage,
        /// What was attempted.
        action: &'static str,
    },

    /// The picked option index is not among the presented options.
    #[error("option {index} out of range ({available} presented)")]
    OptionOutOfRange {
        /// The requested index.
        index: usize,
        /// How many options are presented.
        available: usize,
    },
}

/// Failure reported by a speech synthesizer.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SpeechError {
    /// Transport or service failure.
    #[error("speech request failed: {0}")]
    Transport(String),

    /// Audio could not be decoded or played.
    #[error("speech playback failed: {0}")]
    Playback(String),
}
