use crate::dialogue::Variant;
use crate::ids::InteractionId;

/// Alias for `Result<T, CatalogError>`.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Errors raised while loading or looking up catalog content.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// The requested interaction id does not exist in the catalog.
    #[error("interaction not found: {0}")]
    InteractionNotFound(InteractionId),

    /// Two catalog entries share the same id.
    #[error("duplicate interaction id: {0}")]
    DuplicateInteraction(InteractionId),

    /// A dialogue interaction has no line at the requested turn.
    #[error("interaction {interaction} has no dialogue line {line}")]
    LineNotFound {
        /// The dialogue interaction.
        interaction: InteractionId,
        /// The missing line index.
        line: u32,
    },

    /// A dynamic dialogue line does not define the selected variant.
    #[error("interaction {interaction} line {line} has no variant \"{variant}\"")]
    VariantNotFound {
        /// The dialogue interaction.
        interaction: InteractionId,
        /// The dynamic line index.
        line: u32,
        /// The variant chosen by the variant selector.
        variant: Variant,
    },

    /// The catalog or rule document could not be parsed.
    #[error("invalid catalog document: {0}")]
    Parse(#[from] serde_json::Error),
}
