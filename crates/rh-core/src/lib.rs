//! Core types for Rehearsal: the interaction catalog, navigation rules, and
//! the session store port.
//!
//! The catalog is a read-only, pre-validated document. All mutable session
//! state lives behind [`SessionStore`], reached through the typed accessors
//! in [`SessionVars`].

/// Catalog container, label descriptions and cross-reference validation.
pub mod catalog;
/// Dialogue lines, variants and feedback constructions.
pub mod dialogue;
/// Error types used throughout the crate.
pub mod error;
/// Interaction and character identifiers.
pub mod ids;
/// Interaction definitions: options, expectations, weights and content sets.
pub mod interaction;
/// Session variable key families.
pub mod keys;
/// Endpoint-navigation rules.
pub mod navigation;
/// Session store port and the in-memory store.
pub mod store;
/// Typed accessors over the session store.
pub mod vars;

/// Re-export catalog types.
pub use catalog::{Catalog, CatalogDocument, Descriptions, LabelDescription, ValidationIssue};
/// Re-export dialogue types.
pub use dialogue::{DialogueLine, FeedbackConstruction, FeedbackTemplate, SelectionType, Utterance, Variant};
/// Re-export error types.
pub use error::{CatalogError, CatalogResult};
/// Re-export identifiers.
pub use ids::{CharacterId, InteractionId};
/// Re-export interaction types.
pub use interaction::{
    Attribute, Expectations, Interaction, InteractionKind, MultichoiceOption, ResponseCandidate,
    Tier, YesNo,
};
/// Re-export key types.
pub use keys::{AttemptKind, SessionKey};
/// Re-export navigation rule types.
pub use navigation::{MatchKey, NavigationRule, RuleKind, RuleSet};
/// Re-export store types.
pub use store::{MemoryStore, SessionStore, StoreValue};
/// Re-export the typed accessor.
pub use vars::SessionVars;

#[cfg(any(test, feature = "testing"))]
/// Re-export the generated store mock.
pub use store::MockSessionStore;
