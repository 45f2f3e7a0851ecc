//! The Rehearsal interaction engine.
//!
//! Drives a learner through a catalog of interactions: selects the active
//! content, scores responses, keeps running averages, voices lines through a
//! [`SpeechSynthesizer`], and applies endpoint-navigation rules once the
//! learner has heard their own echo.

/// Running success averages.
pub mod aggregate;
/// Engine settings.
pub mod config;
/// Dialogue line resolution and feedback construction.
pub mod dialogue;
/// Engine error types.
pub mod error;
/// Expectation hints.
pub mod hint;
/// Interaction stages.
pub mod machine;
/// Endpoint-navigation guards and rule matching.
pub mod navigation;
/// Presented options.
pub mod presentation;
/// Response scoring.
pub mod scoring;
/// Content-set selection.
pub mod selector;
/// The session driver.
pub mod session;
/// Option shuffling.
pub mod shuffle;
/// Speech synthesizer port and playback tracking.
pub mod speech;

/// Re-export aggregate types.
pub use aggregate::{AggregateTracker, Standing};
/// Re-export configuration.
pub use config::EngineConfig;
/// Re-export dialogue types.
pub use dialogue::ResolvedLine;
/// Re-export error types.
pub use error::{EngineError, EngineResult, SpeechError};
/// Re-export the stage type.
pub use machine::Stage;
/// Re-export navigation types.
pub use navigation::{Decision, NavigationCall, Navigator, Outcome, Rejection};
/// Re-export presentation types.
pub use presentation::{Options, Presentation};
/// Re-export scoring entry points.
pub use scoring::{Response, ScoreContext, score};
/// Re-export the content selector.
pub use selector::{ResolvedContent, resolve};
/// Re-export the session driver.
pub use session::{Completion, DialogueRun, DialogueStep, InteractionEngine, Submitted};
/// Re-export speech types.
pub use speech::{SpeechRequest, SpeechSynthesizer};
