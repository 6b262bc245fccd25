//! Steps — the canonical step model and the purely local producers of it.
//!
//! Submodules:
//! - `types`: `Step`, `StepSequence`, `Preferences`, `DecisionResult`, boundary `RawStep`
//! - `fallback`: keyword → 3-step catalog used whenever remote resolution is unavailable
//! - `normalizer`: JSON extraction from model prose + shape coercion into `Step`s
//! - `deck`: shuffled quick-action deck
//! - `errors`: normalization error types

pub mod deck;
pub mod errors;
pub mod fallback;
pub mod normalizer;
pub mod types;

pub use deck::QuickDeck;
pub use errors::NormalizeError;
pub use types::{
    CognitiveLoad, DecisionResult, Preferences, RawStep, Step, StepSequence, TextLength, Tone,
    DEFAULT_WHY,
};
