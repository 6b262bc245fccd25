//! Companion — the orchestration layer the UI calls into.
//!
//! Submodules:
//! - `orchestrator`: `Companion`, the step pipeline plus cache and credential upkeep
//! - `decision`: two-option decision mode and its offline fallback

pub mod decision;
pub mod orchestrator;

#[cfg(test)]
pub(crate) mod test_support;

pub use decision::DecisionResolver;
pub use orchestrator::{Companion, StepSource, StepsOutcome};
