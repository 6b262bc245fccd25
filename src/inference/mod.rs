//! Inference — talks to the OpenAI-compatible completion endpoint.
//!
//! This module handles everything on the wire side of the pipeline:
//! - Single-turn, non-streaming chat completion requests
//! - Prompt construction for step mode and decision mode
//! - HTTP status classification into the `CompletionError` taxonomy
//! - Configuration loading from `microsteps.yaml`
//!
//! The endpoint is interchangeable via config: pointing `endpoint` at a local
//! Ollama server is a config change, not a code change.

pub mod client;
pub mod config;
pub mod errors;
pub mod prompts;
pub mod types;

// Re-exports for convenience
pub use client::{complete_within, CompletionBackend, HttpCompletionClient};
pub use config::{CompanionConfig, DecisionFallback};
pub use errors::CompletionError;
pub use types::{ChatMessage, Role};
