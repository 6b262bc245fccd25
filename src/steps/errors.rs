//! Step normalization error types.
//!
//! Every variant means "invalid": the caller substitutes the fallback
//! catalog. The variants only exist so logs say why.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NormalizeError {
    /// No `{...}` span could be found in the model output.
    #[error("no JSON object found in model output")]
    NoJsonObject,

    /// The extracted span did not parse, even after repair.
    #[error("invalid JSON in model output: {reason}")]
    InvalidJson { reason: String },

    /// The payload had no `steps` field (or it was null).
    #[error("step list missing")]
    MissingSteps,

    /// `steps` was present but not an array.
    #[error("step list is not an array")]
    NotAnArray,

    /// The array was empty, or every entry was blank or unusable.
    #[error("step list is empty")]
    Empty,
}
