//! Completion error types.
//!
//! All errors implement `std::error::Error` via `thiserror`. Only two kinds
//! ever reach the user, as fixed remediation sequences; the orchestrator
//! absorbs the rest into the fallback catalog.

use thiserror::Error;

use crate::steps::StepSequence;

/// Errors that can occur while obtaining a completion.
#[derive(Debug, Error)]
pub enum CompletionError {
    /// No credential is configured; the request was never attempted.
    #[error("no credential configured")]
    NoCredential,

    /// HTTP 401 — the credential was rejected.
    #[error("credential rejected by the completion endpoint")]
    Unauthorized { body: String },

    /// HTTP 429.
    #[error("rate limited by the completion endpoint")]
    RateLimited,

    /// HTTP 5xx.
    #[error("completion server error (HTTP {status})")]
    ServerError { status: u16, body: String },

    /// Any other non-2xx status.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    /// Body did not parse, had no choice, or the content was unusable.
    #[error("malformed response: {reason}")]
    MalformedResponse { reason: String },

    /// TCP/HTTP connection to the endpoint failed.
    #[error("connection failed to {endpoint}: {reason}")]
    ConnectionFailed { endpoint: String, reason: String },

    /// The endpoint did not answer within the configured timeout.
    #[error("completion timeout after {duration_secs}s")]
    Timeout { duration_secs: u64 },

    /// Configuration loading or validation error.
    #[error("config error: {reason}")]
    ConfigError { reason: String },
}

impl CompletionError {
    /// The user-facing sequence for this failure, if it is one of the two
    /// kinds that must not be hidden behind the fallback catalog.
    pub fn remediation(&self) -> Option<StepSequence> {
        match self {
            CompletionError::Unauthorized { .. } => Some(StepSequence::from_actions([
                "Error: Invalid API Key.",
                "Please check your key.",
                "Try entering it again.",
            ])),
            CompletionError::ServerError { .. } => Some(StepSequence::from_actions([
                "Error: Server Error.",
                "Wait a moment.",
                "Try again.",
            ])),
            _ => None,
        }
    }

    /// Short stable label for structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            CompletionError::NoCredential => "no_credential",
            CompletionError::Unauthorized { .. } => "unauthorized",
            CompletionError::RateLimited => "rate_limited",
            CompletionError::ServerError { .. } => "server_error",
            CompletionError::HttpError { .. } => "http_error",
            CompletionError::MalformedResponse { .. } => "malformed_response",
            CompletionError::ConnectionFailed { .. } => "connection_failed",
            CompletionError::Timeout { .. } => "timeout",
            CompletionError::ConfigError { .. } => "config_error",
        }
    }
}

/// Map a non-success HTTP status to its error kind.
pub fn classify_status(status: u16, body: String) -> CompletionError {
    match status {
        401 => CompletionError::Unauthorized { body },
        429 => CompletionError::RateLimited,
        500..=599 => CompletionError::ServerError { status, body },
        _ => CompletionError::HttpError { status, body },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_known_statuses() {
        assert!(matches!(
            classify_status(401, "bad key".into()),
            CompletionError::Unauthorized { .. }
        ));
        assert!(matches!(classify_status(429, String::new()), CompletionError::RateLimited));
        assert!(matches!(
            classify_status(500, String::new()),
            CompletionError::ServerError { status: 500, .. }
        ));
        assert!(matches!(
            classify_status(503, String::new()),
            CompletionError::ServerError { status: 503, .. }
        ));
        assert!(matches!(
            classify_status(404, "missing".into()),
            CompletionError::HttpError { status: 404, .. }
        ));
    }

    #[test]
    fn only_unauthorized_and_server_error_have_remediation() {
        let unauthorized = CompletionError::Unauthorized { body: String::new() };
        let seq = unauthorized.remediation().unwrap();
        assert_eq!(seq.actions()[0], "Error: Invalid API Key.");
        assert_eq!(seq.len(), 3);

        let server = CompletionError::ServerError { status: 502, body: String::new() };
        assert_eq!(server.remediation().unwrap().actions()[2], "Try again.");

        assert!(CompletionError::RateLimited.remediation().is_none());
        assert!(CompletionError::NoCredential.remediation().is_none());
        assert!(CompletionError::Timeout { duration_secs: 15 }.remediation().is_none());
        assert!(CompletionError::MalformedResponse { reason: String::new() }
            .remediation()
            .is_none());
    }

    #[test]
    fn error_display_includes_status() {
        let err = CompletionError::HttpError { status: 418, body: "teapot".into() };
        assert_eq!(err.to_string(), "HTTP 418: teapot");
        assert_eq!(err.kind(), "http_error");
    }
}
