//! Decision mode — pick one of two options and hand back three onward steps.
//!
//! The model must answer with the literal text of an option. Positional
//! labels ("Option A") and case-only differences are mapped back to the
//! literal text; any other answer is malformed and triggers the fallback.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use serde_json::Value;

use crate::inference::{complete_within, prompts, CompletionBackend, CompletionError, DecisionFallback};
use crate::steps::normalizer;
use crate::steps::{DecisionResult, StepSequence};
use crate::storage::CredentialProvider;

/// Number of onward steps a decision carries.
pub const DECISION_STEPS: usize = 3;

const COIN_FLIP_REASON: &str = "I'm having trouble connecting, so I flipped a coin for you.";
const FIRST_OPTION_REASON: &str =
    "I'm having trouble connecting, so I picked the first option for you.";
const DEFAULT_REASON: &str = "This one is easier to start.";
const ONWARD_ACTIONS: [&str; 3] = [
    "Take a deep breath.",
    "Commit to this choice.",
    "Do the first small thing.",
];

// ─── DecisionResolver ────────────────────────────────────────────────────────

pub struct DecisionResolver {
    backend: Arc<dyn CompletionBackend>,
    credentials: Arc<dyn CredentialProvider>,
    policy: DecisionFallback,
    timeout: Duration,
}

impl DecisionResolver {
    pub fn new(
        backend: Arc<dyn CompletionBackend>,
        credentials: Arc<dyn CredentialProvider>,
        policy: DecisionFallback,
        timeout: Duration,
    ) -> Self {
        Self {
            backend,
            credentials,
            policy,
            timeout,
        }
    }

    pub fn policy(&self) -> DecisionFallback {
        self.policy
    }

    /// Pick between two options. Never fails; any problem yields the
    /// fallback decision.
    pub async fn decide(&self, option_a: &str, option_b: &str) -> DecisionResult {
        if option_a.trim().is_empty() || option_b.trim().is_empty() {
            tracing::warn!("decision requested with a blank option, using fallback");
            return self.fallback(option_a, option_b);
        }

        let Some(credential) = self.credentials.credential() else {
            tracing::info!(reason = "no_credential", "decision fallback");
            return self.fallback(option_a, option_b);
        };

        let messages = prompts::decision_messages(option_a, option_b);
        let result = complete_within(self.backend.as_ref(), &credential, messages, self.timeout)
            .await
            .and_then(|content| parse_decision_response(&content, option_a, option_b));

        match result {
            Ok(decision) => {
                tracing::info!(source = "remote", "decision resolved");
                decision
            }
            Err(e) => {
                tracing::warn!(reason = e.kind(), error = %e, "decision fallback");
                self.fallback(option_a, option_b)
            }
        }
    }

    fn fallback(&self, option_a: &str, option_b: &str) -> DecisionResult {
        fallback_decision(option_a, option_b, self.policy, &mut rand::thread_rng())
    }
}

// ─── Parsing ─────────────────────────────────────────────────────────────────

/// Parse and check a decision payload against the two literal options.
pub fn parse_decision_response(
    content: &str,
    option_a: &str,
    option_b: &str,
) -> Result<DecisionResult, CompletionError> {
    let payload = normalizer::parse_payload(content).map_err(malformed)?;

    let raw_answer = payload
        .get("answer")
        .and_then(Value::as_str)
        .ok_or_else(|| CompletionError::MalformedResponse {
            reason: "decision answer missing".into(),
        })?;
    let answer = match_option(raw_answer, option_a, option_b).ok_or_else(|| {
        CompletionError::MalformedResponse {
            reason: format!("answer '{raw_answer}' is not one of the options"),
        }
    })?;

    let reason = payload
        .get("reason")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .unwrap_or(DEFAULT_REASON);

    let mut steps = normalizer::normalize(payload.get("steps")).map_err(malformed)?;
    if steps.len() < DECISION_STEPS {
        return Err(CompletionError::MalformedResponse {
            reason: format!("expected {DECISION_STEPS} steps, got {}", steps.len()),
        });
    }
    steps.truncate(DECISION_STEPS);

    Ok(DecisionResult {
        answer: answer.to_string(),
        reason: reason.to_string(),
        steps,
    })
}

fn malformed(e: crate::steps::NormalizeError) -> CompletionError {
    CompletionError::MalformedResponse {
        reason: e.to_string(),
    }
}

/// Map a model answer to the literal option it refers to.
///
/// Exact (trimmed) matches win, then case-insensitive matches, then
/// positional labels such as "Option A", "B" or "option 2".
pub fn match_option<'a>(answer: &str, option_a: &'a str, option_b: &'a str) -> Option<&'a str> {
    let answer = answer.trim();
    for option in [option_a, option_b] {
        if answer == option.trim() {
            return Some(option);
        }
    }

    let folded = answer.trim_end_matches('.').trim().to_lowercase();
    for option in [option_a, option_b] {
        if folded == option.trim().trim_end_matches('.').to_lowercase() {
            return Some(option);
        }
    }

    let label = folded
        .strip_prefix("option")
        .or_else(|| folded.strip_prefix("choice"))
        .unwrap_or(&folded)
        .trim();
    match label {
        "a" | "1" => Some(option_a),
        "b" | "2" => Some(option_b),
        _ => None,
    }
}

// ─── Fallback ────────────────────────────────────────────────────────────────

/// Build the offline decision using the configured strategy.
pub fn fallback_decision<R: Rng + ?Sized>(
    option_a: &str,
    option_b: &str,
    policy: DecisionFallback,
    rng: &mut R,
) -> DecisionResult {
    let (answer, reason) = match policy {
        DecisionFallback::CoinFlip => {
            let pick = if rng.gen_bool(0.5) { option_a } else { option_b };
            (pick, COIN_FLIP_REASON)
        }
        DecisionFallback::FirstOption => (option_a, FIRST_OPTION_REASON),
    };

    DecisionResult {
        answer: answer.to_string(),
        reason: reason.to_string(),
        steps: StepSequence::from_actions(ONWARD_ACTIONS),
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
