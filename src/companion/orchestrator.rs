//! The companion — the one object the UI talks to.
//!
//! Coordinates the step pipeline:
//!
//! ```text
//! lock(key) → cache lookup ─hit──────────────────────────────→ Cache
//!               └─miss→ credential ─absent──────────────────→ Fallback
//!                         └─present→ remote call (bounded)
//!                               ├─ok→ normalize → validate ─ok→ cache write → Remote
//!                               │                           └─invalid──────→ Fallback
//!                               └─err→ Unauthorized / ServerError ─────────→ Remediation
//!                                      anything else ──────────────────────→ Fallback
//! ```
//!
//! Every public operation returns a value; nothing here propagates an error
//! to the caller except credential entry, which the UI must report.

use std::sync::Arc;
use std::time::Duration;

use crate::inference::{
    complete_within, prompts, CompanionConfig, CompletionBackend, CompletionError,
    HttpCompletionClient,
};
use crate::steps::{fallback, normalizer, DecisionResult, Preferences, StepSequence};
use crate::storage::{
    CredentialChain, CredentialError, CredentialProvider, KeyValueStore, KeyedLocks, StepCache,
    StoredCredential,
};

use super::decision::DecisionResolver;

// ─── Outcome types ───────────────────────────────────────────────────────────

/// Where a step sequence came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepSource {
    Cache,
    Remote,
    Fallback,
    Remediation,
}

impl StepSource {
    pub fn as_str(self) -> &'static str {
        match self {
            StepSource::Cache => "cache",
            StepSource::Remote => "remote",
            StepSource::Fallback => "fallback",
            StepSource::Remediation => "remediation",
        }
    }
}

/// A resolved sequence plus its provenance, for diagnostics and the CLI.
#[derive(Debug, Clone, PartialEq)]
pub struct StepsOutcome {
    pub steps: StepSequence,
    pub source: StepSource,
}

impl StepsOutcome {
    fn new(steps: StepSequence, source: StepSource) -> Self {
        Self { steps, source }
    }
}

// ─── Companion ───────────────────────────────────────────────────────────────

pub struct Companion {
    backend: Arc<dyn CompletionBackend>,
    credentials: Arc<dyn CredentialProvider>,
    store: Arc<dyn KeyValueStore>,
    cache: StepCache,
    locks: KeyedLocks,
    decisions: DecisionResolver,
    request_timeout: Duration,
    credential_prefix: String,
}

impl Companion {
    /// Assemble a companion from explicit collaborators.
    pub fn new(
        backend: Arc<dyn CompletionBackend>,
        credentials: Arc<dyn CredentialProvider>,
        store: Arc<dyn KeyValueStore>,
        config: &CompanionConfig,
    ) -> Self {
        let request_timeout = Duration::from_secs(config.request_timeout_secs);
        let decisions = DecisionResolver::new(
            backend.clone(),
            credentials.clone(),
            config.decision_fallback,
            request_timeout,
        );

        Self {
            cache: StepCache::new(store.clone(), config.cache_prefix.clone()),
            backend,
            credentials,
            store,
            locks: KeyedLocks::new(),
            decisions,
            request_timeout,
            credential_prefix: config.credential_prefix.clone(),
        }
    }

    /// Production wiring: HTTP backend, environment-then-store credentials.
    pub fn from_config(
        config: &CompanionConfig,
        store: Arc<dyn KeyValueStore>,
    ) -> Result<Self, CompletionError> {
        let backend = Arc::new(HttpCompletionClient::from_config(config)?);
        let credentials = Arc::new(CredentialChain::env_then_store(
            &config.api_key_env,
            store.clone(),
        ));

        tracing::info!(
            endpoint = %config.endpoint,
            model = %config.model,
            timeout_secs = config.request_timeout_secs,
            "companion initialized"
        );

        Ok(Self::new(backend, credentials, store, config))
    }

    /// Override the bound on each remote call (steps and decisions).
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self.decisions = DecisionResolver::new(
            self.backend.clone(),
            self.credentials.clone(),
            self.decisions.policy(),
            timeout,
        );
        self
    }

    // ─── Step mode ───────────────────────────────────────────────────────────

    /// Break `text` into micro-steps.
    pub async fn get_micro_steps(&self, text: &str, prefs: &Preferences) -> StepSequence {
        self.resolve_micro_steps(text, prefs).await.steps
    }

    /// Like [`Companion::get_micro_steps`], but reports where the steps came from.
    pub async fn resolve_micro_steps(&self, text: &str, prefs: &Preferences) -> StepsOutcome {
        if text.trim().is_empty() {
            tracing::warn!("blank task text, using default fallback");
            return self.fallback(text, "blank_input");
        }

        let key = self.cache.key(text, prefs.tone_label());
        // Held until return; a concurrent caller for the same key waits and
        // then finds the entry this call wrote.
        let _guard = self.locks.lock(&key).await;

        if let Some(steps) = self.cache.get(&key) {
            tracing::info!(source = "cache", steps = steps.len(), "micro-steps resolved");
            return StepsOutcome::new(steps, StepSource::Cache);
        }

        let Some(credential) = self.credentials.credential() else {
            return self.fallback(text, CompletionError::NoCredential.kind());
        };

        let messages = prompts::step_messages(text, prefs);
        let content =
            match complete_within(self.backend.as_ref(), &credential, messages, self.request_timeout)
                .await
            {
                Ok(content) => content,
                Err(e) => return self.handle_failure(text, e),
            };

        match normalizer::parse_step_response(&content) {
            Ok(steps) => {
                self.cache.put(&key, &steps);
                tracing::info!(source = "remote", steps = steps.len(), "micro-steps resolved");
                StepsOutcome::new(steps, StepSource::Remote)
            }
            Err(e) => {
                tracing::warn!(error = %e, "model returned no usable steps");
                self.fallback(text, "invalid_steps")
            }
        }
    }

    fn handle_failure(&self, text: &str, error: CompletionError) -> StepsOutcome {
        match error.remediation() {
            Some(steps) => {
                tracing::warn!(reason = error.kind(), error = %error, "returning remediation steps");
                StepsOutcome::new(steps, StepSource::Remediation)
            }
            None => {
                tracing::warn!(error = %error, "completion failed");
                self.fallback(text, error.kind())
            }
        }
    }

    fn fallback(&self, text: &str, reason: &str) -> StepsOutcome {
        let group = fallback::match_group(text).unwrap_or("default");
        tracing::info!(source = "fallback", reason, group, "micro-steps resolved");
        StepsOutcome::new(fallback::resolve(text), StepSource::Fallback)
    }

    // ─── Decision mode ───────────────────────────────────────────────────────

    /// Choose between two options.
    pub async fn get_decision(&self, option_a: &str, option_b: &str) -> DecisionResult {
        self.decisions.decide(option_a, option_b).await
    }

    // ─── Maintenance ─────────────────────────────────────────────────────────

    /// Remove every cached sequence and return how many were removed.
    ///
    /// A store failure is logged and reported as zero.
    pub fn clear_cache(&self) -> usize {
        match self.cache.clear() {
            Ok(count) => {
                tracing::info!(count, prefix = self.cache.prefix(), "step cache cleared");
                count
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to clear step cache");
                0
            }
        }
    }

    /// Check and persist a user-entered credential.
    ///
    /// Nothing is written when the value is rejected.
    pub fn save_credential(&self, raw: &str) -> Result<(), CredentialError> {
        StoredCredential::new(self.store.clone())
            .save(raw, &self.credential_prefix)
            .map(|_| ())
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
