//! Step cache — content-addressed, namespaced entries in the key-value store.
//!
//! Keys are `"{prefix}{sha256(normalized text, tone)}"`. Entries are written
//! only after a successful remote resolution and never expire; the only way
//! out is a namespace-wide clear.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use sha2::{Digest, Sha256};
use tokio::sync::{Mutex as TokioMutex, OwnedMutexGuard};

use crate::steps::normalizer;
use crate::steps::StepSequence;

use super::errors::StoreError;
use super::{clear_namespace, KeyValueStore};

// ─── StepCache ───────────────────────────────────────────────────────────────

/// Read-through / write-through cache of resolved step sequences.
pub struct StepCache {
    store: Arc<dyn KeyValueStore>,
    prefix: String,
}

impl StepCache {
    pub fn new(store: Arc<dyn KeyValueStore>, prefix: impl Into<String>) -> Self {
        Self {
            store,
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Derive the cache key for `(text, tone)`.
    ///
    /// Text is trimmed and lowercased first, so "Clean my desk " and
    /// "clean my desk" share an entry. A separator byte keeps
    /// `("ab", "c")` and `("a", "bc")` apart.
    pub fn key(&self, text: &str, tone_label: &str) -> String {
        let normalized = text.trim().to_lowercase();
        let mut hasher = Sha256::new();
        hasher.update(normalized.as_bytes());
        hasher.update([0x1f]);
        hasher.update(tone_label.as_bytes());
        format!("{}{}", self.prefix, hex::encode(hasher.finalize()))
    }

    /// Look up a cached sequence.
    ///
    /// Values written as bare string arrays by older versions are upgraded
    /// through the normalizer. Unreadable values and store errors are misses.
    pub fn get(&self, key: &str) -> Option<StepSequence> {
        let raw = match self.store.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(error = %e, "step cache read failed, treating as miss");
                return None;
            }
        };

        let value: serde_json::Value = match serde_json::from_str(&raw) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(error = %e, "corrupt step cache entry, treating as miss");
                return None;
            }
        };

        match normalizer::normalize(Some(&value)) {
            Ok(seq) => Some(seq),
            Err(e) => {
                tracing::warn!(error = %e, "unusable step cache entry, treating as miss");
                None
            }
        }
    }

    /// Store a sequence. Failures are logged, never surfaced.
    pub fn put(&self, key: &str, steps: &StepSequence) {
        let serialized = match serde_json::to_string(steps) {
            Ok(s) => s,
            Err(e) => {
                tracing::error!(error = %e, "failed to serialize steps for cache");
                return;
            }
        };
        if let Err(e) = self.store.set(key, &serialized) {
            tracing::warn!(error = %e, "step cache write failed");
        }
    }

    /// Remove every cached sequence in this namespace.
    pub fn clear(&self) -> Result<usize, StoreError> {
        clear_namespace(self.store.as_ref(), &self.prefix)
    }
}

// ─── KeyedLocks ──────────────────────────────────────────────────────────────

/// One async mutex per key, created on demand.
///
/// Holding the guard across a cache-lookup → remote-call → cache-write
/// sequence keeps concurrent callers for the same key from racing. The guard
/// is released on drop, so an abandoned request never blocks a later one.
#[derive(Default)]
pub struct KeyedLocks {
    locks: Mutex<HashMap<String, Arc<TokioMutex<()>>>>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `key`.
    pub async fn lock(&self, key: &str) -> OwnedMutexGuard<()> {
        let mutex = {
            let mut locks = self.locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            // Drop entries no one else holds or waits on.
            locks.retain(|_, m| Arc::strong_count(m) > 1);
            locks
                .entry(key.to_string())
                .or_insert_with(|| Arc::new(TokioMutex::new(())))
                .clone()
        };
        mutex.lock_owned().await
    }

    /// Number of keys currently tracked.
    pub fn tracked(&self) -> usize {
        self.locks.lock().map(|l| l.len()).unwrap_or(0)
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
