//! Storage — the injected key-value capability and everything built on it.
//!
//! Submodules:
//! - `memory`: in-process `HashMap` store (tests, ephemeral sessions)
//! - `sqlite`: persistent store backed by a single `kv` table
//! - `cache`: namespaced, content-addressed step cache + per-key locks
//! - `credentials`: credential sources and their precedence chain
//! - `preferences`: read-only view of UI-owned preferences
//! - `errors`: storage and credential error types
//!
//! Nothing in the core touches a concrete store directly; it receives an
//! `Arc<dyn KeyValueStore>` at construction.

pub mod cache;
pub mod credentials;
pub mod errors;
pub mod memory;
pub mod preferences;
pub mod sqlite;

pub use cache::{KeyedLocks, StepCache};
pub use credentials::{
    Credential, CredentialChain, CredentialProvider, EnvCredential, StaticCredential,
    StoredCredential,
};
pub use errors::{CredentialError, StoreError};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Minimal string key-value capability.
///
/// Implementations use interior mutability and must be safe to share across
/// tasks.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Remove a key. Returns whether it existed.
    fn remove(&self, key: &str) -> Result<bool, StoreError>;

    /// All keys starting with `prefix` (literal match, no wildcards).
    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StoreError>;
}

/// Remove every key in a namespace and return how many were removed.
///
/// Keys outside the namespace are never touched.
pub fn clear_namespace(store: &dyn KeyValueStore, prefix: &str) -> Result<usize, StoreError> {
    let mut removed = 0;
    for key in store.keys_with_prefix(prefix)? {
        if store.remove(&key)? {
            removed += 1;
        }
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clear_namespace_counts_and_isolates() {
        let store = MemoryStore::new();
        store.set("smc_cache_a", "[]").unwrap();
        store.set("smc_cache_b", "[]").unwrap();
        store.set("prefs", "{}").unwrap();
        store.set("openai_api_key", "sk-1").unwrap();

        assert_eq!(clear_namespace(&store, "smc_cache_").unwrap(), 2);
        assert_eq!(store.get("prefs").unwrap().as_deref(), Some("{}"));
        assert_eq!(store.get("openai_api_key").unwrap().as_deref(), Some("sk-1"));
        assert_eq!(clear_namespace(&store, "smc_cache_").unwrap(), 0);
    }
}
