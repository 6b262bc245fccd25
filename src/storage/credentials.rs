//! Credential sources and their precedence.
//!
//! The credential can come from the environment or from a value the user
//! typed into the UI and we persisted. `CredentialChain` makes the order
//! explicit: the first source that yields a non-empty value wins.

use std::fmt;
use std::sync::Arc;

use super::errors::CredentialError;
use super::KeyValueStore;

/// Store key for a user-entered credential.
pub const CREDENTIAL_KEY: &str = "openai_api_key";

// ─── Credential ──────────────────────────────────────────────────────────────

/// An API secret. `Debug` never prints the value.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// Validate a user-entered value against the required prefix.
    pub fn parse(raw: &str, prefix: &str) -> Result<Self, CredentialError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(CredentialError::Empty);
        }
        if !trimmed.starts_with(prefix) {
            return Err(CredentialError::InvalidFormat {
                prefix: prefix.to_string(),
            });
        }
        Ok(Self(trimmed.to_string()))
    }

    /// The raw secret, for the authorization header only.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

// ─── Providers ───────────────────────────────────────────────────────────────

/// A place a credential may come from.
pub trait CredentialProvider: Send + Sync {
    /// Short name for logs ("env", "store", ...).
    fn source(&self) -> &'static str;

    fn credential(&self) -> Option<Credential>;
}

/// Reads the credential from an environment variable.
pub struct EnvCredential {
    var: String,
}

impl EnvCredential {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl CredentialProvider for EnvCredential {
    fn source(&self) -> &'static str {
        "env"
    }

    fn credential(&self) -> Option<Credential> {
        std::env::var(&self.var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(Credential)
    }
}

/// Reads a user-entered credential persisted in the key-value store.
pub struct StoredCredential {
    store: Arc<dyn KeyValueStore>,
}

impl StoredCredential {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Validate and persist a user-entered credential.
    ///
    /// Nothing is written when validation fails.
    pub fn save(&self, raw: &str, prefix: &str) -> Result<Credential, CredentialError> {
        let credential = Credential::parse(raw, prefix)?;
        self.store
            .set(CREDENTIAL_KEY, credential.expose())
            .map_err(|e| CredentialError::Persist {
                reason: e.to_string(),
            })?;
        tracing::info!("credential saved");
        Ok(credential)
    }
}

impl CredentialProvider for StoredCredential {
    fn source(&self) -> &'static str {
        "store"
    }

    fn credential(&self) -> Option<Credential> {
        match self.store.get(CREDENTIAL_KEY) {
            Ok(value) => value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .map(Credential),
            Err(e) => {
                tracing::warn!(error = %e, "failed to read stored credential");
                None
            }
        }
    }
}

/// A fixed credential (or none). Handy for tests and embedding.
pub struct StaticCredential(Option<Credential>);

impl StaticCredential {
    pub fn some(secret: impl Into<String>) -> Self {
        Self(Some(Credential::new(secret)))
    }

    pub fn none() -> Self {
        Self(None)
    }
}

impl CredentialProvider for StaticCredential {
    fn source(&self) -> &'static str {
        "static"
    }

    fn credential(&self) -> Option<Credential> {
        self.0.clone()
    }
}

/// Ordered list of providers; the first hit wins.
pub struct CredentialChain {
    providers: Vec<Box<dyn CredentialProvider>>,
}

impl CredentialChain {
    pub fn new(providers: Vec<Box<dyn CredentialProvider>>) -> Self {
        Self { providers }
    }

    /// Environment first, then the persisted user entry.
    pub fn env_then_store(env_var: &str, store: Arc<dyn KeyValueStore>) -> Self {
        Self::new(vec![
            Box::new(EnvCredential::new(env_var)),
            Box::new(StoredCredential::new(store)),
        ])
    }
}

impl CredentialProvider for CredentialChain {
    fn source(&self) -> &'static str {
        "chain"
    }

    fn credential(&self) -> Option<Credential> {
        self.providers.iter().find_map(|p| {
            let found = p.credential();
            if found.is_some() {
                tracing::debug!(source = p.source(), "credential resolved");
            }
            found
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[test]
    fn parse_requires_prefix() {
        assert_eq!(Credential::parse("  ", "sk-"), Err(CredentialError::Empty));
        assert_eq!(
            Credential::parse("pk-123", "sk-"),
            Err(CredentialError::InvalidFormat { prefix: "sk-".into() })
        );
        assert_eq!(Credential::parse("  sk-123 ", "sk-").unwrap().expose(), "sk-123");
    }

    #[test]
    fn debug_is_redacted() {
        let c = Credential::new("sk-very-secret");
        assert!(!format!("{c:?}").contains("secret"));
    }

    #[test]
    fn save_rejects_without_persisting() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let stored = StoredCredential::new(store.clone());
        assert!(stored.save("not-a-key", "sk-").is_err());
        assert!(store.get(CREDENTIAL_KEY).unwrap().is_none());
        assert!(stored.credential().is_none());

        stored.save("sk-good", "sk-").unwrap();
        assert_eq!(stored.credential().unwrap().expose(), "sk-good");
    }

    #[test]
    fn chain_prefers_first_source() {
        let chain = CredentialChain::new(vec![
            Box::new(StaticCredential::none()),
            Box::new(StaticCredential::some("sk-second")),
            Box::new(StaticCredential::some("sk-third")),
        ]);
        assert_eq!(chain.credential().unwrap().expose(), "sk-second");
    }

    #[test]
    fn env_takes_precedence_over_store() {
        let var = "__MICROSTEPS_TEST_KEY_PRECEDENCE__";
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        store.set(CREDENTIAL_KEY, "sk-from-store").unwrap();
        let chain = CredentialChain::env_then_store(var, store);

        std::env::remove_var(var);
        assert_eq!(chain.credential().unwrap().expose(), "sk-from-store");

        std::env::set_var(var, "sk-from-env");
        assert_eq!(chain.credential().unwrap().expose(), "sk-from-env");

        std::env::set_var(var, "   ");
        assert_eq!(chain.credential().unwrap().expose(), "sk-from-store");
        std::env::remove_var(var);
    }
}
