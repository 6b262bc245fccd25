//! Read-only access to the preferences the UI persists under `prefs`.

use crate::steps::Preferences;

use super::KeyValueStore;

/// Store key the UI writes preferences under.
pub const PREFERENCES_KEY: &str = "prefs";

/// Load preferences, falling back to defaults when absent or unreadable.
pub fn load_preferences(store: &dyn KeyValueStore) -> Preferences {
    let raw = match store.get(PREFERENCES_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Preferences::default(),
        Err(e) => {
            tracing::warn!(error = %e, "failed to read preferences, using defaults");
            return Preferences::default();
        }
    };

    serde_json::from_str(&raw).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "failed to parse preferences, using defaults");
        Preferences::default()
    })
}
