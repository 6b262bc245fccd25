//! SQLite-backed key-value store.
//!
//! Uses `rusqlite` in synchronous mode behind a mutex; calls are short single
//! statements. WAL mode is enabled so a second process can read while the
//! CLI writes.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::{params, Connection, OptionalExtension};

use super::errors::StoreError;
use super::KeyValueStore;

/// Persistent store with one `kv(key, value)` table.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the store at the given path.
    ///
    /// Pass `":memory:"` for an in-memory database (tests).
    pub fn open(path: &str) -> Result<Self, StoreError> {
        if path != ":memory:" {
            if let Some(parent) = Path::new(path).parent() {
                std::fs::create_dir_all(parent).map_err(|e| StoreError::DatabaseError {
                    reason: format!("failed to create {}: {e}", parent.display()),
                })?;
            }
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            );
            ",
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn with_conn<T>(
        &self,
        f: impl FnOnce(&Connection) -> Result<T, rusqlite::Error>,
    ) -> Result<T, StoreError> {
        let conn = self.conn.lock().map_err(|_| StoreError::LockPoisoned)?;
        Ok(f(&conn)?)
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.with_conn(|conn| {
            conn.query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()
        })
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO kv (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value,
                                                updated_at = datetime('now')",
                params![key, value],
            )
        })?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool, StoreError> {
        let changed = self.with_conn(|conn| conn.execute("DELETE FROM kv WHERE key = ?1", params![key]))?;
        Ok(changed > 0)
    }

    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        // substr() instead of LIKE so `_` and `%` in the prefix stay literal.
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT key FROM kv WHERE substr(key, 1, length(?1)) = ?1 ORDER BY key",
            )?;
            let rows = stmt.query_map(params![prefix], |row| row.get::<_, String>(0))?;
            rows.collect()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_in_memory() {
        let store = SqliteStore::open(":memory:").unwrap();
        assert!(store.get("missing").unwrap().is_none());
        store.set("prefs", r#"{"tone":"quiet"}"#).unwrap();
        store.set("prefs", r#"{"tone":"gentle"}"#).unwrap();
        assert_eq!(store.get("prefs").unwrap().as_deref(), Some(r#"{"tone":"gentle"}"#));
        assert!(store.remove("prefs").unwrap());
        assert!(!store.remove("prefs").unwrap());
    }

    #[test]
    fn prefix_is_not_a_like_pattern() {
        let store = SqliteStore::open(":memory:").unwrap();
        store.set("smc_cache_1", "[]").unwrap();
        store.set("smcXcacheX2", "[]").unwrap();
        store.set("smc_cache_%", "[]").unwrap();
        let keys = store.keys_with_prefix("smc_cache_").unwrap();
        assert_eq!(keys, vec!["smc_cache_%", "smc_cache_1"]);
    }

    #[test]
    fn persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/microsteps.db");
        let path = path.to_str().unwrap();
        {
            let store = SqliteStore::open(path).unwrap();
            store.set("openai_api_key", "sk-abc").unwrap();
        }
        let store = SqliteStore::open(path).unwrap();
        assert_eq!(store.get("openai_api_key").unwrap().as_deref(), Some("sk-abc"));
    }
}
