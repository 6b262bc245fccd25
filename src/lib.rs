pub mod companion;
pub mod inference;
pub mod logging;
pub mod steps;
pub mod storage;

pub use companion::{Companion, StepSource, StepsOutcome};
pub use inference::{CompanionConfig, CompletionBackend, CompletionError, DecisionFallback};
pub use steps::{DecisionResult, Preferences, Step, StepSequence};
pub use storage::{KeyValueStore, MemoryStore, SqliteStore};

/// Return the platform-standard data directory for microsteps.
///
/// - macOS: `~/Library/Application Support/microsteps/`
/// - Windows: `{FOLDERID_RoamingAppData}\microsteps\`
/// - Linux: `$XDG_DATA_HOME/microsteps/` (fallback `~/.local/share/...`)
///
/// Falls back to `~/.microsteps/` only if none of the above can be resolved.
pub fn data_dir() -> std::path::PathBuf {
    if let Some(dir) = dirs::data_dir() {
        return dir.join("microsteps");
    }
    dirs::home_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join(".microsteps")
}

/// Resolve the path for the key-value database.
///
/// An explicit `store_path` from config wins; otherwise the data directory
/// is used (created if needed).
pub fn resolve_db_path(configured: Option<&str>) -> String {
    if let Some(path) = configured.filter(|p| !p.trim().is_empty()) {
        return path.to_string();
    }
    let dir = data_dir();
    if !dir.exists() {
        let _ = std::fs::create_dir_all(&dir);
    }
    dir.join("microsteps.db").to_string_lossy().into_owned()
}

/// Route `tracing` output to `<data_dir>/microsteps.log`.
pub fn init_tracing() {
    logging::init(&data_dir());
}
