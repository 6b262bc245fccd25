//! Companion configuration loading.
//!
//! Reads `microsteps.yaml` and resolves environment variables. Every field
//! has a default, so a missing file or an empty document yields a working
//! configuration pointed at the public OpenAI endpoint.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::errors::CompletionError;

/// File name searched for by [`find_config_path`].
pub const CONFIG_FILE_NAME: &str = "microsteps.yaml";

// ─── Public Types ────────────────────────────────────────────────────────────

/// What decision mode does when it cannot reach the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionFallback {
    /// Pick either option with equal probability.
    #[default]
    CoinFlip,
    /// Always pick the first option.
    FirstOption,
}

/// Runtime configuration for the companion core.
#[derive(Debug, Clone, Deserialize)]
pub struct CompanionConfig {
    /// Base URL of the OpenAI-compatible API (without `/chat/completions`).
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Upper bound on a single remote call, in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// When `true`, sends `response_format: {"type":"json_object"}`.
    #[serde(default)]
    pub force_json_response: bool,
    /// Environment variable holding the credential. Checked before the store.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    /// Literal prefix a credential must start with to be accepted.
    #[serde(default = "default_credential_prefix")]
    pub credential_prefix: String,
    /// Key namespace for cached step sequences.
    #[serde(default = "default_cache_prefix")]
    pub cache_prefix: String,
    #[serde(default)]
    pub decision_fallback: DecisionFallback,
    /// SQLite store location. Defaults to the platform data directory.
    #[serde(default)]
    pub store_path: Option<String>,
}

fn default_endpoint() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_model() -> String {
    "gpt-3.5-turbo".to_string()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_request_timeout_secs() -> u64 {
    15
}
fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}
fn default_credential_prefix() -> String {
    "sk-".to_string()
}
fn default_cache_prefix() -> String {
    "smc_cache_".to_string()
}

impl Default for CompanionConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            temperature: default_temperature(),
            request_timeout_secs: default_request_timeout_secs(),
            force_json_response: false,
            api_key_env: default_api_key_env(),
            credential_prefix: default_credential_prefix(),
            cache_prefix: default_cache_prefix(),
            decision_fallback: DecisionFallback::default(),
            store_path: None,
        }
    }
}

impl CompanionConfig {
    /// Reject values that would make every request fail.
    pub fn validate(&self) -> Result<(), CompletionError> {
        if self.endpoint.trim().is_empty() {
            return Err(CompletionError::ConfigError {
                reason: "endpoint must not be empty".into(),
            });
        }
        if self.request_timeout_secs == 0 {
            return Err(CompletionError::ConfigError {
                reason: "request_timeout_secs must be positive".into(),
            });
        }
        if self.cache_prefix.is_empty() {
            return Err(CompletionError::ConfigError {
                reason: "cache_prefix must not be empty".into(),
            });
        }
        Ok(())
    }
}

// ─── Loading ─────────────────────────────────────────────────────────────────

/// Locate `microsteps.yaml`.
///
/// Checks `MICROSTEPS_CONFIG_DIR` first, then walks upward from `start`.
/// Returns `None` when no file exists; callers use defaults in that case.
pub fn find_config_path(start: &Path) -> Option<PathBuf> {
    if let Ok(dir) = std::env::var("MICROSTEPS_CONFIG_DIR") {
        let candidate = PathBuf::from(&dir).join(CONFIG_FILE_NAME);
        if candidate.exists() {
            return Some(candidate);
        }
    }

    let mut dir = start.to_path_buf();
    loop {
        let candidate = dir.join(CONFIG_FILE_NAME);
        if candidate.exists() {
            return Some(candidate);
        }
        if !dir.pop() {
            return None;
        }
    }
}

/// Load and parse a configuration file.
///
/// Performs environment-variable interpolation on `${VAR_NAME}` and
/// `${VAR_NAME:-default}` before parsing.
pub fn load_config(path: &Path) -> Result<CompanionConfig, CompletionError> {
    let raw = std::fs::read_to_string(path).map_err(|e| CompletionError::ConfigError {
        reason: format!("failed to read {}: {e}", path.display()),
    })?;
    parse_config(&raw)
}

/// Parse configuration text. An empty document yields the defaults.
pub fn parse_config(raw: &str) -> Result<CompanionConfig, CompletionError> {
    let interpolated = interpolate_env_vars(raw);
    if interpolated.trim().is_empty() {
        return Ok(CompanionConfig::default());
    }

    let config: CompanionConfig =
        serde_yaml::from_str(&interpolated).map_err(|e| CompletionError::ConfigError {
            reason: format!("failed to parse config: {e}"),
        })?;
    config.validate()?;
    Ok(config)
}

/// Find and load the configuration, falling back to defaults when absent.
pub fn load_or_default(start: &Path) -> Result<CompanionConfig, CompletionError> {
    match find_config_path(start) {
        Some(path) => {
            let config = load_config(&path)?;
            tracing::info!(path = %path.display(), "loaded companion config");
            Ok(config)
        }
        None => {
            tracing::debug!("no config file found, using defaults");
            Ok(CompanionConfig::default())
        }
    }
}

// ─── Env-var interpolation ───────────────────────────────────────────────────

/// Replace `${VAR}` and `${VAR:-default}` in a string.
fn interpolate_env_vars(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && chars.peek() == Some(&'{') {
            chars.next();
            let mut var_expr = String::new();
            for c in chars.by_ref() {
                if c == '}' {
                    break;
                }
                var_expr.push(c);
            }
            result.push_str(&resolve_var_expr(&var_expr));
        } else {
            result.push(ch);
        }
    }

    result
}

/// Resolve a variable expression like `VAR` or `VAR:-default`.
fn resolve_var_expr(expr: &str) -> String {
    if let Some(idx) = expr.find(":-") {
        let var_name = &expr[..idx];
        let default = &expr[idx + 2..];
        std::env::var(var_name).unwrap_or_else(|_| expand_tilde(default))
    } else {
        std::env::var(expr).unwrap_or_default()
    }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &str) -> String {
    if let Some(rest) = path.strip_prefix('~') {
        if let Some(home) = dirs::home_dir() {
            return format!("{}{rest}", home.display());
        }
    }
    path.to_string()
}

// ─── Tests ───────────────────────────────────────────────────────────────────
