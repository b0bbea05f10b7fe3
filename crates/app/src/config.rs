//! Application configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `NEUPOOL_DATA_DIR` - Directory holding the state snapshot (default: ./data)
//! - `NEUPOOL_STATE_KEY` - Namespace key naming the snapshot (default: neuPoolState)
//! - `NEUPOOL_LOG_FORMAT` - `json` for structured logs, anything else for text
//!
//! ## Optional (advisor - required for recommendations)
//! - `ANTHROPIC_API_KEY` - Anthropic API key
//! - `NEUPOOL_ADVISOR_MODEL` - Model ID (default: claude-sonnet-4-20250514)
//! - `NEUPOOL_ADVISOR_URL` - Messages endpoint (default: Anthropic public API)
//! - `NEUPOOL_ADVISOR_TIMEOUT_SECS` - Request timeout (default: 60)
//!
//! A missing API key is not a load error: the rest of the application works
//! without it, and requesting a recommendation fails with a configuration
//! error before any network call is made.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const DEFAULT_DATA_DIR: &str = "./data";
const DEFAULT_STATE_KEY: &str = "neuPoolState";
const DEFAULT_ADVISOR_MODEL: &str = "claude-sonnet-4-20250514";
const DEFAULT_ADVISOR_URL: &str = "https://api.anthropic.com/v1/messages";
const DEFAULT_ADVISOR_TIMEOUT_SECS: u64 = 60;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Directory holding the state snapshot
    pub data_dir: PathBuf,
    /// Namespace key; the snapshot is stored as `<data_dir>/<key>.json`
    pub state_key: String,
    /// Chemistry advisor configuration (absent when no API key is set)
    pub advisor: Option<AdvisorConfig>,
    /// Log output format
    pub log_format: LogFormat,
}

/// Chemistry advisor (Anthropic Messages API) configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct AdvisorConfig {
    /// Anthropic API key
    pub api_key: SecretString,
    /// Model ID (e.g., claude-sonnet-4-20250514)
    pub model: String,
    /// Messages endpoint
    pub endpoint: Url,
    /// Request timeout
    pub timeout: Duration,
}

impl std::fmt::Debug for AdvisorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdvisorConfig")
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .field("endpoint", &self.endpoint.as_str())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl AdvisorConfig {
    /// Build a configuration with default model, endpoint and timeout.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if the built-in endpoint fails to
    /// parse, which only happens if the constant is edited incorrectly.
    pub fn with_defaults(api_key: SecretString) -> Result<Self, ConfigError> {
        Ok(Self {
            api_key,
            model: DEFAULT_ADVISOR_MODEL.to_string(),
            endpoint: parse_url("NEUPOOL_ADVISOR_URL", DEFAULT_ADVISOR_URL)?,
            timeout: Duration::from_secs(DEFAULT_ADVISOR_TIMEOUT_SECS),
        })
    }

    /// Load advisor configuration from environment.
    ///
    /// Returns `Ok(None)` if `ANTHROPIC_API_KEY` is not set.
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let Some(key) = get_optional_env("ANTHROPIC_API_KEY") else {
            return Ok(None);
        };
        validate_secret_strength(&key, "ANTHROPIC_API_KEY")?;

        let endpoint = parse_url(
            "NEUPOOL_ADVISOR_URL",
            &get_env_or_default("NEUPOOL_ADVISOR_URL", DEFAULT_ADVISOR_URL),
        )?;
        let timeout_secs = get_env_or_default(
            "NEUPOOL_ADVISOR_TIMEOUT_SECS",
            &DEFAULT_ADVISOR_TIMEOUT_SECS.to_string(),
        )
        .parse::<u64>()
        .map_err(|e| {
            ConfigError::InvalidEnvVar("NEUPOOL_ADVISOR_TIMEOUT_SECS".to_string(), e.to_string())
        })?;

        Ok(Some(Self {
            api_key: SecretString::from(key),
            model: get_env_or_default("NEUPOOL_ADVISOR_MODEL", DEFAULT_ADVISOR_MODEL),
            endpoint,
            timeout: Duration::from_secs(timeout_secs),
        }))
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is malformed or the API key fails
    /// validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let data_dir = PathBuf::from(get_env_or_default("NEUPOOL_DATA_DIR", DEFAULT_DATA_DIR));
        let state_key = get_env_or_default("NEUPOOL_STATE_KEY", DEFAULT_STATE_KEY);
        validate_state_key(&state_key)?;

        let advisor = AdvisorConfig::from_env()?;
        let log_format = match get_optional_env("NEUPOOL_LOG_FORMAT").as_deref() {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Text,
        };

        Ok(Self {
            data_dir,
            state_key,
            advisor,
            log_format,
        })
    }

    /// Configuration rooted at `data_dir` with defaults and no advisor.
    #[must_use]
    pub fn local(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            state_key: DEFAULT_STATE_KEY.to_string(),
            advisor: None,
            log_format: LogFormat::Text,
        }
    }

    /// Path of the state snapshot file.
    #[must_use]
    pub fn state_path(&self) -> PathBuf {
        self.data_dir.join(format!("{}.json", self.state_key))
    }

    /// Returns a reference to the advisor configuration, if available.
    ///
    /// Returns `None` if `ANTHROPIC_API_KEY` was not set, which disables
    /// recommendations.
    #[must_use]
    pub const fn advisor(&self) -> Option<&AdvisorConfig> {
        self.advisor.as_ref()
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

fn parse_url(key: &str, value: &str) -> Result<Url, ConfigError> {
    Url::parse(value).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// The key becomes a file name, so it must not contain path separators.
fn validate_state_key(key: &str) -> Result<(), ConfigError> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(ConfigError::InvalidEnvVar(
            "NEUPOOL_STATE_KEY".to_string(),
            format!("'{key}' may only contain letters, digits, '-' and '_'"),
        ))
    }
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    // Real API keys have high entropy
    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use the key issued by the provider."
            ),
        ));
    }

    Ok(())
}
