use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Main configuration structure for reviewloop
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Review loop policy
    #[serde(default)]
    pub review: ReviewConfiguration,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Evaluator backend configuration
    #[serde(default)]
    pub evaluator: EvaluatorConfig,

    /// In-memory session store configuration
    #[serde(default)]
    pub session_store: SessionStoreConfig,
}

/// Process-wide review policy. Read-only once loaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ReviewConfiguration {
    /// Maximum review rounds per session before falling back
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// Stop iterating when recent feedback stops changing
    #[serde(default = "default_true")]
    pub enable_convergence_detection: bool,

    /// Feedback similarity at or above which two rounds count as repeated
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,

    /// Consumed by the outer caller, not by the review loop itself
    #[serde(default)]
    pub auto_fix: bool,

    /// Consumed by the outer caller, not by the review loop itself
    #[serde(default = "default_true")]
    pub rollback_enabled: bool,

    /// Consumed by the outer caller, not by the review loop itself
    #[serde(default)]
    pub strict_mode: bool,
}

const fn default_max_iterations() -> u32 {
    5
}

const fn default_similarity_threshold() -> f64 {
    0.7
}

const fn default_true() -> bool {
    true
}

impl Default for ReviewConfiguration {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            enable_convergence_detection: true,
            similarity_threshold: default_similarity_threshold(),
            auto_fix: false,
            rollback_enabled: true,
            strict_mode: false,
        }
    }
}

/// Logging output format
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
}

/// Log file rotation policy
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RotationPolicy {
    #[default]
    Daily,
    Hourly,
    Never,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format for the console: json or pretty
    #[serde(default = "default_log_format")]
    pub format: LogFormat,

    /// Directory for rolling JSON log files (console only if unset)
    #[serde(default)]
    pub log_dir: Option<PathBuf>,

    /// Log file rotation
    #[serde(default)]
    pub rotation: RotationPolicy,
}

fn default_log_level() -> String {
    "warn".to_string()
}

const fn default_log_format() -> LogFormat {
    LogFormat::Pretty
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
            rotation: RotationPolicy::default(),
        }
    }
}

/// Evaluator (Anthropic Messages API) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct EvaluatorConfig {
    /// API key (read from ANTHROPIC_API_KEY if not set)
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    /// API base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model used for reviews
    #[serde(default = "default_model")]
    pub model: String,

    /// anthropic-version header
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Max tokens to generate
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_base_url() -> String {
    "https://api.anthropic.com".to_string()
}

fn default_model() -> String {
    "claude-sonnet-4-5-20250929".to_string()
}

fn default_api_version() -> String {
    "2023-06-01".to_string()
}

const fn default_timeout_secs() -> u64 {
    300
}

const fn default_max_tokens() -> u32 {
    4096
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            model: default_model(),
            api_version: default_api_version(),
            timeout_secs: default_timeout_secs(),
            max_tokens: default_max_tokens(),
        }
    }
}

impl EvaluatorConfig {
    /// Get API key from config or environment.
    pub fn get_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|key| !key.is_empty())
            .or_else(|| std::env::var("ANTHROPIC_API_KEY").ok())
    }

    /// Create config with explicit API key.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Create config with a different base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

/// Session store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SessionStoreConfig {
    /// Maximum live sessions before the least recently used idle one is
    /// evicted (0 = unbounded)
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
}

const fn default_max_sessions() -> usize {
    1024
}

impl Default for SessionStoreConfig {
    fn default() -> Self {
        Self {
            max_sessions: default_max_sessions(),
        }
    }
}
