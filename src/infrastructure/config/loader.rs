use std::path::Path;

use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::config::Config;

/// Project-local configuration directory.
pub const CONFIG_DIR: &str = ".reviewloop";

/// Prefix for environment variable overrides.
pub const ENV_PREFIX: &str = "REVIEWLOOP_";

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid max_iterations: {0}. Must be at least 1")]
    InvalidMaxIterations(u32),

    #[error("Invalid similarity_threshold: {0}. Must be greater than 0 and at most 1")]
    InvalidSimilarityThreshold(f64),

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Evaluator base_url cannot be empty")]
    EmptyBaseUrl,

    #[error("Evaluator model cannot be empty")]
    EmptyModel,

    #[error("Invalid evaluator max_tokens: {0}. Must be at least 1")]
    InvalidMaxTokens(u32),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for the current directory.
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .reviewloop/config.yaml (project config)
    /// 3. .reviewloop/local.yaml (project local overrides, optional)
    /// 4. Environment variables (REVIEWLOOP_* prefix, `__` for nesting)
    pub fn load() -> Result<Config> {
        Self::load_from_dir(".")
    }

    /// Load configuration rooted at `project_dir` instead of the current
    /// directory. Environment overrides still apply.
    pub fn load_from_dir(project_dir: impl AsRef<Path>) -> Result<Config> {
        let config_dir = project_dir.as_ref().join(CONFIG_DIR);

        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(config_dir.join("config.yaml")))
            .merge(Yaml::file(config_dir.join("local.yaml")))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Config> {
        let path = path.as_ref();
        if !path.exists() {
            anyhow::bail!("Config file not found: {}", path.display());
        }

        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path))
            .extract()
            .with_context(|| format!("Failed to load config from {}", path.display()))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        let review = &config.review;
        if review.max_iterations == 0 {
            return Err(ConfigError::InvalidMaxIterations(review.max_iterations));
        }

        let threshold = review.similarity_threshold;
        if !(threshold > 0.0 && threshold <= 1.0) {
            return Err(ConfigError::InvalidSimilarityThreshold(threshold));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        let level = config.logging.level.to_lowercase();
        if !valid_log_levels.contains(&level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let evaluator = &config.evaluator;
        if evaluator.base_url.trim().is_empty() {
            return Err(ConfigError::EmptyBaseUrl);
        }
        if evaluator.model.trim().is_empty() {
            return Err(ConfigError::EmptyModel);
        }
        if evaluator.max_tokens == 0 {
            return Err(ConfigError::InvalidMaxTokens(evaluator.max_tokens));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::config::{LogFormat, RotationPolicy};

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.review.max_iterations, 5);
        assert!(config.review.enable_convergence_detection);
        let threshold = config.review.similarity_threshold;
        assert!((threshold - 0.7).abs() < f64::EPSILON);
        assert!(!config.review.auto_fix);
        assert!(config.review.rollback_enabled);
        assert!(!config.review.strict_mode);
        assert_eq!(config.logging.level, "warn");
        assert_eq!(config.session_store.max_sessions, 1024);
        ConfigLoader::validate(&config).expect("Default config should be valid");
    }

    #[test]
    fn test_yaml_parsing() {
        let yaml = r"
review:
  max_iterations: 8
  similarity_threshold: 0.85
  enable_convergence_detection: false
logging:
  level: debug
  format: json
  rotation: hourly
evaluator:
  model: claude-haiku-4-5
  timeout_secs: 60
session_store:
  max_sessions: 16
";

        let config: Config = serde_yaml::from_str(yaml).expect("YAML should parse");

        assert_eq!(config.review.max_iterations, 8);
        let threshold = config.review.similarity_threshold;
        assert!((threshold - 0.85).abs() < f64::EPSILON);
        assert!(!config.review.enable_convergence_detection);
        assert!(config.review.rollback_enabled);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.logging.rotation, RotationPolicy::Hourly);
        assert_eq!(config.evaluator.model, "claude-haiku-4-5");
        assert_eq!(config.evaluator.timeout_secs, 60);
        assert_eq!(config.evaluator.base_url, "https://api.anthropic.com");
        assert_eq!(config.session_store.max_sessions, 16);

        ConfigLoader::validate(&config).expect("Parsed config should be valid");
    }

    #[test]
    fn test_validate_zero_iterations() {
        let mut config = Config::default();
        config.review.max_iterations = 0;

        assert!(matches!(
            ConfigLoader::validate(&config).unwrap_err(),
            ConfigError::InvalidMaxIterations(0)
        ));
    }

    #[test]
    fn test_validate_threshold_bounds() {
        for bad in [0.0, -0.5, 1.01, f64::NAN] {
            let mut config = Config::default();
            config.review.similarity_threshold = bad;
            assert!(
                matches!(
                    ConfigLoader::validate(&config),
                    Err(ConfigError::InvalidSimilarityThreshold(_))
                ),
                "threshold {bad} should be rejected"
            );
        }

        let mut config = Config::default();
        config.review.similarity_threshold = 1.0;
        assert!(ConfigLoader::validate(&config).is_ok());
    }

    #[test]
    fn test_validate_invalid_log_level() {
        let mut config = Config::default();
        config.logging.level = "invalid".to_string();

        match ConfigLoader::validate(&config).unwrap_err() {
            ConfigError::InvalidLogLevel(level) => assert_eq!(level, "invalid"),
            other => panic!("Expected InvalidLogLevel error, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_evaluator_fields() {
        let mut config = Config::default();
        config.evaluator.base_url = "  ".to_string();
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::EmptyBaseUrl)
        ));

        let mut config = Config::default();
        config.evaluator.model = String::new();
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::EmptyModel)
        ));

        let mut config = Config::default();
        config.evaluator.max_tokens = 0;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidMaxTokens(0))
        ));
    }

    #[test]
    fn test_api_key_is_never_serialized() {
        let mut config = Config::default();
        config.evaluator.api_key = Some("sk-secret".to_string());

        let yaml = serde_yaml::to_string(&config).unwrap();
        assert!(!yaml.contains("sk-secret"));
        assert!(!yaml.contains("api_key"));
    }
}
