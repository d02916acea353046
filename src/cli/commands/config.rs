//! Implementation of the `reviewloop config` commands.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use serde::Serialize;

use crate::cli::load_config;
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::Config;

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print the effective configuration after all layers are merged
    Show,

    /// Check that configuration loads and passes validation
    Validate {
        /// Validate this file instead of the effective configuration
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

#[derive(Debug, Serialize)]
pub struct ConfigShowOutput {
    pub config: Config,
}

impl CommandOutput for ConfigShowOutput {
    fn to_human(&self) -> String {
        serde_yaml::to_string(&self.config)
            .unwrap_or_else(|e| format!("Failed to render configuration: {e}"))
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(&self.config).unwrap_or_default()
    }
}

#[derive(Debug, Serialize)]
pub struct ConfigValidateOutput {
    pub valid: bool,
    pub source: String,
    pub max_iterations: u32,
    pub similarity_threshold: f64,
    pub model: String,
}

impl CommandOutput for ConfigValidateOutput {
    fn to_human(&self) -> String {
        [
            format!("Configuration from {} is valid", self.source),
            format!("  max_iterations: {}", self.max_iterations),
            format!("  similarity_threshold: {}", self.similarity_threshold),
            format!("  model: {}", self.model),
        ]
        .join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(
    args: ConfigArgs,
    config_path: Option<&Path>,
    json_mode: bool,
) -> Result<()> {
    match args.command {
        ConfigCommands::Show => {
            let config = load_config(config_path).context("Failed to load configuration")?;
            output(&ConfigShowOutput { config }, json_mode);
        }
        ConfigCommands::Validate { file } => {
            let path = file.as_deref().or(config_path);
            let result = validate(path)?;
            output(&result, json_mode);
        }
    }
    Ok(())
}

fn validate(path: Option<&Path>) -> Result<ConfigValidateOutput> {
    let config = load_config(path).context("Configuration is invalid")?;
    let source = path.map_or_else(
        || ".reviewloop/ (with environment overrides)".to_string(),
        |p| p.display().to_string(),
    );

    Ok(ConfigValidateOutput {
        valid: true,
        source,
        max_iterations: config.review.max_iterations,
        similarity_threshold: config.review.similarity_threshold,
        model: config.evaluator.model,
    })
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_validate_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "review:\n  max_iterations: 3\n").unwrap();

        let result = validate(Some(&path)).unwrap();
        assert!(result.valid);
        assert_eq!(result.max_iterations, 3);
        assert!(result.to_human().contains("is valid"));
    }

    #[test]
    fn test_validate_rejects_bad_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "review:\n  similarity_threshold: 2.5\n").unwrap();

        let err = validate(Some(&path)).unwrap_err();
        assert!(format!("{err:#}").contains("similarity_threshold"));
    }

    #[test]
    fn test_show_output_hides_api_key() {
        let mut config = Config::default();
        config.evaluator.api_key = Some("sk-secret".to_string());
        let out = ConfigShowOutput { config };

        assert!(!out.to_human().contains("sk-secret"));
        assert!(!out.to_json().to_string().contains("sk-secret"));
        assert_eq!(out.to_json()["review"]["max_iterations"], 5);
    }
}
