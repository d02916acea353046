//! CLI type definitions
//!
//! This module contains clap command structures that define the CLI interface.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use super::commands::config::ConfigArgs;
use super::commands::review::ReviewArgs;

#[derive(Parser)]
#[command(name = "reviewloop")]
#[command(about = "Iterative LLM review of staged code changes", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Load configuration from this file instead of .reviewloop/
    #[arg(short, long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Review staged changes (or a diff file) with the configured evaluator
    Review(ReviewArgs),

    /// Inspect and validate configuration
    Config(ConfigArgs),
}
