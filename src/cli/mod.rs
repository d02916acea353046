//! Command-line interface for `reviewloop`.

pub mod commands;
pub mod output;
pub mod types;

use std::path::Path;

use anyhow::Result;

use crate::domain::models::Config;
use crate::infrastructure::config::ConfigLoader;

pub use types::{Cli, Commands};

/// Load configuration from an explicit file, or from `.reviewloop/` in the
/// current directory.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => ConfigLoader::load_from_file(path),
        None => ConfigLoader::load(),
    }
}

/// Report a command failure and exit with status 1.
///
/// In JSON mode the error and its cause chain go to stdout as a JSON object
/// so scripted callers can parse them; otherwise they go to stderr.
pub fn handle_error(err: anyhow::Error, json_mode: bool) -> ! {
    let causes: Vec<String> = err.chain().skip(1).map(ToString::to_string).collect();

    if json_mode {
        let body = serde_json::json!({
            "success": false,
            "error": err.to_string(),
            "causes": causes,
        });
        let rendered = serde_json::to_string_pretty(&body).unwrap_or_default();
        println!("{rendered}");
    } else {
        eprintln!("Error: {err}");
        for cause in &causes {
            eprintln!("  caused by: {cause}");
        }
    }

    std::process::exit(1);
}
