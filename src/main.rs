//! Reviewloop CLI entry point.

use clap::Parser;

use reviewloop::cli::{commands, handle_error, load_config, Cli, Commands};
use reviewloop::infrastructure::logging::LoggerImpl;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Logging follows the configured level when the config loads; commands
    // report configuration errors themselves.
    let logging = load_config(cli.config.as_deref())
        .map(|config| config.logging)
        .unwrap_or_default();
    let _logger = match LoggerImpl::init(&logging) {
        Ok(logger) => Some(logger),
        Err(err) => {
            eprintln!("Warning: logging disabled: {err:#}");
            None
        }
    };

    let config_path = cli.config.as_deref();
    let result = match cli.command {
        Commands::Review(args) => commands::review::execute(args, config_path, cli.json).await,
        Commands::Config(args) => commands::config::execute(args, config_path, cli.json).await,
    };

    if let Err(err) = result {
        handle_error(err, cli.json);
    }
}
