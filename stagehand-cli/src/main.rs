//! Stagehand CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use tracing::debug;

use stagehand_cli::cli::{Cli, Commands};
use stagehand_cli::commands;
use stagehand_cli::error::CliError;
use stagehand_cli::logging;
use stagehand_cli::output::OutputWriter;
use stagehand_core::config::{GeneralConfig, StagehandConfig};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(u8::try_from(e.exit_code()).unwrap_or(1))
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let (config_path, explicit) = cli.config_path();

    let loaded = if explicit {
        StagehandConfig::load(&config_path).await
    } else {
        StagehandConfig::load_or_default(&config_path).await
    };

    // `config validate` reports a broken file itself instead of failing here.
    let config = match loaded {
        Ok(config) => config,
        Err(_) if matches!(cli.command, Commands::Config(_)) => StagehandConfig::default(),
        Err(e) => {
            logging::init_tracing(&GeneralConfig::default(), cli.log_level.as_deref())?;
            return Err(e.into());
        }
    };

    logging::init_tracing(&config.general, cli.log_level.as_deref())?;
    stagehand_core::metrics::describe_all();
    debug!(path = %config_path.display(), explicit, "configuration resolved");

    let writer = OutputWriter::new(cli.output);
    commands::dispatch(cli.command, &config, &config_path, &writer).await
}
