//! CLI argument parsing using clap derive API
//!
//! This module defines the command-line interface structure using clap's derive macros.
//! It is purely declarative with no side effects or I/O.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Config file used when `--config` is not given.
pub const DEFAULT_CONFIG_PATH: &str = "stagehand.toml";

/// Stagehand -- scripted lifecycle scenarios for containerized services.
///
/// Use `stagehand <COMMAND> --help` for subcommand details.
#[derive(Parser, Debug)]
#[command(name = "stagehand", version, about, long_about = None)]
pub struct Cli {
    /// Path to the stagehand.toml configuration file [default: stagehand.toml].
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Output format.
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Effective config path and whether it was given explicitly.
    pub fn config_path(&self) -> (PathBuf, bool) {
        match &self.config {
            Some(path) => (path.clone(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_PATH), false),
        }
    }
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table / text output.
    Text,
    /// Machine-readable JSON.
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a built-in workflow or a scenario file.
    Run(ScenarioArgs),

    /// List built-in workflows.
    List,

    /// Validate a scenario without touching the container runtime.
    Validate(ScenarioArgs),

    /// Remove every service container of a scenario.
    Down(ScenarioArgs),

    /// Manage configuration.
    Config(ConfigArgs),
}

// ---- run / validate / down ----

/// Selects a scenario: a built-in workflow name or a TOML file.
#[derive(Args, Debug)]
pub struct ScenarioArgs {
    /// Built-in workflow name (see `stagehand list`).
    #[arg(required_unless_present = "file", conflicts_with = "file")]
    pub workflow: Option<String>,

    /// Scenario TOML file.
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Host directory with test scripts (default: `scenario.scripts_dir`).
    #[arg(long)]
    pub scripts: Option<PathBuf>,
}

// ---- config ----

/// Manage stagehand configuration.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Validate the configuration file and report errors.
    Validate,
    /// Show the effective configuration (file + env overrides + defaults).
    Show {
        /// Show only a specific section (general, runtime, scenario).
        #[arg(long)]
        section: Option<String>,
    },
}
