//! CLI command definitions and dispatch.

pub mod env;
pub mod manifest;
pub mod plan;

use std::path::{Path, PathBuf};

use appwire_common::config::AppwireConfig;
use appwire_compose::AppModel;
use appwire_compose::appfile::AppFile;
use clap::{Parser, Subcommand, ValueEnum};

/// appwire — wire application resources together through environment variables.
#[derive(Parser, Debug)]
#[command(name = "awire", version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Configuration file providing connection strings and allocation defaults.
    #[arg(long, global = true, env = "APPWIRE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log output format.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines.
    Text,
    /// One JSON object per event.
    Json,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Populate and print resource environments.
    Env(env::EnvArgs),
    /// Emit the JSON manifest.
    Manifest(manifest::ManifestArgs),
    /// Show dependency order and relationships.
    Plan(plan::PlanArgs),
}

/// Dispatches the parsed CLI command to its handler.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn execute(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(cli.config.as_deref())?;
    match cli.command {
        Command::Env(args) => env::execute(args, &config),
        Command::Manifest(args) => manifest::execute(args, &config),
        Command::Plan(args) => plan::execute(args),
    }
}

/// Loads the configuration file (if any) and overlays process environment
/// connection strings.
fn load_config(path: Option<&Path>) -> anyhow::Result<AppwireConfig> {
    let config = match path {
        Some(path) => AppwireConfig::load(path)?,
        None => AppwireConfig::default(),
    };
    Ok(config.with_env_overrides(std::env::vars()))
}

/// Reads an app file and builds its model.
pub(crate) fn load_model(path: &Path) -> anyhow::Result<AppModel> {
    if !path.exists() {
        anyhow::bail!("file not found: {}", path.display());
    }
    Ok(AppFile::load(path)?.into_model()?)
}
