//! `awire env` — Populate and print resource environments.

use std::path::PathBuf;

use appwire_common::config::AppwireConfig;
use appwire_common::types::PublishMode;
use appwire_compose::allocate::allocate_endpoints;
use appwire_compose::{populate_all, populate_environment};
use clap::{Args, ValueEnum};

use crate::output::format_env;

/// Publish mode selectable on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    /// Resolve concrete values.
    Run,
    /// Emit manifest placeholders.
    Manifest,
}

impl From<ModeArg> for PublishMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Run => Self::Run,
            ModeArg::Manifest => Self::Manifest,
        }
    }
}

/// Arguments for the `env` command.
#[derive(Args, Debug)]
pub struct EnvArgs {
    /// Path to the app file.
    #[arg(default_value = "appwire.yaml")]
    pub file: PathBuf,

    /// Publish mode to populate for.
    #[arg(long, value_enum, default_value_t = ModeArg::Run)]
    pub mode: ModeArg,

    /// Only print this resource.
    #[arg(long)]
    pub resource: Option<String>,
}

/// Executes the `env` command.
///
/// In run mode, endpoints are allocated for every declared binding before
/// population.
///
/// # Errors
///
/// Returns an error if loading, allocation, or population fails.
pub fn execute(args: EnvArgs, config: &AppwireConfig) -> anyhow::Result<()> {
    let mode = PublishMode::from(args.mode);
    let mut model = crate::commands::load_model(&args.file)?;
    if mode == PublishMode::Run {
        let _ = allocate_endpoints(&mut model, config)?;
    }

    if let Some(name) = args.resource {
        let Some(resource) = model.find(&name) else {
            anyhow::bail!("resource not found: {name}");
        };
        let env = populate_environment(&model, resource.id(), mode, config)?;
        print!("{}", format_env(&env));
        return Ok(());
    }

    for (name, env) in populate_all(&model, mode, config)? {
        println!("# {name}");
        print!("{}", format_env(&env));
    }
    Ok(())
}
