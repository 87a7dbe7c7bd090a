//! `awire manifest` — Emit the JSON manifest.

use std::path::PathBuf;

use appwire_common::config::AppwireConfig;
use appwire_compose::manifest::write_manifest;
use clap::Args;

/// Arguments for the `manifest` command.
#[derive(Args, Debug)]
pub struct ManifestArgs {
    /// Path to the app file.
    #[arg(default_value = "appwire.yaml")]
    pub file: PathBuf,

    /// Write output to a file instead of stdout.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Executes the `manifest` command.
///
/// # Errors
///
/// Returns an error if the app file cannot be loaded or the manifest
/// cannot be written.
pub fn execute(args: ManifestArgs, config: &AppwireConfig) -> anyhow::Result<()> {
    let model = crate::commands::load_model(&args.file)?;
    let manifest = write_manifest(&model, config)?;
    let rendered = serde_json::to_string_pretty(&manifest)?;

    if let Some(ref out_path) = args.output {
        std::fs::write(out_path, format!("{rendered}\n"))?;
        tracing::info!(path = %out_path.display(), "manifest written");
        println!("Manifest written to {}", out_path.display());
    } else {
        println!("{rendered}");
    }
    Ok(())
}
