//! `awire plan` — Show dependency order and relationships.

use std::path::PathBuf;

use appwire_compose::graph::DependencyGraph;
use clap::Args;

/// Arguments for the `plan` command.
#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Path to the app file.
    #[arg(default_value = "appwire.yaml")]
    pub file: PathBuf,
}

/// Executes the `plan` command.
///
/// # Errors
///
/// Returns an error if loading fails or the references form a cycle.
pub fn execute(args: PlanArgs) -> anyhow::Result<()> {
    let model = crate::commands::load_model(&args.file)?;
    let order = DependencyGraph::from_model(&model).resolve_order()?;

    println!("Start order for: {}", args.file.display());
    println!();
    for name in &order {
        let Some(resource) = model.find(name) else {
            continue;
        };
        println!("  + {name} ({})", resource.kind().manifest_type());
        for reference in resource.annotations().service_references() {
            let target = model.resource(reference.target())?.name();
            if reference.use_all_bindings() {
                println!("      -> {target} (all bindings)");
            } else {
                let names: Vec<&str> =
                    reference.binding_names().iter().map(String::as_str).collect();
                println!("      -> {target} ({})", names.join(", "));
            }
        }
    }
    println!();
    println!("  {} resource(s).", order.len());
    Ok(())
}
