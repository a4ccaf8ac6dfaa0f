//! Factory preset listing and export.

use anyhow::Context;
use clap::Args;
use polyvox_config::{ConfigError, factory_preset, factory_preset_names};
use std::path::Path;

#[derive(Args)]
pub struct PresetsArgs {
    /// Write factory preset NAME to PATH (.toml or .json)
    #[arg(long, num_args = 2, value_names = ["NAME", "PATH"])]
    export: Option<Vec<String>>,
}

pub fn run(args: PresetsArgs) -> anyhow::Result<()> {
    match args.export.as_deref() {
        Some([name, path]) => export(name, Path::new(path)),
        Some(_) => anyhow::bail!("--export takes a preset name and a path"),
        None => {
            list();
            Ok(())
        }
    }
}

fn list() {
    println!("Factory Presets:");
    println!("================");
    for id in factory_preset_names() {
        if let Some(patch) = factory_preset(id) {
            let desc = patch.description.as_deref().unwrap_or("");
            println!("  {:12} {:12} - {}", id, patch.name, desc);
        }
    }
    println!();
    println!("Use with: polyvox render out.wav --preset <name>");
}

fn export(name: &str, path: &Path) -> anyhow::Result<()> {
    let patch = factory_preset(name).ok_or_else(|| ConfigError::PresetNotFound(name.to_string()))?;
    patch
        .save(path)
        .with_context(|| format!("exporting '{}' to {}", name, path.display()))?;
    println!("Exported {} to {}", patch.name, path.display());
    Ok(())
}
