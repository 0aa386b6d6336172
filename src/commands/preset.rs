use anyhow::{Context, Result};
use std::path::Path;

use crate::cli::{CommonArgs, PresetArgs};
use crate::cli_utils::cmk_prefix;
use crate::presets::PresetSelection;
use crate::store::Workspace;

/// Show the preset selection, or write the dotfiles for the given flags
///
/// Both dotfiles are tracked, so changing a preset triggers a reconfigure.
pub fn run(common: &CommonArgs, args: &PresetArgs) -> Result<i32> {
    let merged = super::prepare(common)?;
    let workspace = super::workspace(&merged);
    let layout = &merged.layout;

    if args.configure.is_none() && args.build.is_none() {
        let selection = PresetSelection::load(&workspace, &layout.preset_sources());
        println!("configure: {}", selection.configure);
        println!("build:     {}", selection.build);
        return Ok(0);
    }

    if let Some(name) = &args.configure {
        write_preset(&workspace, &layout.configure_preset_file, name)?;
    }
    if let Some(name) = &args.build {
        write_preset(&workspace, &layout.build_preset_file, name)?;
    }

    Ok(0)
}

fn write_preset(workspace: &dyn Workspace, path: &Path, name: &str) -> Result<()> {
    let name = name.trim();
    if name.is_empty() || name.contains('\n') {
        anyhow::bail!("Invalid preset name: {:?}", name);
    }

    workspace
        .write(path, &format!("{}\n", name))
        .with_context(|| format!("Failed to write {}", path.display()))?;
    eprintln!("{} {} -> {}", cmk_prefix(), path.display(), name);
    Ok(())
}
