use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

use crate::cli::{CommonArgs, ConfigCommands};
use crate::config::CmkConfig;
use crate::config_discovery::load_config_with_discovery;
use crate::merger::project_root;

pub fn run(common: &CommonArgs, command: &ConfigCommands) -> Result<i32> {
    match command {
        ConfigCommands::Validate { path } => validate(common, path.as_deref()),
        ConfigCommands::Generate => generate(),
        ConfigCommands::Show => show(common),
    }
}

fn validate(common: &CommonArgs, path: Option<&str>) -> Result<i32> {
    let root = project_root(common)?;
    let explicit = path.or(common.config.as_deref()).map(Path::new);
    let (config, source) = load_config_with_discovery(explicit, &root)?;

    let Some(source) = source else {
        anyhow::bail!("No cmk.toml found above {}", root.display());
    };

    info!(config = %source.display(), "validating config file");
    config.validate()?;

    println!("✓ Configuration file is valid: {}", source.display());
    println!("\nSummary:");
    println!("  - CMake: {}", config.build.cmake);
    println!("  - Build directory: {}", config.build.dir);
    println!(
        "  - Default presets: {} / {}",
        config.presets.default_configure, config.presets.default_build
    );
    println!("  - Tracked files: {}", config.tracking.files.len());

    Ok(0)
}

fn generate() -> Result<i32> {
    println!("{}", CmkConfig::example()?);
    Ok(0)
}

fn show(common: &CommonArgs) -> Result<i32> {
    let root = project_root(common)?;
    let explicit = common.config.as_deref().map(Path::new);
    let (mut config, source) = load_config_with_discovery(explicit, &root)?;

    // Reflect CLI/env overrides the same way the merger applies them
    if let Some(dir) = &common.build_dir {
        config.build.dir = dir.clone();
    }
    if let Some(cmake) = &common.cmake {
        config.build.cmake = cmake.clone();
    }

    match source {
        Some(path) => println!("# Effective configuration (from {})\n", path.display()),
        None => println!("# Effective configuration (built-in defaults)\n"),
    }
    println!(
        "{}",
        toml::to_string_pretty(&config).context("Failed to serialize configuration")?
    );

    Ok(0)
}
