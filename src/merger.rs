/// Configuration merger: CLI args > Env vars > Config file > Defaults
///
/// Environment variables are folded into the CLI values by clap (`env = ...`),
/// so merging only has to layer the parsed arguments over the config file.
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::cli::{BuildArgs, CommonArgs};
use crate::config::CmkConfig;
use crate::fingerprint::TrackedFiles;
use crate::orchestrator::{Layout, Protocol};

/// Fully resolved settings for one invocation
#[derive(Debug, Clone)]
pub struct MergedConfig {
    pub root: PathBuf,
    pub layout: Layout,
    pub protocol: Protocol,
}

impl MergedConfig {
    /// Merge configuration from CLI args and config file
    pub fn merge(common: &CommonArgs, root: &Path, file: &CmkConfig) -> Self {
        let build_dir = common
            .build_dir
            .clone()
            .unwrap_or_else(|| file.build.dir.clone());
        let cmake = common
            .cmake
            .clone()
            .unwrap_or_else(|| file.build.cmake.clone());

        let layout = Layout {
            cmake,
            root: root.to_path_buf(),
            build_dir: PathBuf::from(build_dir),
            marker: PathBuf::from(&file.build.marker),
            stamp_file: PathBuf::from(&file.tracking.stamp_file),
            args_file: file.tracking.args_file.as_ref().map(PathBuf::from),
            configure_preset_file: PathBuf::from(&file.presets.configure_file),
            build_preset_file: PathBuf::from(&file.presets.build_file),
            default_configure_preset: file.presets.default_configure.clone(),
            default_build_preset: file.presets.default_build.clone(),
            tracked: TrackedFiles::new(file.tracking.files.iter()),
        };

        Self {
            root: root.to_path_buf(),
            layout,
            protocol: file.build.protocol,
        }
    }

    /// Apply `build` command flags on top of the merged protocol
    pub fn with_build_args(mut self, args: &BuildArgs) -> Result<Self> {
        if args.configure_only {
            self.protocol = Protocol::ConfigureOnly;
        } else if let Some(protocol) = &args.protocol {
            self.protocol = protocol
                .parse()
                .with_context(|| format!("Invalid --protocol value: {}", protocol))?;
        }
        Ok(self)
    }
}

/// Resolve the project root from `-C`, defaulting to the current directory
pub fn project_root(common: &CommonArgs) -> Result<PathBuf> {
    match &common.directory {
        Some(dir) => Ok(PathBuf::from(dir)),
        None => std::env::current_dir().context("Failed to get current directory"),
    }
}
