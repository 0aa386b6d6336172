pub mod build;
pub mod clean;
pub mod config;
pub mod configure;
pub mod preset;
pub mod status;

use anyhow::Result;
use tracing::debug;

use crate::cli::CommonArgs;
use crate::config_discovery::load_config_with_discovery;
use crate::merger::{project_root, MergedConfig};
use crate::store::FsWorkspace;

/// Load, validate and merge configuration for a command
pub(crate) fn prepare(common: &CommonArgs) -> Result<MergedConfig> {
    let root = project_root(common)?;
    let explicit = common.config.as_deref().map(std::path::Path::new);
    let (config, path) = load_config_with_discovery(explicit, &root)?;
    config.validate()?;

    debug!(
        root = %root.display(),
        config = ?path,
        "configuration loaded"
    );

    Ok(MergedConfig::merge(common, &root, &config))
}

pub(crate) fn workspace(merged: &MergedConfig) -> FsWorkspace {
    FsWorkspace::new(&merged.root)
}
