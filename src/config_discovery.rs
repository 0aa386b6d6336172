use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::config::CmkConfig;

pub const CONFIG_FILE_NAME: &str = "cmk.toml";

/// Global configuration path
///
/// Respects `XDG_CONFIG_HOME`, falling back to `~/.config/cmk/config.toml`.
pub fn global_config_path() -> Option<PathBuf> {
    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
        Some(PathBuf::from(xdg_config).join("cmk").join("config.toml"))
    } else {
        dirs::home_dir().map(|home| home.join(".config").join("cmk").join("config.toml"))
    }
}

/// Discovers cmk configuration by traversing up the directory tree
pub fn discover_config(start_dir: &Path) -> Result<Option<PathBuf>> {
    let mut current = start_dir.to_path_buf();

    loop {
        let config_path = current.join(CONFIG_FILE_NAME);
        if config_path.is_file() {
            return Ok(Some(config_path));
        }

        match current.parent() {
            Some(parent) => current = parent.to_path_buf(),
            None => break,
        }
    }

    if let Some(global_config) = global_config_path() {
        if global_config.is_file() {
            return Ok(Some(global_config));
        }
    }

    Ok(None)
}

/// Loads configuration with auto-discovery support
///
/// An explicit path must exist. Otherwise the nearest `cmk.toml` above
/// `project_root` (or the global config) is used, and built-in defaults
/// when nothing is found.
pub fn load_config_with_discovery(
    explicit_path: Option<&Path>,
    project_root: &Path,
) -> Result<(CmkConfig, Option<PathBuf>)> {
    if let Some(config_path) = explicit_path {
        let config = CmkConfig::from_file(config_path)?;
        return Ok((config, Some(config_path.to_path_buf())));
    }

    let start = project_root
        .canonicalize()
        .with_context(|| format!("Failed to resolve project root: {}", project_root.display()))?;

    match discover_config(&start)? {
        Some(config_path) => {
            info!(config = %config_path.display(), "using config");
            let config = CmkConfig::from_file(&config_path)?;
            Ok((config, Some(config_path)))
        }
        None => {
            debug!("no configuration file found, using defaults");
            Ok((CmkConfig::default(), None))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_discover_config_finds_nearest() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();

        let project = root.join("project");
        let subdir = project.join("subdir");
        fs::create_dir_all(&subdir).unwrap();

        let config_path = project.join("cmk.toml");
        fs::write(&config_path, "# test config").unwrap();

        let found = discover_config(&subdir).unwrap();
        assert_eq!(found, Some(config_path));
    }

    #[test]
    fn test_discover_config_prefers_innermost() {
        let temp = TempDir::new().unwrap();
        let outer = temp.path().join("outer");
        let inner = outer.join("inner");
        fs::create_dir_all(&inner).unwrap();

        fs::write(outer.join("cmk.toml"), "").unwrap();
        fs::write(inner.join("cmk.toml"), "").unwrap();

        let found = discover_config(&inner).unwrap();
        assert_eq!(found, Some(inner.join("cmk.toml")));
    }

    #[test]
    #[serial]
    fn test_global_config_fallback() {
        let temp = TempDir::new().unwrap();
        let xdg = temp.path().join("xdg");
        let global = xdg.join("cmk").join("config.toml");
        fs::create_dir_all(global.parent().unwrap()).unwrap();
        fs::write(&global, "[build]\ndir = \"global-build\"\n").unwrap();

        let project = temp.path().join("project");
        fs::create_dir_all(&project).unwrap();

        let previous = std::env::var_os("XDG_CONFIG_HOME");
        std::env::set_var("XDG_CONFIG_HOME", &xdg);

        let (config, path) = load_config_with_discovery(None, &project).unwrap();

        match previous {
            Some(value) => std::env::set_var("XDG_CONFIG_HOME", value),
            None => std::env::remove_var("XDG_CONFIG_HOME"),
        }

        assert_eq!(path, Some(global));
        assert_eq!(config.build.dir, "global-build");
    }

    #[test]
    fn test_explicit_config_must_exist() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("nope.toml");
        assert!(load_config_with_discovery(Some(&missing), temp.path()).is_err());
    }
}
