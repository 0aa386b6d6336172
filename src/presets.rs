/// Preset dotfiles and extra configure arguments
use std::path::Path;

use serde::Serialize;
use tracing::debug;

use crate::store::Workspace;

pub const DEFAULT_CONFIGURE_PRESET: &str = "debug";
pub const DEFAULT_BUILD_PRESET: &str = "test";

/// Read a whole file, or return `default` on any failure
pub fn read_or_default(workspace: &dyn Workspace, path: &Path, default: &str) -> String {
    match workspace.read(path) {
        Ok(content) => content,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "using default for unreadable file");
            default.to_string()
        }
    }
}

/// Read the first line of a file, or return `default`
///
/// A file whose first line is blank also yields `default`, so an empty
/// `.cpreset` never turns into `--preset ""`.
pub fn read_first_line_or_default(workspace: &dyn Workspace, path: &Path, default: &str) -> String {
    let content = read_or_default(workspace, path, default);
    match content.lines().next().map(str::trim) {
        Some(line) if !line.is_empty() => line.to_string(),
        _ => default.to_string(),
    }
}

/// Extra arguments for the configure step, one per non-empty line
pub fn read_extra_args(workspace: &dyn Workspace, path: &Path) -> Vec<String> {
    read_or_default(workspace, path, "")
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Configure and build preset names in effect for one run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PresetSelection {
    pub configure: String,
    pub build: String,
}

/// Where preset names come from and what they fall back to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresetSources<'a> {
    pub configure_file: &'a Path,
    pub build_file: &'a Path,
    pub default_configure: &'a str,
    pub default_build: &'a str,
}

impl PresetSelection {
    pub fn load(workspace: &dyn Workspace, sources: &PresetSources<'_>) -> Self {
        Self {
            configure: read_first_line_or_default(
                workspace,
                sources.configure_file,
                sources.default_configure,
            ),
            build: read_first_line_or_default(workspace, sources.build_file, sources.default_build),
        }
    }
}
