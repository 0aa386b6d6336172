use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::fingerprint::DEFAULT_TRACKED_FILES;
use crate::orchestrator::Protocol;
use crate::presets::{DEFAULT_BUILD_PRESET, DEFAULT_CONFIGURE_PRESET};

/// Complete cmk configuration (loaded from `cmk.toml`)
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct CmkConfig {
    #[serde(default)]
    pub build: BuildConfig,

    #[serde(default)]
    pub presets: PresetsConfig,

    #[serde(default)]
    pub tracking: TrackingConfig,
}

/// External tool and build tree
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BuildConfig {
    /// CMake binary (resolved on PATH)
    #[serde(default = "default_cmake")]
    pub cmake: String,

    /// Build output directory, relative to the project root
    #[serde(default = "default_build_dir")]
    pub dir: String,

    /// File inside the build directory that marks a configured tree
    #[serde(default = "default_marker")]
    pub marker: String,

    /// configure-then-build or configure-only
    #[serde(default)]
    pub protocol: Protocol,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            cmake: default_cmake(),
            dir: default_build_dir(),
            marker: default_marker(),
            protocol: Protocol::default(),
        }
    }
}

/// Preset dotfiles and their fallbacks
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PresetsConfig {
    #[serde(default = "default_configure_file")]
    pub configure_file: String,

    #[serde(default = "default_build_file")]
    pub build_file: String,

    #[serde(default = "default_configure_preset")]
    pub default_configure: String,

    #[serde(default = "default_build_preset")]
    pub default_build: String,
}

impl Default for PresetsConfig {
    fn default() -> Self {
        Self {
            configure_file: default_configure_file(),
            build_file: default_build_file(),
            default_configure: default_configure_preset(),
            default_build: default_build_preset(),
        }
    }
}

/// Which files feed the fingerprint and where it is cached
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrackingConfig {
    /// Tracked files, in fingerprint order
    #[serde(default = "default_tracked_files")]
    pub files: Vec<String>,

    /// Fingerprint cache dotfile
    #[serde(default = "default_stamp_file")]
    pub stamp_file: String,

    /// Opt-in file of extra configure arguments, one per line
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args_file: Option<String>,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            files: default_tracked_files(),
            stamp_file: default_stamp_file(),
            args_file: None,
        }
    }
}

fn default_cmake() -> String {
    "cmake".to_string()
}

fn default_build_dir() -> String {
    "build".to_string()
}

fn default_marker() -> String {
    "CMakeCache.txt".to_string()
}

fn default_configure_file() -> String {
    ".cpreset".to_string()
}

fn default_build_file() -> String {
    ".bpreset".to_string()
}

fn default_configure_preset() -> String {
    DEFAULT_CONFIGURE_PRESET.to_string()
}

fn default_build_preset() -> String {
    DEFAULT_BUILD_PRESET.to_string()
}

fn default_tracked_files() -> Vec<String> {
    DEFAULT_TRACKED_FILES.iter().map(|s| s.to_string()).collect()
}

fn default_stamp_file() -> String {
    ".ts".to_string()
}

impl CmkConfig {
    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        Self::from_toml(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Generate example configuration as TOML string
    pub fn example() -> Result<String> {
        let config = CmkConfig {
            build: BuildConfig {
                dir: "out/build".to_string(),
                ..Default::default()
            },
            ..Default::default()
        };

        toml::to_string_pretty(&config).context("Failed to serialize example config")
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.build.cmake.trim().is_empty() {
            anyhow::bail!("build.cmake must be set");
        }

        if self.build.dir.trim().is_empty() {
            anyhow::bail!("build.dir must be set");
        }

        if self.build.marker.trim().is_empty() {
            anyhow::bail!("build.marker must be set");
        }

        if self.presets.default_configure.trim().is_empty()
            || self.presets.default_build.trim().is_empty()
        {
            anyhow::bail!("presets.default_configure and presets.default_build must be non-empty");
        }

        if self.tracking.stamp_file.trim().is_empty() {
            anyhow::bail!("tracking.stamp_file must be set");
        }

        // The stamp is written after every configure; tracking it would never settle
        if self.tracking.files.contains(&self.tracking.stamp_file) {
            anyhow::bail!(
                "tracking.files must not contain the stamp file: {}",
                self.tracking.stamp_file
            );
        }

        Ok(())
    }
}
