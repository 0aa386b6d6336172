/// Reconfigure decision and the configure/build sequence
///
/// Each run computes a fresh fingerprint, decides whether CMake must be
/// re-configured, optionally runs the configure step, and then runs the build
/// step. The result is always a structured [`Outcome`]; turning it into a
/// process exit code is left to the caller.
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use tracing::{info, warn};

use crate::fingerprint::{compute_fingerprint, Fingerprint, TrackedFiles};
use crate::presets::{read_extra_args, read_or_default, PresetSelection, PresetSources};
use crate::runner::{CommandRunner, Invocation};
use crate::store::Workspace;

/// Exit code reported after a successful configure under [`Protocol::ConfigureOnly`]
pub const RECONFIGURED_EXIT_CODE: i32 = 1;

/// What happens after a successful configure step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Protocol {
    /// Stop with [`RECONFIGURED_EXIT_CODE`]; the build runs on the next invocation
    ConfigureOnly,
    /// Continue to the build step in the same invocation
    #[default]
    ConfigureThenBuild,
}

impl std::str::FromStr for Protocol {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "configure-only" => Ok(Self::ConfigureOnly),
            "configure-then-build" => Ok(Self::ConfigureThenBuild),
            other => anyhow::bail!(
                "Unknown protocol '{}' (expected configure-only or configure-then-build)",
                other
            ),
        }
    }
}

/// Why the configure step has to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconfigureReason {
    MarkerMissing,
    FingerprintChanged,
    Forced,
}

impl fmt::Display for ReconfigureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MarkerMissing => write!(f, "build directory not configured"),
            Self::FingerprintChanged => write!(f, "configuration files changed"),
            Self::Forced => write!(f, "reconfigure requested"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "reason", rename_all = "snake_case")]
pub enum Decision {
    NeedsConfigure(ReconfigureReason),
    UpToDate,
}

impl Decision {
    pub fn needs_configure(&self) -> bool {
        matches!(self, Self::NeedsConfigure(_))
    }
}

/// Where a run stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    ConfigureFailed,
    /// Configure succeeded and [`Protocol::ConfigureOnly`] stopped the run
    Configured,
    BuildFailed,
    Built,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub exit_code: i32,
    pub stage: Stage,
    pub decision: Decision,
    pub fingerprint: Fingerprint,
}

/// Paths and commands the orchestrator works with, relative to the workspace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub cmake: String,
    /// Project root handed to the runner as working directory
    pub root: PathBuf,
    pub build_dir: PathBuf,
    /// File inside `build_dir` whose presence means "configured before"
    pub marker: PathBuf,
    pub stamp_file: PathBuf,
    /// Extra configure arguments, one per line; unset means none
    pub args_file: Option<PathBuf>,
    pub configure_preset_file: PathBuf,
    pub build_preset_file: PathBuf,
    pub default_configure_preset: String,
    pub default_build_preset: String,
    pub tracked: TrackedFiles,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            cmake: "cmake".to_string(),
            root: PathBuf::from("."),
            build_dir: PathBuf::from("build"),
            marker: PathBuf::from("CMakeCache.txt"),
            stamp_file: PathBuf::from(".ts"),
            args_file: None,
            configure_preset_file: PathBuf::from(".cpreset"),
            build_preset_file: PathBuf::from(".bpreset"),
            default_configure_preset: crate::presets::DEFAULT_CONFIGURE_PRESET.to_string(),
            default_build_preset: crate::presets::DEFAULT_BUILD_PRESET.to_string(),
            tracked: TrackedFiles::default(),
        }
    }
}

impl Layout {
    pub fn marker_path(&self) -> PathBuf {
        self.build_dir.join(&self.marker)
    }

    pub fn preset_sources(&self) -> PresetSources<'_> {
        PresetSources {
            configure_file: &self.configure_preset_file,
            build_file: &self.build_preset_file,
            default_configure: &self.default_configure_preset,
            default_build: &self.default_build_preset,
        }
    }
}

/// Point-in-time view of the reconfigure inputs
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    pub fingerprint: String,
    pub cached_fingerprint: String,
    pub marker_present: bool,
    pub presets: PresetSelection,
    pub decision: Decision,
}

pub struct Orchestrator<'a> {
    workspace: &'a dyn Workspace,
    runner: &'a dyn CommandRunner,
    layout: Layout,
}

impl<'a> Orchestrator<'a> {
    pub fn new(workspace: &'a dyn Workspace, runner: &'a dyn CommandRunner, layout: Layout) -> Self {
        Self {
            workspace,
            runner,
            layout,
        }
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Decide whether the configure step has to run for `fingerprint`
    pub fn decide(&self, fingerprint: &Fingerprint, force: bool) -> Decision {
        if force {
            return Decision::NeedsConfigure(ReconfigureReason::Forced);
        }
        if !self.workspace.exists(&self.layout.marker_path()) {
            return Decision::NeedsConfigure(ReconfigureReason::MarkerMissing);
        }
        let cached = read_or_default(self.workspace, &self.layout.stamp_file, "");
        if !fingerprint.matches(&cached) {
            return Decision::NeedsConfigure(ReconfigureReason::FingerprintChanged);
        }
        Decision::UpToDate
    }

    /// Gather everything `status` reports without running anything
    pub fn snapshot(&self, force: bool) -> Result<Snapshot> {
        let fingerprint = self.fingerprint()?;
        let decision = self.decide(&fingerprint, force);
        Ok(Snapshot {
            fingerprint: fingerprint.to_string(),
            cached_fingerprint: read_or_default(self.workspace, &self.layout.stamp_file, ""),
            marker_present: self.workspace.exists(&self.layout.marker_path()),
            presets: PresetSelection::load(self.workspace, &self.layout.preset_sources()),
            decision,
        })
    }

    pub fn fingerprint(&self) -> Result<Fingerprint> {
        compute_fingerprint(self.workspace, &self.layout.tracked)
            .context("Failed to compute configuration fingerprint")
    }

    /// The configure invocation for the current preset selection
    pub fn configure_invocation(&self) -> Invocation {
        let presets = PresetSelection::load(self.workspace, &self.layout.preset_sources());
        let extra_args = match &self.layout.args_file {
            Some(path) => read_extra_args(self.workspace, path),
            None => Vec::new(),
        };
        Invocation::configure(
            &self.layout.cmake,
            &self.layout.root,
            &self.layout.build_dir,
            &presets.configure,
            &extra_args,
        )
    }

    /// The build invocation for the current preset selection
    pub fn build_invocation(&self) -> Invocation {
        let presets = PresetSelection::load(self.workspace, &self.layout.preset_sources());
        Invocation::build(&self.layout.cmake, &self.layout.root, &presets.build)
    }

    /// Fingerprint, decide, configure if needed, then build
    pub fn run(&self, protocol: Protocol, force: bool) -> Result<Outcome> {
        let fingerprint = self.fingerprint()?;
        let decision = self.decide(&fingerprint, force);

        if let Decision::NeedsConfigure(reason) = decision {
            info!(operation = "configure", reason = %reason, "reconfiguring");

            let invocation = self.configure_invocation();
            let result = self.runner.run(&invocation)?;

            if !result.success() {
                warn!(
                    operation = "configure",
                    status = "error",
                    exit_code = result.exit_code,
                    "configure step failed, fingerprint cache left unchanged"
                );
                return Ok(Outcome {
                    exit_code: result.exit_code,
                    stage: Stage::ConfigureFailed,
                    decision,
                    fingerprint,
                });
            }

            self.workspace
                .write(&self.layout.stamp_file, fingerprint.as_str())
                .with_context(|| {
                    format!(
                        "Failed to write fingerprint cache: {}",
                        self.layout.stamp_file.display()
                    )
                })?;

            info!(
                operation = "configure",
                status = "success",
                duration_ms = result.duration.as_millis() as u64,
                "configure step finished"
            );

            if protocol == Protocol::ConfigureOnly {
                return Ok(Outcome {
                    exit_code: RECONFIGURED_EXIT_CODE,
                    stage: Stage::Configured,
                    decision,
                    fingerprint,
                });
            }
        } else {
            info!(operation = "configure", status = "skipped", "configuration up to date");
        }

        let invocation = self.build_invocation();
        let result = self.runner.run(&invocation)?;

        let stage = if result.success() {
            Stage::Built
        } else {
            Stage::BuildFailed
        };
        info!(
            operation = "build",
            exit_code = result.exit_code,
            duration_ms = result.duration.as_millis() as u64,
            "build step finished"
        );

        Ok(Outcome {
            exit_code: result.exit_code,
            stage,
            decision,
            fingerprint,
        })
    }
}
