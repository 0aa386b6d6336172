/// External command execution
///
/// The orchestrator describes what to run as an [`Invocation`] and hands it to
/// a [`CommandRunner`]. `ProcessRunner` spawns the real process with inherited
/// stdio and blocks until it exits.
use anyhow::{Context, Result};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// A single external command: program, arguments and working directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
}

impl Invocation {
    /// `cmake -Wno-dev -S . -B <build_dir> --preset <preset> [extra...]`
    pub fn configure(
        program: &str,
        cwd: &Path,
        build_dir: &Path,
        preset: &str,
        extra_args: &[String],
    ) -> Self {
        let mut args = vec![
            "-Wno-dev".to_string(),
            "-S".to_string(),
            ".".to_string(),
            "-B".to_string(),
            build_dir.to_string_lossy().into_owned(),
            "--preset".to_string(),
            preset.to_string(),
        ];
        args.extend(extra_args.iter().cloned());

        Self {
            program: program.to_string(),
            args,
            cwd: cwd.to_path_buf(),
        }
    }

    /// `cmake --build --preset <preset>`
    pub fn build(program: &str, cwd: &Path, preset: &str) -> Self {
        Self {
            program: program.to_string(),
            args: vec![
                "--build".to_string(),
                "--preset".to_string(),
                preset.to_string(),
            ],
            cwd: cwd.to_path_buf(),
        }
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Result of running an invocation to completion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitOutcome {
    /// Process exit code, `-1` when terminated by a signal
    pub exit_code: i32,
    pub duration: Duration,
}

impl ExitOutcome {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

pub trait CommandRunner {
    /// Run `invocation` and wait for it to exit
    ///
    /// A non-zero exit is reported in the outcome, not as an error. Errors mean
    /// the process could not be started or waited on.
    fn run(&self, invocation: &Invocation) -> Result<ExitOutcome>;
}

/// Runs invocations as child processes sharing our stdin/stdout/stderr
#[derive(Debug, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    pub fn new() -> Self {
        Self
    }
}

impl CommandRunner for ProcessRunner {
    fn run(&self, invocation: &Invocation) -> Result<ExitOutcome> {
        let start = Instant::now();

        // Resolve from PATH, fall back to the name as given
        let program = which::which(&invocation.program).unwrap_or_else(|e| {
            debug!(
                program = %invocation.program,
                error = %e,
                "could not resolve program in PATH, trying as-is"
            );
            PathBuf::from(&invocation.program)
        });

        info!(command = %invocation, cwd = %invocation.cwd.display(), "running");

        let status = Command::new(&program)
            .args(&invocation.args)
            .current_dir(&invocation.cwd)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .with_context(|| format!("Failed to execute {}", invocation.program))?;

        let duration = start.elapsed();
        let exit_code = status.code().unwrap_or(-1);

        debug!(
            program = %invocation.program,
            exit_code,
            duration_ms = duration.as_millis() as u64,
            "command finished"
        );

        Ok(ExitOutcome {
            exit_code,
            duration,
        })
    }
}
