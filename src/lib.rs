// Library interface for cmk
// The binary is a thin shell over these modules; integration tests use them directly.

pub mod cli;
pub mod cli_utils;
pub mod commands;
pub mod config;
pub mod config_discovery;
pub mod fingerprint;
pub mod logging;
pub mod merger;
pub mod orchestrator;
pub mod presets;
pub mod runner;
pub mod store;

// Re-export commonly used types
pub use fingerprint::{compute_fingerprint, Fingerprint, TrackedFiles};
pub use orchestrator::{Decision, Layout, Orchestrator, Outcome, Protocol, Stage};
pub use runner::{CommandRunner, ExitOutcome, Invocation, ProcessRunner};
pub use store::{FsWorkspace, MemoryWorkspace, Workspace};
