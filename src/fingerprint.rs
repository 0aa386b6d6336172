/// Configuration fingerprinting
///
/// A fingerprint is the modification times (nanoseconds, decimal) of every
/// tracked file that exists, joined by a single space in tracked-list order.
/// Any change in the set of existing files or in one of their mtimes yields a
/// different fingerprint.
use std::fmt;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::debug;

use crate::store::{StoreError, Workspace};

/// Files whose timestamps decide whether CMake has to be re-run
pub const DEFAULT_TRACKED_FILES: &[&str] = &[
    "CMakeLists.txt",
    "src/CMakeLists.txt",
    "CMakePresets.json",
    "CMakeUserPresets.json",
    ".cmake-args",
    ".bpreset",
    ".cpreset",
];

/// Ordered list of tracked configuration files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedFiles(Vec<PathBuf>);

impl TrackedFiles {
    pub fn new<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self(paths.into_iter().map(Into::into).collect())
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.0
    }
}

impl Default for TrackedFiles {
    fn default() -> Self {
        Self::new(DEFAULT_TRACKED_FILES.iter().copied())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Compare against the raw content of the fingerprint cache
    pub fn matches(&self, cached: &str) -> bool {
        self.0 == cached
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Compute the fingerprint of `tracked` as seen through `workspace`
///
/// Missing files are skipped. A file that vanishes between the existence check
/// and the metadata read counts as missing.
pub fn compute_fingerprint(workspace: &dyn Workspace, tracked: &TrackedFiles) -> Result<Fingerprint> {
    let mut stamps = Vec::with_capacity(tracked.paths().len());

    for path in tracked.paths() {
        if !workspace.exists(path) {
            continue;
        }
        match workspace.modified_ns(path) {
            Ok(ns) => stamps.push(ns.to_string()),
            Err(StoreError::NotFound(_)) => continue,
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("Failed to read modification time: {}", path.display())
                })
            }
        }
    }

    let fingerprint = Fingerprint(stamps.join(" "));
    debug!(
        operation = "fingerprint",
        entry_count = stamps.len(),
        fingerprint = %fingerprint,
        "computed configuration fingerprint"
    );
    Ok(fingerprint)
}
