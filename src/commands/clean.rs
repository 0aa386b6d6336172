use anyhow::{Context, Result};

use crate::cli::CommonArgs;
use crate::cli_utils::cmk_prefix;
use crate::store::Workspace;

/// Remove the fingerprint cache; the build tree itself is left alone
pub fn run(common: &CommonArgs) -> Result<i32> {
    let merged = super::prepare(common)?;
    let workspace = super::workspace(&merged);
    let stamp = &merged.layout.stamp_file;

    if !workspace.exists(stamp) {
        eprintln!("{} Nothing to clean", cmk_prefix());
        return Ok(0);
    }

    workspace
        .remove(stamp)
        .with_context(|| format!("Failed to remove {}", stamp.display()))?;
    eprintln!(
        "{} Removed {}; next run will reconfigure",
        cmk_prefix(),
        stamp.display()
    );
    Ok(0)
}
