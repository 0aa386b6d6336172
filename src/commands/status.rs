use anyhow::{Context, Result};

use crate::cli::{CommonArgs, StatusArgs};
use crate::orchestrator::{Decision, Orchestrator};
use crate::runner::ProcessRunner;

pub fn run(common: &CommonArgs, args: &StatusArgs) -> Result<i32> {
    let merged = super::prepare(common)?;
    let workspace = super::workspace(&merged);
    let runner = ProcessRunner::new();
    let orchestrator = Orchestrator::new(&workspace, &runner, merged.layout);

    let snapshot = orchestrator.snapshot(false)?;

    if args.json {
        let json =
            serde_json::to_string_pretty(&snapshot).context("Failed to serialize status")?;
        println!("{}", json);
        return Ok(0);
    }

    let layout = orchestrator.layout();
    println!("Project:            {}", merged.root.display());
    println!("Build directory:    {}", layout.build_dir.display());
    println!(
        "Marker:             {} ({})",
        layout.marker_path().display(),
        if snapshot.marker_present {
            "present"
        } else {
            "missing"
        }
    );
    println!("Fingerprint:        {}", display_or_empty(&snapshot.fingerprint));
    println!(
        "Cached fingerprint: {}",
        display_or_empty(&snapshot.cached_fingerprint)
    );
    println!("Configure preset:   {}", snapshot.presets.configure);
    println!("Build preset:       {}", snapshot.presets.build);
    match snapshot.decision {
        Decision::NeedsConfigure(reason) => println!("Status:             needs configure ({})", reason),
        Decision::UpToDate => println!("Status:             up to date"),
    }

    Ok(0)
}

fn display_or_empty(value: &str) -> &str {
    if value.is_empty() {
        "(none)"
    } else {
        value
    }
}
