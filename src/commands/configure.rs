/// `cmk configure`: always run the configure step, never build
use anyhow::Result;

use crate::cli::{CommonArgs, ConfigureArgs};
use crate::cli_utils::cmk_prefix;
use crate::orchestrator::{Orchestrator, Protocol, Stage};
use crate::runner::ProcessRunner;

pub fn run(common: &CommonArgs, args: &ConfigureArgs) -> Result<i32> {
    let merged = super::prepare(common)?;
    let workspace = super::workspace(&merged);
    let runner = ProcessRunner::new();
    let orchestrator = Orchestrator::new(&workspace, &runner, merged.layout);

    if args.dry_run {
        println!("{}", orchestrator.configure_invocation());
        return Ok(0);
    }

    let outcome = orchestrator.run(Protocol::ConfigureOnly, true)?;

    // Configuring was the whole request, so a stop after configure is success here
    match outcome.stage {
        Stage::Configured => {
            eprintln!("{} Configured", cmk_prefix());
            Ok(0)
        }
        _ => {
            eprintln!(
                "{} Configure failed (exit: {})",
                cmk_prefix(),
                outcome.exit_code
            );
            Ok(outcome.exit_code)
        }
    }
}
