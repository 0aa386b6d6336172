/// `cmk build` (and bare `cmk`)
///
/// Reconfigures when the fingerprint or marker says so, then builds.
use anyhow::Result;

use crate::cli::{BuildArgs, CommonArgs};
use crate::cli_utils::cmk_prefix;
use crate::orchestrator::{Decision, Orchestrator, Protocol, Stage};
use crate::runner::ProcessRunner;

pub fn run(common: &CommonArgs, args: &BuildArgs) -> Result<i32> {
    let merged = super::prepare(common)?.with_build_args(args)?;
    let workspace = super::workspace(&merged);
    let runner = ProcessRunner::new();
    let orchestrator = Orchestrator::new(&workspace, &runner, merged.layout);

    if args.dry_run {
        return dry_run(&orchestrator, merged.protocol, args.force);
    }

    let outcome = orchestrator.run(merged.protocol, args.force)?;

    match outcome.stage {
        Stage::ConfigureFailed => eprintln!(
            "{} Configure failed (exit: {})",
            cmk_prefix(),
            outcome.exit_code
        ),
        Stage::Configured => eprintln!(
            "{} Configured; run cmk again to build (exit: {})",
            cmk_prefix(),
            outcome.exit_code
        ),
        Stage::BuildFailed => eprintln!(
            "{} Build failed (exit: {})",
            cmk_prefix(),
            outcome.exit_code
        ),
        Stage::Built => {}
    }

    Ok(outcome.exit_code)
}

fn dry_run(orchestrator: &Orchestrator<'_>, protocol: Protocol, force: bool) -> Result<i32> {
    let fingerprint = orchestrator.fingerprint()?;
    let decision = orchestrator.decide(&fingerprint, force);

    eprintln!("{} Dry run - fingerprint: {}", cmk_prefix(), fingerprint);

    match decision {
        Decision::NeedsConfigure(reason) => {
            eprintln!("{} Would reconfigure ({})", cmk_prefix(), reason);
            println!("{}", orchestrator.configure_invocation());
            if protocol == Protocol::ConfigureOnly {
                eprintln!("{} Would stop after configure", cmk_prefix());
                return Ok(0);
            }
        }
        Decision::UpToDate => {
            eprintln!("{} Configuration up to date", cmk_prefix());
        }
    }

    println!("{}", orchestrator.build_invocation());
    Ok(0)
}
