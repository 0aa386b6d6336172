use anyhow::Result;
use clap::Parser;

use cmk::cli::{BuildArgs, Cli, Commands};
use cmk::{commands, logging};

fn main() -> Result<()> {
    // Initialize structured logging
    logging::init();

    let cli = Cli::parse();

    // Subprocess exit codes come back as values; only setup errors use `?`
    let exit_code = match &cli.command {
        None => commands::build::run(&cli.common, &BuildArgs::default())?,
        Some(Commands::Build(args)) => commands::build::run(&cli.common, args)?,
        Some(Commands::Configure(args)) => commands::configure::run(&cli.common, args)?,
        Some(Commands::Status(args)) => commands::status::run(&cli.common, args)?,
        Some(Commands::Clean) => commands::clean::run(&cli.common)?,
        Some(Commands::Preset(args)) => commands::preset::run(&cli.common, args)?,
        Some(Commands::Config(args)) => commands::config::run(&cli.common, &args.command)?,
    };

    std::process::exit(exit_code);
}
