use clap::{Parser, Subcommand};

/// cmk - incremental CMake preset wrapper
///
/// Re-runs the CMake configure step only when the project's configuration
/// files changed, then builds with the selected preset.
#[derive(Parser, Debug)]
#[command(name = "cmk")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Incremental CMake preset wrapper", long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub common: CommonArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Options shared by every command
#[derive(Parser, Debug, Clone, Default)]
pub struct CommonArgs {
    /// Project root (default: current directory)
    #[arg(short = 'C', long, global = true, env = "CMK_DIRECTORY")]
    pub directory: Option<String>,

    /// Config file path
    #[arg(short = 'c', long, global = true, env = "CMK_CONFIG")]
    pub config: Option<String>,

    /// Build output directory
    #[arg(long, global = true, env = "CMK_BUILD_DIR")]
    pub build_dir: Option<String>,

    /// CMake program
    #[arg(long, global = true, env = "CMK_CMAKE")]
    pub cmake: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Configure if needed, then build (default)
    Build(BuildArgs),

    /// Run the configure step unconditionally
    Configure(ConfigureArgs),

    /// Show fingerprint, presets and whether a reconfigure is due
    Status(StatusArgs),

    /// Forget the cached fingerprint so the next run reconfigures
    Clean,

    /// Show or set the configure/build presets
    Preset(PresetArgs),

    /// Configuration management utilities
    Config(ConfigArgs),
}

#[derive(Parser, Debug, Default)]
pub struct BuildArgs {
    /// Reconfigure even if nothing changed
    #[arg(long)]
    pub force: bool,

    /// Stop after a reconfigure with exit code 1; the next run builds
    #[arg(long, conflicts_with = "protocol")]
    pub configure_only: bool,

    /// configure-then-build or configure-only
    #[arg(long)]
    pub protocol: Option<String>,

    /// Print what would run without running it
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Parser, Debug, Default)]
pub struct ConfigureArgs {
    /// Print the configure command without running it
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Parser, Debug)]
pub struct StatusArgs {
    /// Emit JSON instead of text
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Debug)]
pub struct PresetArgs {
    /// Preset passed to the configure step
    #[arg(long = "configure")]
    pub configure: Option<String>,

    /// Preset passed to the build step
    #[arg(long = "build")]
    pub build: Option<String>,
}

#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Validate configuration file
    Validate {
        /// Path to config file (default: discovered cmk.toml)
        path: Option<String>,
    },
    /// Print an example cmk.toml
    Generate,
    /// Show effective configuration (merged from all sources)
    Show,
}
