//! CLI argument definitions using clap derive

use crate::config::ArchiverBackend;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;

/// Layerkit - serverless dependency layer builder
///
/// Installs a requirements manifest into the directory layout a
/// serverless runtime expects and zips it into a deployable layer.
/// Running without a subcommand builds with the configured defaults.
#[derive(Parser, Debug)]
#[command(name = "layerkit")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute (defaults to build)
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "LAYERKIT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Skip local .layerkit.toml discovery
    #[arg(long, global = true)]
    pub no_local: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build the layer archive
    Build(BuildArgs),

    /// Check an archive's layout, packages and size limits
    Verify(VerifyArgs),

    /// Initialize a project-local .layerkit.toml config
    Init(InitArgs),

    /// Remove the staging tree (and optionally the archive)
    Clean(CleanArgs),

    /// Check that the installer and archiver tools are available
    Status,

    /// Show recent builds
    History(HistoryArgs),

    /// Show or edit configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Arguments for the build command
#[derive(Parser, Debug, Default)]
pub struct BuildArgs {
    /// Bundle name (directory and archive name)
    #[arg(short, long)]
    pub name: Option<String>,

    /// Target runtime, e.g. python3.12 or nodejs20.x
    #[arg(long)]
    pub runtime: Option<String>,

    /// Requirements manifest
    #[arg(short = 'r', long)]
    pub manifest: Option<PathBuf>,

    /// Directory that receives the staging tree and the archive
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Remove the staging tree before installing
    #[arg(long)]
    pub clean: bool,

    /// Remove the staging tree after archiving
    #[arg(long)]
    pub remove_staging: bool,

    /// Put the runtime directory at the archive root
    #[arg(long)]
    pub strip_bundle_dir: bool,

    /// Archiver backend
    #[arg(long, value_enum)]
    pub archiver: Option<ArchiverBackend>,

    /// Install wheels for this platform, e.g. manylinux2014_x86_64
    #[arg(long)]
    pub platform: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

/// Arguments for the verify command
#[derive(Parser, Debug)]
pub struct VerifyArgs {
    /// Archive to check (defaults to the configured build output)
    pub archive: Option<PathBuf>,

    /// Requirements manifest whose packages must be present
    #[arg(short = 'r', long)]
    pub manifest: Option<PathBuf>,

    /// Skip the package presence check
    #[arg(long, conflicts_with = "manifest")]
    pub no_manifest: bool,

    /// Bundle name (defaults to the archive file name)
    #[arg(short, long)]
    pub name: Option<String>,

    /// Target runtime
    #[arg(long)]
    pub runtime: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

/// Arguments for the init command
#[derive(Parser, Debug)]
pub struct InitArgs {
    /// Overwrite existing .layerkit.toml
    #[arg(short, long)]
    pub force: bool,

    /// Target directory (defaults to current directory)
    #[arg(short, long)]
    pub path: Option<PathBuf>,

    /// Runtime written into the new config
    #[arg(long)]
    pub runtime: Option<String>,
}

/// Arguments for the clean command
#[derive(Parser, Debug)]
pub struct CleanArgs {
    /// Bundle name
    #[arg(short, long)]
    pub name: Option<String>,

    /// Directory holding the staging tree and the archive
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Also remove the archive
    #[arg(long)]
    pub archive: bool,

    /// Skip confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

/// Arguments for the history command
#[derive(Parser, Debug)]
pub struct HistoryArgs {
    /// Number of builds to show
    #[arg(short = 'n', long, default_value = "20")]
    pub limit: usize,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Delete the history file
    #[arg(long)]
    pub clear: bool,
}

/// Arguments for the completions command
#[derive(Parser, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Initialize default configuration
    Init {
        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., layer.runtime)
        key: String,
        /// Value to set
        value: String,
        /// Write to project-local .layerkit.toml instead of global config
        #[arg(long)]
        local: bool,
    },
}

/// Output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// JSON output
    Json,
}
