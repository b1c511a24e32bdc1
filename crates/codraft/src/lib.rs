//! Library interface for the `codraft` CLI.
//!
//! Exposes the argument parser and command implementations so they can be
//! tested and documented; the entry point lives in `main.rs`.
//!
//! - [`Cli`] - the root argument parser
//! - [`Commands`] - available subcommands
//! - [`commands`] - command implementations
//! - `server` - MCP server (feature `mcp`)

pub mod commands;

#[cfg(feature = "mcp")]
pub mod server;

use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;

/// Color output preference.
#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub enum ColorChoice {
    /// Detect terminal capabilities automatically.
    #[default]
    Auto,
    /// Always emit colors.
    Always,
    /// Never emit colors.
    Never,
}

impl ColorChoice {
    /// Set the global color mode. Call once at startup.
    pub fn apply(self) {
        match self {
            Self::Auto => {}
            Self::Always => owo_colors::set_override(true),
            Self::Never => owo_colors::set_override(false),
        }
    }
}

const ENV_HELP: &str = "\
ENVIRONMENT VARIABLES:
    RUST_LOG                 Log filter (e.g., debug, codraft_core=trace)
    CODRAFT_USER             Acting user when --as is not given
    CODRAFT_DATA_DIR         Where drafts are stored
    CODRAFT_LOG_PATH         Explicit log file path
    CODRAFT_LOG_DIR          Log directory
";

/// Command-line interface definition for codraft.
#[derive(Parser)]
#[command(name = "codraft")]
#[command(about = "Write drafts together, a few words at a time", long_about = None)]
#[command(version, arg_required_else_help = true)]
#[command(after_long_help = ENV_HELP)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Print only the version number (for scripting)
    #[arg(long)]
    pub version_only: bool,

    /// Path to configuration file (overrides discovery)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Run as if started in DIR
    #[arg(short = 'C', long, global = true)]
    pub chdir: Option<PathBuf>,

    /// Act as USER (defaults to the `user` config setting)
    #[arg(long = "as", global = true, value_name = "USER")]
    pub actor: Option<String>,

    /// Only print errors (suppresses warnings/info)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// More detail (repeatable; e.g. -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Colorize output
    #[arg(long, global = true, value_enum, default_value_t)]
    pub color: ColorChoice,

    /// Output as JSON (for scripting)
    #[arg(long, global = true)]
    pub json: bool,
}

/// Available subcommands for the CLI.
#[derive(Subcommand)]
pub enum Commands {
    /// Start a new draft
    New(commands::new::NewArgs),

    /// Print a draft's current text
    Show(commands::show::ShowArgs),

    /// Propose a new full text for a draft
    Contribute(commands::contribute::ContributeArgs),

    /// Close a draft you created
    Complete(commands::complete::CompleteArgs),

    /// List a draft's contributions, newest first
    History(commands::history::HistoryArgs),

    /// List every draft, newest first
    List(commands::list::ListArgs),

    /// List drafts you created or contributed to
    Mine(commands::list::MineArgs),

    /// Re-check a draft's stored history
    Verify(commands::verify::VerifyArgs),

    /// Count words, sentences, paragraphs and lines in a text
    Metrics(commands::metrics::MetricsArgs),

    /// Show package information
    Info(commands::info::InfoArgs),

    /// Start MCP (Model Context Protocol) server on stdio
    #[cfg(feature = "mcp")]
    Serve(commands::serve::ServeArgs),
}

/// Returns the clap command for documentation generation
pub fn command() -> clap::Command {
    Cli::command()
}
