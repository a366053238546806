use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Materialize `.streamlit/config.toml` for the project in the current directory.
#[derive(Parser, Debug)]
#[command(
    name = "stconf",
    version,
    about = "Create a ready-to-deploy .streamlit/config.toml"
)]
pub struct Cli {
    /// Project directory to write into instead of the current one.
    #[arg(short = 'C', long = "chdir", global = true)]
    pub chdir: Option<PathBuf>,
    /// Show what would be written without touching the filesystem.
    #[arg(short = 'n', long = "dry-run", global = true)]
    pub dry_run: bool,
    /// Exit non-zero when the config could not be written.
    #[arg(long = "strict", global = true)]
    pub strict: bool,
    /// Skip the project structure listing after a successful write.
    #[arg(long = "no-tree", global = true)]
    pub no_tree: bool,
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy, Eq, PartialEq)]
pub enum Command {
    /// Write the config file (the default when no subcommand is given).
    Write,
    /// Print the config contents to stdout.
    Show,
    /// Print the path the config is written to.
    Path,
}

/// Helper entry point so `main` can stay minimal.
pub fn parse() -> Cli {
    Cli::parse()
}
