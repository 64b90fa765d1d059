//! CLI type definitions: command enums and argument structs.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use game_ledger_core::DataSource;

#[derive(Parser)]
#[command(name = "game-ledger")]
#[command(about = "Match a game collection ledger against external game databases", long_about = None)]
pub(crate) struct Cli {
    /// Only show warnings and errors (suppress normal output)
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Enable verbose/debug logging (timestamps + debug-level messages)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Write log output to a file (ANSI codes stripped)
    #[arg(long, global = true)]
    pub logfile: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Clone)]
pub(crate) struct MatchArgs {
    /// Ledger CSV export (Title, Platform, Release Date, ... columns)
    #[arg(short, long)]
    pub rows: PathBuf,

    /// Sources to run, by short name or alias (e.g., moby_games,game_jolt)
    #[arg(short, long, value_delimiter = ',')]
    pub sources: Option<Vec<DataSource>>,

    /// Rows per batch (overrides the [run] table)
    #[arg(short, long)]
    pub batch_size: Option<usize>,

    /// Output directory for matches and checkpoints
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Ask which candidate is right when a source returns several
    #[arg(short, long)]
    pub interactive: bool,

    /// Process rows whose previous attempt ended in an error again
    #[arg(long)]
    pub retry_errors: bool,

    /// Only match the first N rows of the ledger
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// Do not write the run report file
    #[arg(long)]
    pub no_report: bool,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Match ledger rows against external sources
    Match(MatchArgs),

    /// Summarize persisted results without running any source
    Status {
        /// Output directory to inspect (defaults to the configured one)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Limit the summary to these sources
        #[arg(short, long, value_delimiter = ',')]
        sources: Option<Vec<DataSource>>,
    },

    /// List known sources and whether they can run
    Sources,

    /// Inspect the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Show run settings and where each API key comes from
    Show,

    /// Print the config file path
    Path,
}
