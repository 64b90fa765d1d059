//! game-ledger CLI
//!
//! Matches the rows of a game collection ledger against external game
//! databases, one batch at a time, resuming where an earlier run stopped.

mod cli_types;
mod commands;
mod error;
mod logging;
mod progress;
mod prompt;
mod rows;

use std::process::ExitCode;

use clap::Parser;

use cli_types::{Cli, Commands, ConfigAction};
use error::CliError;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(e) = logging::init(cli.quiet, cli.verbose, cli.logfile.as_deref()) {
        eprintln!("Cannot set up logging: {}", e);
        return ExitCode::FAILURE;
    }

    let result: Result<(), CliError> = match cli.command {
        Commands::Match(args) => commands::match_rows::run_match(args, cli.quiet, cli.verbose).await,
        Commands::Status { output, sources } => commands::status::run_status(output, sources),
        Commands::Sources => {
            commands::sources::run_sources();
            Ok(())
        }
        Commands::Config { action } => {
            match action {
                ConfigAction::Show => commands::config::run_config_show(),
                ConfigAction::Path => commands::config::run_config_path(),
            }
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
