use std::path::PathBuf;

use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use game_ledger_batch::{ResultStore, RunConfig, SourceStatus};
use game_ledger_core::DataSource;

use crate::error::CliError;

/// Run the status command.
pub(crate) fn run_status(output: Option<PathBuf>, sources: Option<Vec<DataSource>>) -> Result<(), CliError> {
    let root = match output {
        Some(dir) => dir,
        None => RunConfig::load()?.output_dir,
    };
    let store = ResultStore::new(root.clone());
    let sources = match sources {
        Some(sources) => sources,
        None => store.sources()?,
    };

    log::info!(
        "Results in {}",
        root.display().if_supports_color(Stdout, |t| t.cyan())
    );
    if sources.is_empty() {
        log::info!(
            "{}",
            "No results yet. Run 'game-ledger match' first.".if_supports_color(Stdout, |t| t.dimmed())
        );
        return Ok(());
    }

    log::info!("");
    for source in sources {
        for line in status_lines(&store.status(source)?) {
            log::info!("{}", line);
        }
    }
    Ok(())
}

fn status_lines(status: &SourceStatus) -> Vec<String> {
    let mut lines = vec![
        format!(
            "{} ({} batches saved)",
            status.source.if_supports_color(Stdout, |t| t.bold()),
            status.batches
        ),
        format!("  {}", status.counts),
    ];
    if !status.checkpoints.is_empty() {
        let ranges: Vec<String> = status.checkpoints.iter().map(|r| r.to_string()).collect();
        lines.push(format!(
            "  {} {}",
            "checkpoints:".if_supports_color(Stdout, |t| t.yellow()),
            ranges.join(", ")
        ));
    }
    lines
}
