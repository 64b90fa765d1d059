use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Local};
use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;
use tokio_util::sync::CancellationToken;

use game_ledger_batch::{
    AutoAccept, BatchOrchestrator, BatchProgress, Disambiguator, LogProgress, RunConfig, RunSummary,
    SilentProgress, SourceEnd,
};
use game_ledger_core::DataSource;
use game_ledger_matcher::MatchValidator;
use game_ledger_scraper::{ApiKeys, build_registry};

use crate::cli_types::MatchArgs;
use crate::error::CliError;
use crate::progress::BarProgress;
use crate::prompt::InteractivePrompt;
use crate::rows;

/// Unmatched rows listed on the terminal; the report file has all of them.
const UNMATCHED_SHOWN: usize = 20;

/// Run the match command.
pub(crate) async fn run_match(args: MatchArgs, quiet: bool, verbose: bool) -> Result<(), CliError> {
    let mut ledger = rows::load_rows(&args.rows)?;
    if let Some(limit) = args.limit {
        ledger.truncate(limit);
    }
    log::info!("Loaded {} rows from {}", ledger.len(), args.rows.display());

    let config = run_config(RunConfig::load()?, &args);
    let output_dir = config.output_dir.clone();

    let cancel = CancellationToken::new();
    watch_ctrl_c(cancel.clone());

    let keys = ApiKeys::load();
    let validator = Arc::new(MatchValidator::new());
    let (registry, failures) = build_registry(&config.sources, &keys, validator, &cancel);
    if registry.sources().is_empty() {
        let reasons: Vec<String> = failures
            .iter()
            .map(|(source, e)| format!("{}: {}", source, e))
            .collect();
        return Err(CliError::config(format!(
            "no source can run ({})",
            reasons.join("; ")
        )));
    }

    let resolver: Arc<dyn Disambiguator> = if args.interactive {
        Arc::new(InteractivePrompt::new())
    } else {
        Arc::new(AutoAccept)
    };
    // Bars would fight with prompts for the terminal.
    let progress: Arc<dyn BatchProgress> = if quiet {
        Arc::new(SilentProgress)
    } else if verbose || args.interactive {
        Arc::new(LogProgress)
    } else {
        Arc::new(BarProgress::new())
    };

    let orchestrator = BatchOrchestrator::new(config, registry, cancel)
        .with_resolver(resolver)
        .with_progress(progress);
    let summary = orchestrator.run(&ledger).await;

    print_summary(&summary);
    if !args.no_report {
        let path = report_path(&output_dir, Local::now());
        match summary.write_to_file(&path) {
            Ok(()) => log::info!(
                "Report: {}",
                path.display().if_supports_color(Stdout, |t| t.cyan())
            ),
            Err(e) => log::warn!("Could not write report {}: {}", path.display(), e),
        }
    }

    let broken: Vec<String> = summary
        .sources
        .iter()
        .filter(|s| matches!(s.end, SourceEnd::Stopped(_) | SourceEnd::Failed(_)))
        .map(|s| s.source.to_string())
        .collect();
    if broken.is_empty() {
        Ok(())
    } else {
        Err(CliError::incomplete(format!(
            "sources did not finish: {}",
            broken.join(", ")
        )))
    }
}

/// Apply command-line overrides on top of the configured run settings.
pub(crate) fn run_config(base: RunConfig, args: &MatchArgs) -> RunConfig {
    let retry = base.retry_errors || args.retry_errors;
    let mut config = base.with_retry_errors(retry);
    if let Some(size) = args.batch_size {
        config = config.with_batch_size(size);
    }
    if let Some(dir) = &args.output {
        config = config.with_output_dir(dir.clone());
    }
    if let Some(sources) = &args.sources {
        let mut unique: Vec<DataSource> = Vec::with_capacity(sources.len());
        for &source in sources {
            if !unique.contains(&source) {
                unique.push(source);
            }
        }
        config = config.with_sources(unique);
    }
    config
}

pub(crate) fn report_path(output_dir: &Path, now: DateTime<Local>) -> PathBuf {
    output_dir
        .join("reports")
        .join(format!("match_run_{}.txt", now.format("%Y%m%d_%H%M%S")))
}

/// First Ctrl-C cancels the run so checkpoints get written; a second one
/// exits immediately.
fn watch_ctrl_c(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        log::warn!("Interrupted: saving checkpoints (press Ctrl-C again to abort)");
        cancel.cancel();
        if tokio::signal::ctrl_c().await.is_ok() {
            std::process::exit(130);
        }
    });
}

fn print_summary(summary: &RunSummary) {
    log::info!("");
    log::info!("{}", "Summary".if_supports_color(Stdout, |t| t.bold()));
    for source in &summary.sources {
        let end = source.end.to_string();
        let end = match &source.end {
            SourceEnd::Completed => end.if_supports_color(Stdout, |t| t.green()).to_string(),
            SourceEnd::Interrupted => end.if_supports_color(Stdout, |t| t.yellow()).to_string(),
            SourceEnd::Stopped(_) | SourceEnd::Failed(_) => {
                end.if_supports_color(Stdout, |t| t.red()).to_string()
            }
        };
        log::info!(
            "  {}: {} ({}; {} batches run, {} skipped)",
            source.source.if_supports_color(Stdout, |t| t.bold()),
            end,
            source.counts,
            source.batches_run,
            source.batches_skipped
        );
    }
    log::info!("  Total: {}", summary.totals());

    if summary.pending > 0 {
        log::info!("  {} rows still pending in some source", summary.pending);
    }
    if !summary.unmatched.is_empty() {
        log::info!("");
        log::info!(
            "{} rows have no match in any source:",
            summary.unmatched.len()
        );
        for row in summary.unmatched.iter().take(UNMATCHED_SHOWN) {
            log::info!("  {}", row.if_supports_color(Stdout, |t| t.dimmed()));
        }
        if summary.unmatched.len() > UNMATCHED_SHOWN {
            log::info!("  ... and {} more", summary.unmatched.len() - UNMATCHED_SHOWN);
        }
    }
    if summary
        .sources
        .iter()
        .any(|s| s.end == SourceEnd::Interrupted)
    {
        log::info!("");
        log::info!("Run the same command again to resume from the saved checkpoints.");
    }
}
