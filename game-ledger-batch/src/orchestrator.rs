//! Runs every enabled source over the ledger.
//!
//! Each source gets its own task. Within a task rows are processed strictly
//! in ledger order, one request chain at a time, so the source's own rate
//! limit is the only throttle. A source that fails or is stopped never
//! affects its siblings.

use std::fmt;
use std::sync::Arc;

use game_ledger_core::{DataSource, LedgerRow, MatchCandidate};
use game_ledger_scraper::{AdapterRegistry, SourceAdapter};
use tokio_util::sync::CancellationToken;

use crate::batch::{BatchRange, BatchResult, OutcomeCounts, plan_batches};
use crate::checkpoint::CheckpointState;
use crate::config::RunConfig;
use crate::error::BatchError;
use crate::outcome::{MatchOutcome, OutcomeKind};
use crate::progress::{BatchProgress, LogProgress, RowClock, RowProgress};
use crate::reduce::{Reduction, reduce};
use crate::report::{RunSummary, SourceEnd, SourceSummary};
use crate::resolve::{AutoAccept, Disambiguator};
use crate::store::{ProcessedIndex, ResultStore};

/// Lifecycle of one batch of one source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchState {
    NotStarted,
    Resuming { from: usize },
    InProgress,
    Completed,
    Interrupted,
}

impl fmt::Display for BatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotStarted => f.write_str("not started"),
            Self::Resuming { from } => write!(f, "resuming at batch row {}", from),
            Self::InProgress => f.write_str("in progress"),
            Self::Completed => f.write_str("completed"),
            Self::Interrupted => f.write_str("interrupted"),
        }
    }
}

pub struct BatchOrchestrator {
    config: RunConfig,
    registry: AdapterRegistry,
    store: ResultStore,
    resolver: Arc<dyn Disambiguator>,
    progress: Arc<dyn BatchProgress>,
    cancel: CancellationToken,
}

impl BatchOrchestrator {
    /// Orchestrator persisting under `config.output_dir`, resolving ambiguous
    /// rows with [`AutoAccept`] and reporting through [`LogProgress`].
    pub fn new(config: RunConfig, registry: AdapterRegistry, cancel: CancellationToken) -> Self {
        let store = ResultStore::new(config.output_dir.clone());
        Self {
            config,
            registry,
            store,
            resolver: Arc::new(AutoAccept),
            progress: Arc::new(LogProgress),
            cancel,
        }
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn Disambiguator>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_progress(mut self, progress: Arc<dyn BatchProgress>) -> Self {
        self.progress = progress;
        self
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn store(&self) -> &ResultStore {
        &self.store
    }

    /// Configured sources that have a registered adapter. An empty source
    /// list means every registered adapter.
    pub fn active_sources(&self) -> Vec<DataSource> {
        if self.config.sources.is_empty() {
            return self.registry.sources();
        }
        self.config
            .sources
            .iter()
            .copied()
            .filter(|&source| {
                let registered = self.registry.get(source).is_some();
                if !registered {
                    log::warn!("{}: no adapter registered, not running", source);
                }
                registered
            })
            .collect()
    }

    /// Run every active source over `rows` until all are done, stopped or
    /// the cancellation token fires.
    pub async fn run(&self, rows: &[LedgerRow]) -> RunSummary {
        let sources = self.active_sources();
        let rows: Arc<[LedgerRow]> = rows.into();
        let hashes: Arc<[String]> = rows.iter().map(LedgerRow::hash_id).collect();
        log::info!(
            "Matching {} rows against {} sources in batches of {}",
            rows.len(),
            sources.len(),
            self.config.batch_size
        );

        let mut handles = Vec::with_capacity(sources.len());
        for &source in &sources {
            let Some(adapter) = self.registry.get(source) else {
                continue;
            };
            let task = SourceTask {
                source,
                adapter,
                rows: Arc::clone(&rows),
                hashes: Arc::clone(&hashes),
                store: self.store.clone(),
                batch_size: self.config.batch_size.max(1),
                retry_errors: self.config.retry_errors,
                resolver: Arc::clone(&self.resolver),
                progress: Arc::clone(&self.progress),
                cancel: self.cancel.clone(),
            };
            handles.push((source, tokio::spawn(task.run())));
        }

        let mut summaries = Vec::with_capacity(handles.len());
        for (source, handle) in handles {
            match handle.await {
                Ok(summary) => summaries.push(summary),
                Err(e) => {
                    log::error!("{}: source task died: {}", source, e);
                    let mut summary = SourceSummary::new(source);
                    summary.end = SourceEnd::Failed(e.to_string());
                    self.progress.on_source_done(&summary);
                    summaries.push(summary);
                }
            }
        }
        summaries.sort_by_key(|s| s.source);

        let (unmatched, pending) = self.coverage(&sources, &rows, &hashes);
        if !unmatched.is_empty() {
            log::warn!("{} rows have no match in any source", unmatched.len());
        }
        RunSummary {
            sources: summaries,
            unmatched,
            pending,
        }
    }

    /// Rows no source matched, split into those every source has handled
    /// and a count of those still pending somewhere.
    fn coverage(&self, sources: &[DataSource], rows: &[LedgerRow], hashes: &[String]) -> (Vec<String>, usize) {
        let indexes: Vec<ProcessedIndex> = sources
            .iter()
            .filter_map(|&source| match self.store.load_processed(source, false) {
                Ok(index) => Some(index),
                Err(e) => {
                    log::warn!("{}: cannot read outputs: {}", source, e);
                    None
                }
            })
            .collect();
        if indexes.is_empty() {
            return (Vec::new(), 0);
        }

        let mut unmatched = Vec::new();
        let mut pending = 0;
        for (row, hash) in rows.iter().zip(hashes) {
            if indexes.iter().any(|index| index.is_matched(hash)) {
                continue;
            }
            let settled = indexes
                .iter()
                .all(|index| index.kind_of(hash).is_some_and(|k| k != OutcomeKind::Error));
            if settled {
                unmatched.push(row.full_name());
            } else {
                pending += 1;
            }
        }
        (unmatched, pending)
    }
}

/// Everything one source's task owns.
struct SourceTask {
    source: DataSource,
    adapter: Arc<dyn SourceAdapter>,
    rows: Arc<[LedgerRow]>,
    hashes: Arc<[String]>,
    store: ResultStore,
    batch_size: usize,
    retry_errors: bool,
    resolver: Arc<dyn Disambiguator>,
    progress: Arc<dyn BatchProgress>,
    cancel: CancellationToken,
}

enum BatchEnd {
    Completed,
    Interrupted,
    Stopped(String),
}

enum RowResult {
    Done(MatchOutcome),
    Cancelled,
    Stopped(String),
}

impl SourceTask {
    async fn run(self) -> SourceSummary {
        let mut summary = SourceSummary::new(self.source);
        summary.end = match self.run_batches(&mut summary).await {
            Ok(end) => end,
            Err(e) => {
                log::error!("{}: {}", self.source, e);
                SourceEnd::Failed(e.to_string())
            }
        };
        self.progress.on_source_done(&summary);
        summary
    }

    async fn run_batches(&self, summary: &mut SourceSummary) -> Result<SourceEnd, BatchError> {
        let mut index = self.store.load_processed(self.source, self.retry_errors)?;
        log::debug!("{}: {} rows already processed", self.source, index.len());

        for range in plan_batches(self.rows.len(), self.batch_size) {
            if self.cancel.is_cancelled() {
                return Ok(SourceEnd::Interrupted);
            }
            let hashes = &self.hashes[range.start..range.end];
            if hashes.iter().all(|h| index.is_processed(h)) {
                if self.store.remove_checkpoint(self.source, range)? {
                    log::debug!("{}: removed obsolete checkpoint for batch {}", self.source, range);
                }
                self.progress
                    .on_batch_skipped(self.source, range, "every row already processed");
                summary.batches_skipped += 1;
                continue;
            }

            summary.batches_run += 1;
            let (counts, end) = self.run_batch(range, &mut index).await?;
            summary.counts += counts;
            match end {
                BatchEnd::Completed => {}
                BatchEnd::Interrupted => return Ok(SourceEnd::Interrupted),
                BatchEnd::Stopped(reason) => return Ok(SourceEnd::Stopped(reason)),
            }
        }
        Ok(SourceEnd::Completed)
    }

    async fn run_batch(
        &self,
        range: BatchRange,
        index: &mut ProcessedIndex,
    ) -> Result<(OutcomeCounts, BatchEnd), BatchError> {
        let rows = &self.rows[range.start..range.end];
        let hashes = &self.hashes[range.start..range.end];
        self.log_state(range, BatchState::NotStarted);

        let (mut result, first) = self.resume(range, hashes)?;
        if first > 0 {
            self.log_state(range, BatchState::Resuming { from: first });
        }
        self.progress.on_batch_start(self.source, range, first);
        self.log_state(range, BatchState::InProgress);

        let todo: Vec<usize> = (first..rows.len())
            .filter(|&i| !index.is_processed(&hashes[i]))
            .collect();
        let mut clock = RowClock::start(todo.len());
        let mut counts = OutcomeCounts::default();

        for &i in &todo {
            let row = &rows[i];
            let step = if self.cancel.is_cancelled() {
                RowResult::Cancelled
            } else {
                self.process_row(row).await
            };
            let outcome = match step {
                RowResult::Done(outcome) => outcome,
                RowResult::Cancelled => {
                    self.save_checkpoint(range, hashes, i, result)?;
                    self.log_state(range, BatchState::Interrupted);
                    return Ok((counts, BatchEnd::Interrupted));
                }
                RowResult::Stopped(reason) => {
                    log::error!("{}: stopping at {}: {}", self.source, row.full_name(), reason);
                    self.save_checkpoint(range, hashes, i, result)?;
                    self.log_state(range, BatchState::Interrupted);
                    return Ok((counts, BatchEnd::Stopped(reason)));
                }
            };

            let kind = outcome.kind();
            let matches = match &outcome {
                MatchOutcome::Success(candidates) => candidates.len(),
                _ => 0,
            };
            let name = row.full_name();
            result.record(hashes[i].clone(), name.clone(), outcome);
            counts.add(kind);

            let (current, elapsed, eta) = clock.tick();
            self.progress.on_row(
                self.source,
                &RowProgress {
                    current,
                    total: todo.len(),
                    row: &name,
                    kind,
                    matches,
                    elapsed,
                    eta,
                },
            );
        }

        self.store.write_batch(self.source, range, &result)?;
        self.store.remove_checkpoint(self.source, range)?;
        index.absorb(&result);
        self.log_state(range, BatchState::Completed);
        self.progress
            .on_batch_complete(self.source, range, &result.counts());
        Ok((counts, BatchEnd::Completed))
    }

    /// Starting state for a batch: a valid checkpoint, or whatever earlier
    /// runs persisted for this range. Unusable checkpoints are deleted.
    fn resume(&self, range: BatchRange, hashes: &[String]) -> Result<(BatchResult, usize), BatchError> {
        let discard = |reason: &dyn fmt::Display| -> Result<(BatchResult, usize), BatchError> {
            log::warn!(
                "{}: discarding checkpoint for batch {} and restarting it: {}",
                self.source,
                range,
                reason
            );
            self.store.remove_checkpoint(self.source, range)?;
            Ok((self.store.load_batch(self.source, range)?, 0))
        };

        match self.store.load_checkpoint(self.source, range) {
            Ok(None) => Ok((self.store.load_batch(self.source, range)?, 0)),
            Ok(Some(state)) => match state.verify(self.source, range, self.batch_size, hashes) {
                Ok(()) => {
                    log::info!(
                        "{}: checkpoint for batch {} has {} rows done",
                        self.source,
                        range,
                        state.result.len()
                    );
                    Ok((state.result, state.next_index))
                }
                Err(mismatch) => discard(&mismatch),
            },
            Err(e) => discard(&e),
        }
    }

    fn save_checkpoint(
        &self,
        range: BatchRange,
        hashes: &[String],
        next_index: usize,
        result: BatchResult,
    ) -> Result<(), BatchError> {
        let state = CheckpointState::new(
            self.source,
            range,
            self.batch_size,
            hashes.to_vec(),
            next_index,
            result,
        );
        let path = self.store.save_checkpoint(&state)?;
        log::info!(
            "{}: saved checkpoint for batch {} at row {} ({})",
            self.source,
            range,
            range.start + next_index,
            path.display()
        );
        Ok(())
    }

    async fn process_row(&self, row: &LedgerRow) -> RowResult {
        if self.adapter.should_skip(row) {
            return RowResult::Done(MatchOutcome::Skipped(format!(
                "not covered by {}",
                self.source
            )));
        }

        let searched = tokio::select! {
            biased;
            result = self.adapter.match_row(row) => result,
            _ = self.cancel.cancelled() => return RowResult::Cancelled,
        };
        match searched {
            Ok(candidates) => RowResult::Done(MatchOutcome::Success(self.choose(row, candidates))),
            Err(e) if e.is_cancelled() => RowResult::Cancelled,
            Err(e) if e.is_fatal() => RowResult::Stopped(e.to_string()),
            Err(e) => {
                log::warn!("{}: {}: {}", self.source, row.full_name(), e);
                RowResult::Done(MatchOutcome::Error(e.to_string()))
            }
        }
    }

    /// Reduce candidates and, if that leaves several, ask the resolver.
    fn choose(&self, row: &LedgerRow, candidates: Vec<MatchCandidate>) -> Vec<MatchCandidate> {
        match reduce(candidates) {
            Reduction::Empty => Vec::new(),
            Reduction::Resolved(candidate) => vec![candidate],
            Reduction::Ambiguous(mut candidates) => {
                match self.resolver.resolve(self.source, row, &candidates) {
                    Some(i) if i < candidates.len() => vec![candidates.swap_remove(i)],
                    Some(i) => {
                        log::warn!(
                            "{}: resolver chose candidate {} of {}; treating as no match",
                            self.source,
                            i,
                            candidates.len()
                        );
                        Vec::new()
                    }
                    None => Vec::new(),
                }
            }
        }
    }

    fn log_state(&self, range: BatchRange, state: BatchState) {
        log::debug!("{}: batch {} {}", self.source, range, state);
    }
}
