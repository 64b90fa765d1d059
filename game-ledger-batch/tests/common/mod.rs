//! Scripted in-memory adapter for orchestrator tests.

#![allow(dead_code)]

use std::path::Path;
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use futures::future::BoxFuture;
use game_ledger_batch::{BatchOrchestrator, RunConfig, SilentProgress};
use game_ledger_core::{DataSource, LedgerRow, MatchCandidate, ValidationInfo};
use game_ledger_scraper::{AdapterRegistry, ScrapeError, SourceAdapter};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

type Script = dyn Fn(&LedgerRow) -> Result<Vec<MatchCandidate>, ScrapeError> + Send + Sync;
type SkipRule = dyn Fn(&LedgerRow) -> bool + Send + Sync;

/// Adapter whose answers come from a closure, recording every row it was
/// asked to search.
pub struct MockAdapter {
    source: DataSource,
    script: Box<Script>,
    skip: Box<SkipRule>,
    calls: Mutex<Vec<String>>,
}

impl MockAdapter {
    pub fn new(
        source: DataSource,
        script: impl Fn(&LedgerRow) -> Result<Vec<MatchCandidate>, ScrapeError> + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            source,
            script: Box::new(script),
            skip: Box::new(|_: &LedgerRow| false),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn skipping(
        source: DataSource,
        skip: impl Fn(&LedgerRow) -> bool + Send + Sync + 'static,
        script: impl Fn(&LedgerRow) -> Result<Vec<MatchCandidate>, ScrapeError> + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            source,
            script: Box::new(script),
            skip: Box::new(skip),
            calls: Mutex::new(Vec::new()),
        })
    }

    /// Titles searched so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl SourceAdapter for MockAdapter {
    fn source(&self) -> DataSource {
        self.source
    }

    fn should_skip(&self, row: &LedgerRow) -> bool {
        (self.skip)(row)
    }

    fn get_candidates<'a>(&'a self, row: &'a LedgerRow) -> BoxFuture<'a, Result<Vec<Value>, ScrapeError>> {
        Box::pin(async move {
            self.calls.lock().unwrap().push(row.title.clone());
            tokio::task::yield_now().await;
            let candidates = (self.script)(row)?;
            Ok(candidates
                .into_iter()
                .map(|c| serde_json::to_value(c).unwrap())
                .collect())
        })
    }

    fn to_match<'a>(
        &'a self,
        _row: &'a LedgerRow,
        raw: Value,
    ) -> BoxFuture<'a, Result<Option<MatchCandidate>, ScrapeError>> {
        Box::pin(async move { Ok(Some(serde_json::from_value(raw)?)) })
    }
}

pub fn ledger(n: usize) -> Vec<LedgerRow> {
    (0..n)
        .map(|i| {
            LedgerRow::new(format!("Game {}", i), "PC")
                .with_release_date(NaiveDate::from_ymd_opt(1990 + i as i32, 1, 1).unwrap())
        })
        .collect()
}

pub fn titles(rows: &[LedgerRow]) -> Vec<String> {
    rows.iter().map(|r| r.title.clone()).collect()
}

/// Candidate that is an exact, full match for `row`.
pub fn hit(row: &LedgerRow) -> MatchCandidate {
    MatchCandidate::new(
        row.title.clone(),
        ValidationInfo {
            title_matched: true,
            exact: true,
            platform_matched: true,
            date_matched: true,
            ..Default::default()
        },
    )
    .with_url(format!("https://example.test/{}", row.title.replace(' ', "-")))
}

/// Even-numbered games match, odd ones have no match.
pub fn even_matches(row: &LedgerRow) -> Result<Vec<MatchCandidate>, ScrapeError> {
    let n: usize = row.title.trim_start_matches("Game ").parse().unwrap_or(1);
    Ok(if n % 2 == 0 { vec![hit(row)] } else { vec![] })
}

pub fn config(dir: &Path, batch_size: usize, sources: Vec<DataSource>) -> RunConfig {
    RunConfig::default()
        .with_output_dir(dir)
        .with_batch_size(batch_size)
        .with_sources(sources)
}

pub fn orchestrator(
    config: RunConfig,
    adapters: &[Arc<MockAdapter>],
    cancel: CancellationToken,
) -> BatchOrchestrator {
    let mut registry = AdapterRegistry::new();
    for adapter in adapters {
        registry.register(adapter.clone());
    }
    BatchOrchestrator::new(config, registry, cancel).with_progress(Arc::new(SilentProgress))
}
