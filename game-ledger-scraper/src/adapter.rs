use std::collections::BTreeMap;
use std::sync::Arc;

use futures::future::BoxFuture;
use game_ledger_core::{DataSource, LedgerRow, MatchCandidate};
use serde_json::Value;

use crate::error::ScrapeError;

/// Contract every external source implements.
///
/// Adapters only know how to talk to one site and pull fields out of its
/// responses; batching, persistence and disambiguation live elsewhere.
/// Async methods return boxed futures so adapters can be stored as
/// `Arc<dyn SourceAdapter>`.
pub trait SourceAdapter: Send + Sync {
    fn source(&self) -> DataSource;

    /// Cheap precondition checked before any request, e.g. a source that
    /// only covers PC games.
    fn should_skip(&self, _row: &LedgerRow) -> bool {
        false
    }

    /// Search the source and return its raw results for `row`.
    fn get_candidates<'a>(
        &'a self,
        row: &'a LedgerRow,
    ) -> BoxFuture<'a, Result<Vec<Value>, ScrapeError>>;

    /// Validate one raw result against `row`. May issue follow-up requests to
    /// confirm signals the search result lacks. `None` means the result is
    /// not this game.
    fn to_match<'a>(
        &'a self,
        row: &'a LedgerRow,
        raw: Value,
    ) -> BoxFuture<'a, Result<Option<MatchCandidate>, ScrapeError>>;

    /// Search and validate in one go, in the order the source returned
    /// results.
    fn match_row<'a>(
        &'a self,
        row: &'a LedgerRow,
    ) -> BoxFuture<'a, Result<Vec<MatchCandidate>, ScrapeError>> {
        Box::pin(async move {
            let raws = self.get_candidates(row).await?;
            let mut matches = Vec::new();
            for raw in raws {
                if let Some(candidate) = self.to_match(row, raw).await? {
                    matches.push(candidate);
                }
            }
            Ok(matches)
        })
    }
}

/// Adapters available to a run, keyed by source.
#[derive(Default, Clone)]
pub struct AdapterRegistry {
    adapters: BTreeMap<DataSource, Arc<dyn SourceAdapter>>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `adapter`, replacing any previous adapter for its source.
    pub fn register(&mut self, adapter: Arc<dyn SourceAdapter>) {
        self.adapters.insert(adapter.source(), adapter);
    }

    pub fn get(&self, source: DataSource) -> Option<Arc<dyn SourceAdapter>> {
        self.adapters.get(&source).cloned()
    }

    pub fn sources(&self) -> Vec<DataSource> {
        self.adapters.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}
