//! Concrete source adapters.

pub mod game_jolt;
pub mod moby_games;

use std::sync::Arc;

use game_ledger_core::DataSource;
use game_ledger_matcher::MatchValidator;
use tokio_util::sync::CancellationToken;

use crate::adapter::{AdapterRegistry, SourceAdapter};
use crate::credentials::{ApiKey, ApiKeys};
use crate::error::ScrapeError;

pub use game_jolt::GameJoltAdapter;
pub use moby_games::MobyGamesAdapter;

/// Build the adapter for `source` with its production client policy.
pub fn build_adapter(
    source: DataSource,
    keys: &ApiKeys,
    validator: Arc<MatchValidator>,
    cancel: CancellationToken,
) -> Result<Arc<dyn SourceAdapter>, ScrapeError> {
    match source {
        DataSource::MobyGames => {
            let key = keys.require(ApiKey::MobyGames)?;
            Ok(Arc::new(MobyGamesAdapter::new(key, validator, cancel)?))
        }
        DataSource::GameJolt => Ok(Arc::new(GameJoltAdapter::new(validator, cancel)?)),
        other => Err(ScrapeError::config(format!(
            "no adapter is available for {}",
            other
        ))),
    }
}

/// Build a registry for `sources`.
///
/// A source that cannot be built (missing key, no adapter) is logged and
/// left out; the returned list names each failure.
pub fn build_registry(
    sources: &[DataSource],
    keys: &ApiKeys,
    validator: Arc<MatchValidator>,
    cancel: &CancellationToken,
) -> (AdapterRegistry, Vec<(DataSource, ScrapeError)>) {
    let mut registry = AdapterRegistry::new();
    let mut failures = Vec::new();
    for &source in sources {
        match build_adapter(source, keys, Arc::clone(&validator), cancel.clone()) {
            Ok(adapter) => registry.register(adapter),
            Err(e) => {
                log::warn!("{}: not enabled: {}", source, e);
                failures.push((source, e));
            }
        }
    }
    (registry, failures)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn moby_games_requires_key() {
        let result = build_adapter(
            DataSource::MobyGames,
            &ApiKeys::default(),
            Arc::new(MatchValidator::new()),
            CancellationToken::new(),
        );
        assert!(matches!(result, Err(ScrapeError::Config(_))));
    }

    #[test]
    fn registry_skips_unbuildable_sources() {
        let keys = ApiKeys::from_pairs([(ApiKey::MobyGames, "k".to_string())]);
        let (registry, failures) = build_registry(
            &[DataSource::MobyGames, DataSource::GameJolt, DataSource::Metacritic],
            &keys,
            Arc::new(MatchValidator::new()),
            &CancellationToken::new(),
        );
        assert_eq!(registry.sources(), vec![DataSource::MobyGames, DataSource::GameJolt]);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0, DataSource::Metacritic);
    }

    #[test]
    fn every_adapter_source_builds() {
        let keys = ApiKeys::from_pairs([(ApiKey::MobyGames, "k".to_string())]);
        for source in DataSource::with_adapters() {
            let adapter = build_adapter(
                source,
                &keys,
                Arc::new(MatchValidator::new()),
                CancellationToken::new(),
            )
            .unwrap();
            assert_eq!(adapter.source(), source);
        }
    }
}
