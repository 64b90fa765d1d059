use game_ledger_core::{DataSource, LedgerRow, MatchCandidate};

/// Chooses among candidates that automatic reduction could not narrow down.
///
/// Returns the index of the accepted candidate, or `None` when none of them
/// is the row's game.
pub trait Disambiguator: Send + Sync {
    fn resolve(&self, source: DataSource, row: &LedgerRow, candidates: &[MatchCandidate]) -> Option<usize>;
}

impl<F> Disambiguator for F
where
    F: Fn(DataSource, &LedgerRow, &[MatchCandidate]) -> Option<usize> + Send + Sync,
{
    fn resolve(&self, source: DataSource, row: &LedgerRow, candidates: &[MatchCandidate]) -> Option<usize> {
        self(source, row, candidates)
    }
}

/// Non-interactive policy: accept the one candidate that is an exact,
/// full match, failing that the one full match, and decline otherwise.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoAccept;

impl Disambiguator for AutoAccept {
    fn resolve(&self, source: DataSource, row: &LedgerRow, candidates: &[MatchCandidate]) -> Option<usize> {
        let choice = unique(candidates, |c| c.validation.guaranteed_match())
            .or_else(|| unique(candidates, |c| c.validation.full_match()));
        if choice.is_none() {
            log::info!(
                "{}: {} candidates for {}, none accepted automatically",
                source,
                candidates.len(),
                row.full_name()
            );
        }
        choice
    }
}

fn unique(candidates: &[MatchCandidate], accept: impl Fn(&MatchCandidate) -> bool) -> Option<usize> {
    let mut hits = candidates.iter().enumerate().filter(|(_, c)| accept(c));
    match (hits.next(), hits.next()) {
        (Some((index, _)), None) => Some(index),
        _ => None,
    }
}
