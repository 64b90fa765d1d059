use std::collections::BTreeMap;
use std::fmt;

use game_ledger_core::MatchCandidate;
use serde::{Deserialize, Serialize};

use crate::outcome::{MatchOutcome, OutcomeKind};

/// Half-open slice `start..end` of the ledger processed as one unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BatchRange {
    pub start: usize,
    pub end: usize,
}

impl BatchRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Display for BatchRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Split `total` rows into consecutive batches of `batch_size` (the last one
/// may be shorter). A zero batch size is treated as one.
pub fn plan_batches(total: usize, batch_size: usize) -> Vec<BatchRange> {
    let size = batch_size.max(1);
    (0..total)
        .step_by(size)
        .map(|start| BatchRange::new(start, (start + size).min(total)))
        .collect()
}

/// Candidates accepted for one row. Empty means the source had no match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowMatches {
    pub row: String,
    pub candidates: Vec<MatchCandidate>,
}

/// Why a row was skipped or failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowNote {
    pub row: String,
    pub reason: String,
}

/// Outcomes of one batch for one source, keyed by row hash.
///
/// A row hash lives in exactly one of the three maps; recording a new
/// outcome for a hash removes any earlier one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchResult {
    pub successes: BTreeMap<String, RowMatches>,
    pub errors: BTreeMap<String, RowNote>,
    pub skipped: BTreeMap<String, RowNote>,
}

impl BatchResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, hash: impl Into<String>, row: impl Into<String>, outcome: MatchOutcome) {
        let hash = hash.into();
        let row = row.into();
        self.remove(&hash);
        match outcome {
            MatchOutcome::Success(candidates) => {
                self.successes.insert(hash, RowMatches { row, candidates });
            }
            MatchOutcome::Error(reason) => {
                self.errors.insert(hash, RowNote { row, reason });
            }
            MatchOutcome::Skipped(reason) => {
                self.skipped.insert(hash, RowNote { row, reason });
            }
        }
    }

    fn remove(&mut self, hash: &str) {
        self.successes.remove(hash);
        self.errors.remove(hash);
        self.skipped.remove(hash);
    }

    pub fn kind_of(&self, hash: &str) -> Option<OutcomeKind> {
        if let Some(found) = self.successes.get(hash) {
            return Some(if found.candidates.is_empty() {
                OutcomeKind::NoMatch
            } else {
                OutcomeKind::Match
            });
        }
        if self.errors.contains_key(hash) {
            return Some(OutcomeKind::Error);
        }
        self.skipped.contains_key(hash).then_some(OutcomeKind::Skipped)
    }

    pub fn contains(&self, hash: &str) -> bool {
        self.kind_of(hash).is_some()
    }

    pub fn len(&self) -> usize {
        self.successes.len() + self.errors.len() + self.skipped.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every recorded row hash with its outcome kind.
    pub fn kinds(&self) -> BTreeMap<&str, OutcomeKind> {
        self.successes
            .keys()
            .chain(self.errors.keys())
            .chain(self.skipped.keys())
            .filter_map(|hash| Some((hash.as_str(), self.kind_of(hash)?)))
            .collect()
    }

    /// Successes split by whether any candidate was accepted.
    pub fn partition_successes(&self) -> (BTreeMap<String, RowMatches>, BTreeMap<String, RowMatches>) {
        self.successes
            .iter()
            .map(|(hash, matches)| (hash.clone(), matches.clone()))
            .partition(|(_, matches)| !matches.candidates.is_empty())
    }

    /// Fold another result in; `other` wins for hashes present in both.
    pub fn merge(&mut self, other: BatchResult) {
        for (hash, matches) in other.successes {
            self.remove(&hash);
            self.successes.insert(hash, matches);
        }
        for (hash, note) in other.errors {
            self.remove(&hash);
            self.errors.insert(hash, note);
        }
        for (hash, note) in other.skipped {
            self.remove(&hash);
            self.skipped.insert(hash, note);
        }
    }

    pub fn counts(&self) -> OutcomeCounts {
        let mut counts = OutcomeCounts::default();
        for kind in self.kinds().into_values() {
            counts.add(kind);
        }
        counts
    }
}

/// Row counts per outcome kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeCounts {
    pub matched: usize,
    pub no_match: usize,
    pub errors: usize,
    pub skipped: usize,
}

impl OutcomeCounts {
    pub fn add(&mut self, kind: OutcomeKind) {
        match kind {
            OutcomeKind::Match => self.matched += 1,
            OutcomeKind::NoMatch => self.no_match += 1,
            OutcomeKind::Error => self.errors += 1,
            OutcomeKind::Skipped => self.skipped += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.matched + self.no_match + self.errors + self.skipped
    }
}

impl std::ops::AddAssign for OutcomeCounts {
    fn add_assign(&mut self, other: Self) {
        self.matched += other.matched;
        self.no_match += other.no_match;
        self.errors += other.errors;
        self.skipped += other.skipped;
    }
}

impl fmt::Display for OutcomeCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} matched, {} no match, {} errors, {} skipped",
            self.matched, self.no_match, self.errors, self.skipped
        )
    }
}

#[cfg(test)]
#[path = "tests/batch_tests.rs"]
mod tests;
