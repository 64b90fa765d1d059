use std::fmt;
use std::str::FromStr;

use game_ledger_core::MatchCandidate;
use serde::{Deserialize, Serialize};

/// What happened to one row for one source.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchOutcome {
    /// The source was searched. An empty list means it had no match.
    Success(Vec<MatchCandidate>),
    Skipped(String),
    Error(String),
}

impl MatchOutcome {
    pub fn kind(&self) -> OutcomeKind {
        match self {
            Self::Success(candidates) if candidates.is_empty() => OutcomeKind::NoMatch,
            Self::Success(_) => OutcomeKind::Match,
            Self::Skipped(_) => OutcomeKind::Skipped,
            Self::Error(_) => OutcomeKind::Error,
        }
    }
}

/// Persisted outcome category. Each has its own output file per batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    Match,
    NoMatch,
    Error,
    Skipped,
}

impl OutcomeKind {
    pub fn all() -> &'static [OutcomeKind] {
        &[Self::Match, Self::NoMatch, Self::Error, Self::Skipped]
    }

    /// File name prefix for this kind's batch output.
    pub fn file_prefix(&self) -> &'static str {
        match self {
            Self::Match => "matches",
            Self::NoMatch => "no_matches",
            Self::Error => "errors",
            Self::Skipped => "skipped",
        }
    }
}

impl fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_prefix())
    }
}

impl FromStr for OutcomeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|k| k.file_prefix() == s)
            .ok_or_else(|| format!("unknown outcome kind '{}'", s))
    }
}
