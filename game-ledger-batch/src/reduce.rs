use game_ledger_core::MatchCandidate;

/// Candidates left after deterministic narrowing.
#[derive(Debug, Clone, PartialEq)]
pub enum Reduction {
    Empty,
    Resolved(MatchCandidate),
    /// Candidates that need a decision, best score first.
    Ambiguous(Vec<MatchCandidate>),
}

/// Narrow a row's candidates before anyone is asked to choose.
///
/// Only a candidate that is an exact title and a full match is taken
/// without asking, and only when it is the sole such candidate. Several of
/// them are offered on their own; otherwise every candidate is offered,
/// including a lone one that falls short.
pub fn reduce(candidates: Vec<MatchCandidate>) -> Reduction {
    if candidates.is_empty() {
        return Reduction::Empty;
    }

    let (guaranteed, rest): (Vec<_>, Vec<_>) =
        candidates.into_iter().partition(|c| c.validation.guaranteed_match());
    match guaranteed.len() {
        0 => ambiguous(rest),
        1 => guaranteed.into_iter().next().map_or(Reduction::Empty, Reduction::Resolved),
        _ => ambiguous(guaranteed),
    }
}

fn ambiguous(mut candidates: Vec<MatchCandidate>) -> Reduction {
    candidates.sort_by_key(|c| std::cmp::Reverse(c.validation.score()));
    Reduction::Ambiguous(candidates)
}

#[cfg(test)]
#[path = "tests/reduce_tests.rs"]
mod tests;
