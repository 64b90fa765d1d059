use super::*;
use game_ledger_core::ValidationInfo;

fn candidate(title: &str) -> MatchCandidate {
    MatchCandidate::new(title, ValidationInfo::default())
}

#[test]
fn batches_cover_every_row_once() {
    let batches = plan_batches(105, 50);
    assert_eq!(
        batches,
        vec![BatchRange::new(0, 50), BatchRange::new(50, 100), BatchRange::new(100, 105)]
    );
    assert_eq!(batches.iter().map(BatchRange::len).sum::<usize>(), 105);
}

#[test]
fn batch_plan_edge_cases() {
    assert!(plan_batches(0, 50).is_empty());
    assert_eq!(plan_batches(3, 0).len(), 3);
    assert_eq!(plan_batches(50, 50), vec![BatchRange::new(0, 50)]);
}

#[test]
fn range_displays_half_open() {
    assert_eq!(BatchRange::new(50, 100).to_string(), "50..100");
}

#[test]
fn recording_keeps_one_partition_per_row() {
    let mut result = BatchResult::new();
    result.record("h1", "Chrono Trigger (SNES) [1995]", MatchOutcome::Error("timeout".into()));
    assert_eq!(result.kind_of("h1"), Some(OutcomeKind::Error));

    result.record("h1", "Chrono Trigger (SNES) [1995]", MatchOutcome::Success(vec![candidate("Chrono Trigger")]));
    assert_eq!(result.kind_of("h1"), Some(OutcomeKind::Match));
    assert!(result.errors.is_empty());
    assert_eq!(result.len(), 1);

    result.record("h1", "Chrono Trigger (SNES) [1995]", MatchOutcome::Skipped("pc only".into()));
    assert!(result.successes.is_empty());
    assert_eq!(result.skipped["h1"].reason, "pc only");
}

#[test]
fn counts_split_matches_from_no_matches() {
    let mut result = BatchResult::new();
    result.record("a", "A", MatchOutcome::Success(vec![candidate("A")]));
    result.record("b", "B", MatchOutcome::Success(vec![]));
    result.record("c", "C", MatchOutcome::Error("500".into()));
    result.record("d", "D", MatchOutcome::Skipped("n/a".into()));

    let counts = result.counts();
    assert_eq!(
        counts,
        OutcomeCounts { matched: 1, no_match: 1, errors: 1, skipped: 1 }
    );
    assert_eq!(counts.total(), 4);

    let (matched, unmatched) = result.partition_successes();
    assert!(matched.contains_key("a"));
    assert!(unmatched.contains_key("b"));
}

#[test]
fn merge_prefers_newer_outcome() {
    let mut old = BatchResult::new();
    old.record("a", "A", MatchOutcome::Error("500".into()));
    old.record("b", "B", MatchOutcome::Success(vec![]));

    let mut new = BatchResult::new();
    new.record("a", "A", MatchOutcome::Success(vec![candidate("A")]));

    old.merge(new);
    assert_eq!(old.kind_of("a"), Some(OutcomeKind::Match));
    assert_eq!(old.kind_of("b"), Some(OutcomeKind::NoMatch));
    assert!(old.errors.is_empty());
}

#[test]
fn result_survives_json() {
    let mut result = BatchResult::new();
    result.record("a", "A", MatchOutcome::Success(vec![candidate("A").with_url("https://x/a")]));
    result.record("b", "B", MatchOutcome::Skipped("n/a".into()));
    let json = serde_json::to_string(&result).unwrap();
    let back: BatchResult = serde_json::from_str(&json).unwrap();
    assert_eq!(back, result);
}

#[test]
fn counts_accumulate() {
    let mut total = OutcomeCounts::default();
    total += OutcomeCounts { matched: 2, no_match: 1, errors: 0, skipped: 3 };
    total += OutcomeCounts { matched: 1, no_match: 0, errors: 1, skipped: 0 };
    assert_eq!(total.to_string(), "3 matched, 1 no match, 1 errors, 3 skipped");
}
