mod common;

use std::sync::{Arc, Mutex};

use common::{config, even_matches, hit, ledger, orchestrator, titles, MockAdapter};
use game_ledger_batch::{
    BatchRange, BatchResult, CheckpointState, MatchOutcome, OutcomeKind, ResultStore, SourceEnd,
};
use game_ledger_core::{DataSource, LedgerRow, MatchCandidate, ValidationInfo};
use game_ledger_scraper::ScrapeError;
use tokio_util::sync::CancellationToken;

const MOBY: DataSource = DataSource::MobyGames;
const JOLT: DataSource = DataSource::GameJolt;

fn cancelling_at(title: &'static str, cancel: &CancellationToken) -> Arc<MockAdapter> {
    let trigger = cancel.clone();
    MockAdapter::new(MOBY, move |row| {
        if row.title == title {
            trigger.cancel();
            return Err(ScrapeError::Cancelled);
        }
        even_matches(row)
    })
}

// -- Resume --

#[tokio::test]
async fn resumed_batch_matches_uninterrupted_run() {
    let rows = ledger(10);
    let range = BatchRange::new(0, 10);

    let reference_dir = tempfile::tempdir().unwrap();
    let adapter = MockAdapter::new(MOBY, even_matches);
    let summary = orchestrator(config(reference_dir.path(), 10, vec![MOBY]), &[adapter], CancellationToken::new())
        .run(&rows)
        .await;
    assert_eq!(summary.sources[0].end, SourceEnd::Completed);
    let reference = ResultStore::new(reference_dir.path()).load_batch(MOBY, range).unwrap();
    assert_eq!(reference.len(), 10);

    let dir = tempfile::tempdir().unwrap();
    let store = ResultStore::new(dir.path());

    let cancel = CancellationToken::new();
    let interrupted = cancelling_at("Game 4", &cancel);
    let summary = orchestrator(config(dir.path(), 10, vec![MOBY]), &[interrupted.clone()], cancel)
        .run(&rows)
        .await;
    assert_eq!(summary.sources[0].end, SourceEnd::Interrupted);
    assert_eq!(interrupted.calls(), titles(&rows[..5]));
    let checkpoint = store.load_checkpoint(MOBY, range).unwrap().unwrap();
    assert_eq!(checkpoint.next_index, 4);
    assert_eq!(checkpoint.result.len(), 4);
    assert!(store.load_batch(MOBY, range).unwrap().is_empty());

    let resumed = MockAdapter::new(MOBY, even_matches);
    let summary = orchestrator(config(dir.path(), 10, vec![MOBY]), &[resumed.clone()], CancellationToken::new())
        .run(&rows)
        .await;
    assert_eq!(summary.sources[0].end, SourceEnd::Completed);
    assert_eq!(resumed.calls(), titles(&rows[4..]));
    assert_eq!(summary.sources[0].counts.total(), 6);
    assert_eq!(store.load_batch(MOBY, range).unwrap(), reference);
    assert_eq!(store.load_checkpoint(MOBY, range).unwrap(), None);
}

#[tokio::test]
async fn resume_skips_finished_batches() {
    let rows = ledger(10);
    let dir = tempfile::tempdir().unwrap();
    let store = ResultStore::new(dir.path());

    let cancel = CancellationToken::new();
    let first = cancelling_at("Game 5", &cancel);
    orchestrator(config(dir.path(), 4, vec![MOBY]), &[first.clone()], cancel)
        .run(&rows)
        .await;
    assert_eq!(first.calls(), titles(&rows[..6]));
    assert_eq!(store.load_batch(MOBY, BatchRange::new(0, 4)).unwrap().len(), 4);
    assert_eq!(
        store.load_checkpoint(MOBY, BatchRange::new(4, 8)).unwrap().unwrap().next_index,
        1
    );

    let second = MockAdapter::new(MOBY, even_matches);
    let summary = orchestrator(config(dir.path(), 4, vec![MOBY]), &[second.clone()], CancellationToken::new())
        .run(&rows)
        .await;
    let moby = summary.source(MOBY).unwrap();
    assert_eq!(moby.end, SourceEnd::Completed);
    assert_eq!(moby.batches_skipped, 1);
    assert_eq!(moby.batches_run, 2);
    assert_eq!(second.calls(), titles(&rows[5..]));
    assert_eq!(store.load_processed(MOBY, false).unwrap().len(), 10);
    assert!(store.checkpoints(MOBY).unwrap().is_empty());
}

#[tokio::test]
async fn cancelled_before_start_does_nothing() {
    let rows = ledger(3);
    let dir = tempfile::tempdir().unwrap();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let adapter = MockAdapter::new(MOBY, even_matches);
    let summary = orchestrator(config(dir.path(), 10, vec![MOBY]), &[adapter.clone()], cancel)
        .run(&rows)
        .await;
    assert_eq!(summary.sources[0].end, SourceEnd::Interrupted);
    assert!(adapter.calls().is_empty());
}

// -- Isolation between sources --

#[tokio::test]
async fn immediate_stop_only_stops_its_source() {
    let rows = ledger(10);
    let dir = tempfile::tempdir().unwrap();
    let store = ResultStore::new(dir.path());

    let stopping = MockAdapter::new(MOBY, |row: &LedgerRow| {
        if row.title == "Game 4" {
            return Err(ScrapeError::ImmediateStop {
                site: MOBY,
                status: 401,
                url: "https://api.mobygames.com/v1/games".into(),
            });
        }
        even_matches(row)
    });
    let healthy = MockAdapter::new(JOLT, even_matches);

    let summary = orchestrator(
        config(dir.path(), 5, vec![MOBY, JOLT]),
        &[stopping.clone(), healthy.clone()],
        CancellationToken::new(),
    )
    .run(&rows)
    .await;

    let moby = summary.source(MOBY).unwrap();
    assert!(matches!(&moby.end, SourceEnd::Stopped(reason) if reason.contains("401")));
    assert_eq!(stopping.calls(), titles(&rows[..5]));
    assert_eq!(
        store.load_checkpoint(MOBY, BatchRange::new(0, 5)).unwrap().unwrap().next_index,
        4
    );

    let jolt = summary.source(JOLT).unwrap();
    assert_eq!(jolt.end, SourceEnd::Completed);
    assert_eq!(jolt.counts.total(), 10);
    assert_eq!(healthy.calls(), titles(&rows));
    assert_eq!(store.load_processed(JOLT, false).unwrap().len(), 10);
}

#[tokio::test]
async fn row_errors_are_recorded_and_processing_continues() {
    let rows = ledger(4);
    let dir = tempfile::tempdir().unwrap();
    let store = ResultStore::new(dir.path());
    let adapter = MockAdapter::new(MOBY, |row: &LedgerRow| {
        if row.title == "Game 1" {
            return Err(ScrapeError::ExhaustedRetries {
                url: "https://x/games".into(),
                attempts: 5,
                last: "HTTP 503".into(),
            });
        }
        even_matches(row)
    });

    let summary = orchestrator(config(dir.path(), 10, vec![MOBY]), &[adapter.clone()], CancellationToken::new())
        .run(&rows)
        .await;
    let moby = summary.source(MOBY).unwrap();
    assert_eq!(moby.end, SourceEnd::Completed);
    assert_eq!(moby.counts.errors, 1);
    assert_eq!(adapter.calls().len(), 4);

    let result = store.load_batch(MOBY, BatchRange::new(0, 4)).unwrap();
    let error = &result.errors[&rows[1].hash_id()];
    assert!(error.reason.contains("HTTP 503"));
    assert_eq!(error.row, rows[1].full_name());
}

// -- Already processed --

#[tokio::test]
async fn rerun_of_finished_source_is_a_no_op() {
    let rows = ledger(6);
    let dir = tempfile::tempdir().unwrap();

    let first = MockAdapter::new(MOBY, even_matches);
    orchestrator(config(dir.path(), 3, vec![MOBY]), &[first.clone()], CancellationToken::new())
        .run(&rows)
        .await;
    assert_eq!(first.calls().len(), 6);

    let second = MockAdapter::new(MOBY, even_matches);
    let summary = orchestrator(config(dir.path(), 3, vec![MOBY]), &[second.clone()], CancellationToken::new())
        .run(&rows)
        .await;
    assert!(second.calls().is_empty());
    let moby = summary.source(MOBY).unwrap();
    assert_eq!(moby.batches_skipped, 2);
    assert_eq!(moby.batches_run, 0);
    assert_eq!(moby.counts.total(), 0);
}

#[tokio::test]
async fn new_rows_are_picked_up_on_rerun() {
    let dir = tempfile::tempdir().unwrap();
    let first = MockAdapter::new(MOBY, even_matches);
    orchestrator(config(dir.path(), 10, vec![MOBY]), &[first], CancellationToken::new())
        .run(&ledger(3))
        .await;

    let rows = ledger(5);
    let second = MockAdapter::new(MOBY, even_matches);
    orchestrator(config(dir.path(), 10, vec![MOBY]), &[second.clone()], CancellationToken::new())
        .run(&rows)
        .await;
    assert_eq!(second.calls(), titles(&rows[3..]));

    let store = ResultStore::new(dir.path());
    assert_eq!(store.load_batch(MOBY, BatchRange::new(0, 5)).unwrap().len(), 2);
    assert_eq!(store.load_processed(MOBY, false).unwrap().len(), 5);
}

#[tokio::test]
async fn retry_errors_reprocesses_only_failed_rows() {
    let rows = ledger(4);
    let dir = tempfile::tempdir().unwrap();
    let store = ResultStore::new(dir.path());
    let range = BatchRange::new(0, 4);

    let flaky = MockAdapter::new(MOBY, |row: &LedgerRow| {
        if row.title == "Game 2" {
            return Err(ScrapeError::parse("unexpected page layout"));
        }
        even_matches(row)
    });
    orchestrator(config(dir.path(), 4, vec![MOBY]), &[flaky], CancellationToken::new())
        .run(&rows)
        .await;
    assert_eq!(
        store.load_batch(MOBY, range).unwrap().kind_of(&rows[2].hash_id()),
        Some(OutcomeKind::Error)
    );

    let without_retry = MockAdapter::new(MOBY, even_matches);
    orchestrator(config(dir.path(), 4, vec![MOBY]), &[without_retry.clone()], CancellationToken::new())
        .run(&rows)
        .await;
    assert!(without_retry.calls().is_empty());

    let retry = MockAdapter::new(MOBY, even_matches);
    orchestrator(
        config(dir.path(), 4, vec![MOBY]).with_retry_errors(true),
        &[retry.clone()],
        CancellationToken::new(),
    )
    .run(&rows)
    .await;
    assert_eq!(retry.calls(), vec!["Game 2".to_string()]);

    let result = store.load_batch(MOBY, range).unwrap();
    assert_eq!(result.len(), 4);
    assert_eq!(result.kind_of(&rows[2].hash_id()), Some(OutcomeKind::Match));
    assert!(result.errors.is_empty());
    assert!(!store.output_path(MOBY, OutcomeKind::Error, range).exists());
}

// -- Checkpoint validation --

#[tokio::test]
async fn mismatched_checkpoint_is_discarded() {
    let rows = ledger(3);
    let dir = tempfile::tempdir().unwrap();
    let store = ResultStore::new(dir.path());
    let range = BatchRange::new(0, 3);

    let mut stale = BatchResult::new();
    stale.record("not-a-real-row", "Ghost (PC) [1999]", MatchOutcome::Success(vec![]));
    let state = CheckpointState::new(
        MOBY,
        range,
        3,
        vec!["x".into(), "y".into(), "z".into()],
        2,
        stale,
    );
    store.save_checkpoint(&state).unwrap();

    let adapter = MockAdapter::new(MOBY, even_matches);
    let summary = orchestrator(config(dir.path(), 3, vec![MOBY]), &[adapter.clone()], CancellationToken::new())
        .run(&rows)
        .await;
    assert_eq!(summary.sources[0].end, SourceEnd::Completed);
    assert_eq!(adapter.calls(), titles(&rows));

    let result = store.load_batch(MOBY, range).unwrap();
    assert_eq!(result.len(), 3);
    assert!(!result.contains("not-a-real-row"));
    assert_eq!(store.load_checkpoint(MOBY, range).unwrap(), None);
}

#[tokio::test]
async fn unreadable_checkpoint_is_discarded() {
    let rows = ledger(2);
    let dir = tempfile::tempdir().unwrap();
    let store = ResultStore::new(dir.path());
    let path = store.checkpoint_path(MOBY, BatchRange::new(0, 2));
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, "not json").unwrap();

    let adapter = MockAdapter::new(MOBY, even_matches);
    let summary = orchestrator(config(dir.path(), 2, vec![MOBY]), &[adapter.clone()], CancellationToken::new())
        .run(&rows)
        .await;
    assert_eq!(summary.sources[0].end, SourceEnd::Completed);
    assert_eq!(adapter.calls().len(), 2);
    assert!(!path.exists());
}

// -- Skips, disambiguation and the run summary --

#[tokio::test]
async fn skipped_rows_never_reach_the_adapter() {
    let mut rows = ledger(3);
    rows.push(LedgerRow::new("Console Game", "NES"));
    let dir = tempfile::tempdir().unwrap();
    let adapter = MockAdapter::skipping(JOLT, |row| row.platform != "PC", even_matches);

    let summary = orchestrator(config(dir.path(), 10, vec![JOLT]), &[adapter.clone()], CancellationToken::new())
        .run(&rows)
        .await;
    assert_eq!(adapter.calls(), titles(&rows[..3]));
    assert_eq!(summary.source(JOLT).unwrap().counts.skipped, 1);

    let result = ResultStore::new(dir.path())
        .load_batch(JOLT, BatchRange::new(0, 4))
        .unwrap();
    assert_eq!(result.kind_of(&rows[3].hash_id()), Some(OutcomeKind::Skipped));
}

#[tokio::test]
async fn summary_lists_rows_no_source_matched() {
    let rows = ledger(4);
    let dir = tempfile::tempdir().unwrap();
    let moby = MockAdapter::new(MOBY, even_matches);
    let jolt = MockAdapter::new(JOLT, |row: &LedgerRow| {
        Ok(if row.title == "Game 1" { vec![hit(row)] } else { vec![] })
    });

    let summary = orchestrator(config(dir.path(), 10, vec![MOBY, JOLT]), &[moby, jolt], CancellationToken::new())
        .run(&rows)
        .await;
    assert!(summary.all_completed());
    assert_eq!(summary.unmatched, vec![rows[3].full_name()]);
    assert_eq!(summary.pending, 0);
}

fn weak(title: &str, platform: bool) -> MatchCandidate {
    MatchCandidate::new(
        title,
        ValidationInfo {
            title_matched: true,
            platform_matched: platform,
            ..Default::default()
        },
    )
}

#[tokio::test]
async fn ambiguous_rows_go_to_the_resolver() {
    let rows = ledger(1);
    let dir = tempfile::tempdir().unwrap();
    let adapter = MockAdapter::new(MOBY, |_: &LedgerRow| Ok(vec![weak("Game Zero", false), weak("Game 0 Deluxe", true)]));

    let offered = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&offered);
    let resolver = move |_: DataSource, _: &LedgerRow, candidates: &[MatchCandidate]| {
        seen.lock()
            .unwrap()
            .extend(candidates.iter().map(|c| c.title.clone()));
        Some(1)
    };

    orchestrator(config(dir.path(), 10, vec![MOBY]), &[adapter], CancellationToken::new())
        .with_resolver(Arc::new(resolver))
        .run(&rows)
        .await;

    assert_eq!(*offered.lock().unwrap(), vec!["Game 0 Deluxe".to_string(), "Game Zero".to_string()]);
    let result = ResultStore::new(dir.path())
        .load_batch(MOBY, BatchRange::new(0, 1))
        .unwrap();
    let chosen = &result.successes[&rows[0].hash_id()].candidates;
    assert_eq!(chosen.len(), 1);
    assert_eq!(chosen[0].title, "Game Zero");
}

#[tokio::test]
async fn automatic_resolution_declines_weak_candidates() {
    let rows = ledger(1);
    let dir = tempfile::tempdir().unwrap();
    let adapter = MockAdapter::new(MOBY, |_: &LedgerRow| Ok(vec![weak("Game Zero", true), weak("Game 0 Deluxe", true)]));

    let summary = orchestrator(config(dir.path(), 10, vec![MOBY]), &[adapter], CancellationToken::new())
        .run(&rows)
        .await;
    assert_eq!(summary.source(MOBY).unwrap().counts.no_match, 1);
    assert_eq!(summary.unmatched, vec![rows[0].full_name()]);
}

fn graded(title: &str, exact: bool, platform: bool, date: bool) -> MatchCandidate {
    MatchCandidate::new(
        title,
        ValidationInfo {
            title_matched: true,
            exact,
            platform_matched: platform,
            date_matched: date,
            ..Default::default()
        },
    )
}

#[tokio::test]
async fn exact_title_from_the_wrong_year_goes_to_the_resolver() {
    let rows = ledger(1);
    let dir = tempfile::tempdir().unwrap();
    let adapter = MockAdapter::new(MOBY, |row: &LedgerRow| Ok(vec![graded(&row.title, true, true, false)]));

    let asked = Arc::new(Mutex::new(0));
    let count = Arc::clone(&asked);
    let resolver = move |_: DataSource, _: &LedgerRow, candidates: &[MatchCandidate]| -> Option<usize> {
        *count.lock().unwrap() += candidates.len();
        None
    };

    let summary = orchestrator(config(dir.path(), 10, vec![MOBY]), &[adapter], CancellationToken::new())
        .with_resolver(Arc::new(resolver))
        .run(&rows)
        .await;
    assert_eq!(*asked.lock().unwrap(), 1);
    assert_eq!(summary.source(MOBY).unwrap().counts.no_match, 1);
}

#[tokio::test]
async fn automatic_resolution_accepts_the_lone_full_match() {
    let rows = ledger(1);
    let dir = tempfile::tempdir().unwrap();
    let adapter = MockAdapter::new(MOBY, |row: &LedgerRow| {
        Ok(vec![
            graded(&row.title, true, true, false),
            graded(&format!("{} DX", row.title), false, true, true),
        ])
    });

    let summary = orchestrator(config(dir.path(), 10, vec![MOBY]), &[adapter], CancellationToken::new())
        .run(&rows)
        .await;
    assert_eq!(summary.source(MOBY).unwrap().counts.matched, 1);
    assert!(summary.unmatched.is_empty());

    let result = ResultStore::new(dir.path())
        .load_batch(MOBY, BatchRange::new(0, 1))
        .unwrap();
    let chosen = &result.successes[&rows[0].hash_id()].candidates;
    assert_eq!(chosen.len(), 1);
    assert_eq!(chosen[0].title, "Game 0 DX");
}
