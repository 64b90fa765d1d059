//! Progress reporting for long runs.

use std::time::{Duration, Instant};

use game_ledger_core::DataSource;

use crate::batch::{BatchRange, OutcomeCounts};
use crate::outcome::OutcomeKind;
use crate::report::SourceSummary;

/// One processed row.
#[derive(Debug, Clone)]
pub struct RowProgress<'a> {
    /// 1-based position among the rows this batch has to process.
    pub current: usize,
    pub total: usize,
    pub row: &'a str,
    pub kind: OutcomeKind,
    pub matches: usize,
    pub elapsed: Duration,
    pub eta: Option<Duration>,
}

/// Receives progress updates from every source task.
pub trait BatchProgress: Send + Sync {
    /// `resume_from` is the batch-relative index work starts at.
    fn on_batch_start(&self, source: DataSource, range: BatchRange, resume_from: usize);

    fn on_batch_skipped(&self, source: DataSource, range: BatchRange, reason: &str);

    fn on_row(&self, source: DataSource, progress: &RowProgress<'_>);

    fn on_batch_complete(&self, source: DataSource, range: BatchRange, counts: &OutcomeCounts);

    fn on_source_done(&self, summary: &SourceSummary);
}

/// Discards all updates.
pub struct SilentProgress;

impl BatchProgress for SilentProgress {
    fn on_batch_start(&self, _source: DataSource, _range: BatchRange, _resume_from: usize) {}
    fn on_batch_skipped(&self, _source: DataSource, _range: BatchRange, _reason: &str) {}
    fn on_row(&self, _source: DataSource, _progress: &RowProgress<'_>) {}
    fn on_batch_complete(&self, _source: DataSource, _range: BatchRange, _counts: &OutcomeCounts) {}
    fn on_source_done(&self, _summary: &SourceSummary) {}
}

/// Logs every update through the `log` crate.
pub struct LogProgress;

impl BatchProgress for LogProgress {
    fn on_batch_start(&self, source: DataSource, range: BatchRange, resume_from: usize) {
        if resume_from > 0 {
            log::info!(
                "{}: resuming batch {} at row {}",
                source,
                range,
                range.start + resume_from
            );
        } else {
            log::info!("{}: starting batch {}", source, range);
        }
    }

    fn on_batch_skipped(&self, source: DataSource, range: BatchRange, reason: &str) {
        log::info!("{}: skipping batch {}: {}", source, range, reason);
    }

    fn on_row(&self, source: DataSource, p: &RowProgress<'_>) {
        let eta = p.eta.map(format_duration).unwrap_or_else(|| "?".to_string());
        log::info!(
            "{}: [{}/{}] {} -> {} ({} candidates, {} elapsed, ETA {})",
            source,
            p.current,
            p.total,
            p.row,
            p.kind,
            p.matches,
            format_duration(p.elapsed),
            eta
        );
    }

    fn on_batch_complete(&self, source: DataSource, range: BatchRange, counts: &OutcomeCounts) {
        log::info!("{}: finished batch {}: {}", source, range, counts);
    }

    fn on_source_done(&self, summary: &SourceSummary) {
        log::info!("{}: {} ({})", summary.source, summary.end, summary.counts);
    }
}

/// Elapsed time and a linear ETA over a known number of rows.
#[derive(Debug)]
pub struct RowClock {
    started: Instant,
    done: usize,
    total: usize,
}

impl RowClock {
    pub fn start(total: usize) -> Self {
        Self {
            started: Instant::now(),
            done: 0,
            total,
        }
    }

    /// Mark one more row done; returns (rows done, elapsed, ETA).
    pub fn tick(&mut self) -> (usize, Duration, Option<Duration>) {
        self.done += 1;
        let elapsed = self.started.elapsed();
        (self.done, elapsed, estimate(elapsed, self.done, self.total))
    }
}

fn estimate(elapsed: Duration, done: usize, total: usize) -> Option<Duration> {
    if done == 0 {
        return None;
    }
    let remaining = total.saturating_sub(done) as u32;
    Some(elapsed / done as u32 * remaining)
}

/// `1h02m03s`, `4m05s` or `12s`.
pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    let (h, m, s) = (secs / 3600, secs / 60 % 60, secs % 60);
    if h > 0 {
        format!("{}h{:02}m{:02}s", h, m, s)
    } else if m > 0 {
        format!("{}m{:02}s", m, s)
    } else {
        format!("{}s", s)
    }
}
