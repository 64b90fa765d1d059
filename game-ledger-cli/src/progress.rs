//! One progress bar per source while a match run is in flight.

use std::collections::HashMap;
use std::sync::Mutex;

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

use game_ledger_batch::{BatchProgress, BatchRange, OutcomeCounts, RowProgress, SourceSummary};
use game_ledger_core::DataSource;

pub(crate) struct BarProgress {
    mp: MultiProgress,
    style: ProgressStyle,
    bars: Mutex<HashMap<DataSource, ProgressBar>>,
}

impl BarProgress {
    pub(crate) fn new() -> Self {
        let style = ProgressStyle::with_template(
            "  {prefix:>12.bold} [{bar:30.cyan/blue}] {pos}/{len} {wide_msg} ({eta})",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ");
        Self {
            mp: MultiProgress::new(),
            style,
            bars: Mutex::new(HashMap::new()),
        }
    }

    fn bar(&self, source: DataSource) -> ProgressBar {
        let mut bars = self.bars.lock().unwrap_or_else(|e| e.into_inner());
        bars.entry(source)
            .or_insert_with(|| {
                let pb = self.mp.add(ProgressBar::new(0));
                pb.set_style(self.style.clone());
                pb.set_prefix(source.display_name());
                pb
            })
            .clone()
    }

    fn note(&self, line: String) {
        if self.mp.println(&line).is_err() {
            log::info!("{}", line);
        }
    }
}

impl BatchProgress for BarProgress {
    fn on_batch_start(&self, source: DataSource, range: BatchRange, resume_from: usize) {
        let pb = self.bar(source);
        pb.set_length(range.len() as u64);
        pb.set_position(resume_from as u64);
        pb.reset_eta();
        if resume_from > 0 {
            self.note(format!(
                "{}: resuming batch {} at row {}",
                source,
                range,
                range.start + resume_from
            ));
        }
    }

    fn on_batch_skipped(&self, source: DataSource, range: BatchRange, reason: &str) {
        log::debug!("{}: skipping batch {}: {}", source, range, reason);
    }

    fn on_row(&self, source: DataSource, progress: &RowProgress<'_>) {
        let pb = self.bar(source);
        pb.inc(1);
        pb.set_message(progress.row.to_string());
    }

    fn on_batch_complete(&self, source: DataSource, range: BatchRange, counts: &OutcomeCounts) {
        self.note(format!("{}: finished batch {}: {}", source, range, counts));
    }

    fn on_source_done(&self, summary: &SourceSummary) {
        let pb = self.bar(summary.source);
        pb.finish_with_message(format!("{} ({})", summary.end, summary.counts));
    }
}
