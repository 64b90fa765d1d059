//! End-of-run summary and the text report written next to the outputs.

use std::fmt;
use std::path::Path;

use game_ledger_core::DataSource;

use crate::batch::OutcomeCounts;

/// How a source task ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceEnd {
    Completed,
    /// The run was cancelled; a checkpoint holds the batch in progress.
    Interrupted,
    /// The source refused further requests (immediate-stop status).
    Stopped(String),
    /// The task could not continue (I/O failure, panic).
    Failed(String),
}

impl SourceEnd {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

impl fmt::Display for SourceEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed => f.write_str("completed"),
            Self::Interrupted => f.write_str("interrupted"),
            Self::Stopped(reason) => write!(f, "stopped: {}", reason),
            Self::Failed(reason) => write!(f, "failed: {}", reason),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSummary {
    pub source: DataSource,
    pub end: SourceEnd,
    /// Outcomes recorded during this run.
    pub counts: OutcomeCounts,
    pub batches_run: usize,
    pub batches_skipped: usize,
}

impl SourceSummary {
    pub fn new(source: DataSource) -> Self {
        Self {
            source,
            end: SourceEnd::Completed,
            counts: OutcomeCounts::default(),
            batches_run: 0,
            batches_skipped: 0,
        }
    }
}

/// Result of a whole run across sources.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// One entry per source that ran, in source order.
    pub sources: Vec<SourceSummary>,
    /// Rows every source has handled without finding a match.
    pub unmatched: Vec<String>,
    /// Rows some source has not handled yet.
    pub pending: usize,
}

impl RunSummary {
    pub fn source(&self, source: DataSource) -> Option<&SourceSummary> {
        self.sources.iter().find(|s| s.source == source)
    }

    pub fn totals(&self) -> OutcomeCounts {
        let mut total = OutcomeCounts::default();
        for summary in &self.sources {
            total += summary.counts;
        }
        total
    }

    pub fn all_completed(&self) -> bool {
        self.sources.iter().all(|s| s.end.is_completed())
    }

    /// Write a human-readable report of the run.
    pub fn write_to_file(&self, path: &Path) -> std::io::Result<()> {
        use std::io::Write;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = std::fs::File::create(path)?;

        writeln!(file, "=== Match Run Report ===")?;
        writeln!(
            file,
            "Date: {}",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
        )?;
        writeln!(file)?;
        writeln!(file, "--- Sources ---")?;
        for s in &self.sources {
            writeln!(
                file,
                "{}: {} ({} batches run, {} skipped)",
                s.source, s.end, s.batches_run, s.batches_skipped
            )?;
            writeln!(file, "     {}", s.counts)?;
        }
        writeln!(file)?;
        writeln!(file, "Total: {}", self.totals())?;
        writeln!(file, "Pending rows: {}", self.pending)?;
        writeln!(file)?;
        writeln!(file, "--- No match in any source ({}) ---", self.unmatched.len())?;
        for row in &self.unmatched {
            writeln!(file, "[NO MATCH] {}", row)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary() -> RunSummary {
        let mut moby = SourceSummary::new(DataSource::MobyGames);
        moby.counts = OutcomeCounts { matched: 3, no_match: 1, errors: 0, skipped: 0 };
        moby.batches_run = 1;
        let mut jolt = SourceSummary::new(DataSource::GameJolt);
        jolt.end = SourceEnd::Stopped("HTTP 403".into());
        jolt.counts.skipped = 2;
        RunSummary {
            sources: vec![moby, jolt],
            unmatched: vec!["Obscure Game (PC) [2001]".into()],
            pending: 2,
        }
    }

    #[test]
    fn totals_add_sources() {
        let s = summary();
        assert_eq!(s.totals(), OutcomeCounts { matched: 3, no_match: 1, errors: 0, skipped: 2 });
        assert!(!s.all_completed());
        assert_eq!(s.source(DataSource::GameJolt).unwrap().end.to_string(), "stopped: HTTP 403");
    }

    #[test]
    fn report_lists_sources_and_gaps() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports").join("run.txt");
        summary().write_to_file(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("=== Match Run Report ==="));
        assert!(text.contains("MobyGames: completed (1 batches run, 0 skipped)"));
        assert!(text.contains("stopped: HTTP 403"));
        assert!(text.contains("[NO MATCH] Obscure Game (PC) [2001]"));
        assert!(text.contains("Pending rows: 2"));
    }
}
