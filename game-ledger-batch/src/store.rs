//! On-disk layout of run outputs.
//!
//! ```text
//! <output_dir>/<source>/matches_000000_000050.json
//!                       no_matches_000000_000050.json
//!                       errors_000000_000050.json
//!                       skipped_000000_000050.json
//!                       checkpoint_000050_000100.json
//! ```
//!
//! Output files map row hash to payload; the union of all output files of a
//! source is what counts as "already processed".

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use game_ledger_core::DataSource;
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::{Deserialize, Serialize};

use crate::batch::{BatchRange, BatchResult, OutcomeCounts, RowMatches, RowNote};
use crate::checkpoint::CheckpointState;
use crate::error::BatchError;
use crate::outcome::OutcomeKind;

const CHECKPOINT_PREFIX: &str = "checkpoint";

#[derive(Debug, Serialize, Deserialize)]
struct OutputFile<M> {
    source: DataSource,
    kind: OutcomeKind,
    range: BatchRange,
    written_at: DateTime<Utc>,
    rows: M,
}

/// What a file in a source directory holds, from its name alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StoredFile {
    Output(OutcomeKind, BatchRange),
    Checkpoint(BatchRange),
}

fn parse_file_name(name: &str) -> Option<StoredFile> {
    let stem = name.strip_suffix(".json")?;
    let mut parts = stem.rsplitn(3, '_');
    let end = parts.next()?.parse().ok()?;
    let start = parts.next()?.parse().ok()?;
    let prefix = parts.next()?;
    let range = BatchRange::new(start, end);
    if prefix == CHECKPOINT_PREFIX {
        return Some(StoredFile::Checkpoint(range));
    }
    prefix.parse().ok().map(|kind| StoredFile::Output(kind, range))
}

/// Persisted outputs and checkpoints under one root directory.
#[derive(Debug, Clone)]
pub struct ResultStore {
    root: PathBuf,
}

impl ResultStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn source_dir(&self, source: DataSource) -> PathBuf {
        self.root.join(source.short_name())
    }

    pub fn output_path(&self, source: DataSource, kind: OutcomeKind, range: BatchRange) -> PathBuf {
        self.source_dir(source).join(file_name(kind.file_prefix(), range))
    }

    pub fn checkpoint_path(&self, source: DataSource, range: BatchRange) -> PathBuf {
        self.source_dir(source).join(file_name(CHECKPOINT_PREFIX, range))
    }

    /// Persist a finished batch, one file per non-empty outcome kind.
    /// Files for kinds the batch no longer has are removed.
    pub fn write_batch(&self, source: DataSource, range: BatchRange, result: &BatchResult) -> Result<(), BatchError> {
        let (matched, unmatched) = result.partition_successes();
        self.write_kind(source, range, OutcomeKind::Match, &matched)?;
        self.write_kind(source, range, OutcomeKind::NoMatch, &unmatched)?;
        self.write_kind(source, range, OutcomeKind::Error, &result.errors)?;
        self.write_kind(source, range, OutcomeKind::Skipped, &result.skipped)?;
        Ok(())
    }

    fn write_kind<T: Serialize>(
        &self,
        source: DataSource,
        range: BatchRange,
        kind: OutcomeKind,
        rows: &BTreeMap<String, T>,
    ) -> Result<(), BatchError> {
        let path = self.output_path(source, kind, range);
        if rows.is_empty() {
            return remove_if_exists(&path).map(|_| ());
        }
        let file = OutputFile {
            source,
            kind,
            range,
            written_at: Utc::now(),
            rows,
        };
        write_json_atomic(&path, &file)
    }

    /// Outputs previously written for exactly this batch.
    pub fn load_batch(&self, source: DataSource, range: BatchRange) -> Result<BatchResult, BatchError> {
        let mut result = BatchResult::new();
        for kind in [OutcomeKind::Match, OutcomeKind::NoMatch] {
            if let Some(rows) = self.read_rows::<RowMatches>(&self.output_path(source, kind, range))? {
                result.successes.extend(rows);
            }
        }
        if let Some(rows) = self.read_rows::<RowNote>(&self.output_path(source, OutcomeKind::Error, range))? {
            result.errors = rows;
        }
        if let Some(rows) = self.read_rows::<RowNote>(&self.output_path(source, OutcomeKind::Skipped, range))? {
            result.skipped = rows;
        }
        Ok(result)
    }

    fn read_rows<T: DeserializeOwned>(&self, path: &Path) -> Result<Option<BTreeMap<String, T>>, BatchError> {
        let Some(contents) = read_if_exists(path)? else {
            return Ok(None);
        };
        let file: OutputFile<BTreeMap<String, T>> =
            serde_json::from_str(&contents).map_err(|e| BatchError::json(path, e))?;
        Ok(Some(file.rows))
    }

    pub fn save_checkpoint(&self, state: &CheckpointState) -> Result<PathBuf, BatchError> {
        let path = self.checkpoint_path(state.source, state.range);
        write_json_atomic(&path, state)?;
        Ok(path)
    }

    /// The checkpoint for this batch, if one was saved. An unreadable file is
    /// reported as an error so the caller can discard it.
    pub fn load_checkpoint(&self, source: DataSource, range: BatchRange) -> Result<Option<CheckpointState>, BatchError> {
        let path = self.checkpoint_path(source, range);
        let Some(contents) = read_if_exists(&path)? else {
            return Ok(None);
        };
        serde_json::from_str(&contents)
            .map(Some)
            .map_err(|e| BatchError::json(path, e))
    }

    /// Returns whether a checkpoint existed.
    pub fn remove_checkpoint(&self, source: DataSource, range: BatchRange) -> Result<bool, BatchError> {
        remove_if_exists(&self.checkpoint_path(source, range))
    }

    /// Ranges with a pending checkpoint, in row order.
    pub fn checkpoints(&self, source: DataSource) -> Result<Vec<BatchRange>, BatchError> {
        let mut ranges: Vec<BatchRange> = self
            .stored_files(source)?
            .into_iter()
            .filter_map(|(file, _)| match file {
                StoredFile::Checkpoint(range) => Some(range),
                StoredFile::Output(..) => None,
            })
            .collect();
        ranges.sort();
        Ok(ranges)
    }

    /// Union of every output file of `source`.
    pub fn load_processed(&self, source: DataSource, retry_errors: bool) -> Result<ProcessedIndex, BatchError> {
        let mut index = ProcessedIndex::new(retry_errors);
        for (file, path) in self.stored_files(source)? {
            let StoredFile::Output(kind, _) = file else {
                continue;
            };
            if let Some(rows) = self.read_rows::<IgnoredAny>(&path)? {
                for hash in rows.into_keys() {
                    index.insert(hash, kind);
                }
            }
        }
        Ok(index)
    }

    /// Counts of persisted outcomes and pending checkpoints for `source`.
    pub fn status(&self, source: DataSource) -> Result<SourceStatus, BatchError> {
        let index = self.load_processed(source, false)?;
        let batches = self
            .stored_files(source)?
            .into_iter()
            .filter_map(|(file, _)| match file {
                StoredFile::Output(_, range) => Some(range),
                StoredFile::Checkpoint(_) => None,
            })
            .collect::<std::collections::BTreeSet<_>>()
            .len();
        Ok(SourceStatus {
            source,
            counts: index.counts(),
            batches,
            checkpoints: self.checkpoints(source)?,
        })
    }

    /// Sources that have a directory under the root.
    pub fn sources(&self) -> Result<Vec<DataSource>, BatchError> {
        if !self.root.is_dir() {
            return Ok(Vec::new());
        }
        let mut sources = Vec::new();
        for entry in std::fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            if let Some(source) = entry.file_name().to_str().and_then(|n| n.parse().ok()) {
                sources.push(source);
            }
        }
        sources.sort();
        Ok(sources)
    }

    fn stored_files(&self, source: DataSource) -> Result<Vec<(StoredFile, PathBuf)>, BatchError> {
        let dir = self.source_dir(source);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut files = Vec::new();
        for entry in std::fs::read_dir(&dir)? {
            let entry = entry?;
            let name = entry.file_name();
            if let Some(file) = name.to_str().and_then(parse_file_name) {
                files.push((file, entry.path()));
            }
        }
        Ok(files)
    }
}

fn file_name(prefix: &str, range: BatchRange) -> String {
    format!("{}_{:06}_{:06}.json", prefix, range.start, range.end)
}

fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), BatchError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let contents = serde_json::to_string_pretty(value).map_err(|e| BatchError::json(path, e))?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, contents)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

fn read_if_exists(path: &Path) -> Result<Option<String>, BatchError> {
    match std::fs::read_to_string(path) {
        Ok(contents) => Ok(Some(contents)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn remove_if_exists(path: &Path) -> Result<bool, BatchError> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

/// Row hashes a source has already handled, with their outcome.
#[derive(Debug, Clone, Default)]
pub struct ProcessedIndex {
    kinds: HashMap<String, OutcomeKind>,
    retry_errors: bool,
}

impl ProcessedIndex {
    pub fn new(retry_errors: bool) -> Self {
        Self {
            kinds: HashMap::new(),
            retry_errors,
        }
    }

    /// Add a persisted outcome. When a hash shows up in several files (batch
    /// boundaries changed between runs) the most useful outcome wins.
    pub fn insert(&mut self, hash: String, kind: OutcomeKind) {
        let rank = |k: OutcomeKind| match k {
            OutcomeKind::Match => 3,
            OutcomeKind::NoMatch => 2,
            OutcomeKind::Skipped => 1,
            OutcomeKind::Error => 0,
        };
        self.kinds
            .entry(hash)
            .and_modify(|existing| {
                if rank(kind) > rank(*existing) {
                    *existing = kind;
                }
            })
            .or_insert(kind);
    }

    /// Take a freshly written batch into account; its outcomes replace
    /// whatever was known before.
    pub fn absorb(&mut self, result: &BatchResult) {
        for (hash, kind) in result.kinds() {
            self.kinds.insert(hash.to_string(), kind);
        }
    }

    pub fn kind_of(&self, hash: &str) -> Option<OutcomeKind> {
        self.kinds.get(hash).copied()
    }

    /// Whether the row needs no further work. Errors count as processed
    /// unless the index was built for retrying them.
    pub fn is_processed(&self, hash: &str) -> bool {
        match self.kind_of(hash) {
            Some(OutcomeKind::Error) => !self.retry_errors,
            Some(_) => true,
            None => false,
        }
    }

    pub fn is_matched(&self, hash: &str) -> bool {
        self.kind_of(hash) == Some(OutcomeKind::Match)
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    pub fn counts(&self) -> OutcomeCounts {
        let mut counts = OutcomeCounts::default();
        for kind in self.kinds.values() {
            counts.add(*kind);
        }
        counts
    }
}

/// Persisted state of one source, for the `status` command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceStatus {
    pub source: DataSource,
    pub counts: OutcomeCounts,
    /// Distinct batch ranges with at least one output file.
    pub batches: usize,
    pub checkpoints: Vec<BatchRange>,
}

#[cfg(test)]
#[path = "tests/store_tests.rs"]
mod tests;
