//! Resumable state for an interrupted batch.

use game_ledger_core::DataSource;
use serde::{Deserialize, Serialize};

use crate::batch::{BatchRange, BatchResult};

/// Bumped whenever the serialized layout changes; older checkpoints are
/// discarded rather than misread.
pub const CHECKPOINT_VERSION: u32 = 1;

/// Partial progress of one batch of one source.
///
/// `row_hashes` records which rows the batch covered when it was
/// interrupted; a checkpoint only applies to a run whose rows at the same
/// offsets hash identically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointState {
    pub version: u32,
    pub source: DataSource,
    pub range: BatchRange,
    pub batch_size: usize,
    pub row_hashes: Vec<String>,
    /// Index within the batch of the first row not yet processed.
    pub next_index: usize,
    pub result: BatchResult,
    pub saved_at: chrono::DateTime<chrono::Utc>,
}

/// Why a checkpoint cannot be applied to the current run.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CheckpointMismatch {
    #[error("format version {found}, expected {expected}")]
    Version { found: u32, expected: u32 },

    #[error("written for {found}, not {expected}")]
    Source { found: DataSource, expected: DataSource },

    #[error("covers rows {found} with batch size {found_size}, expected {expected} with batch size {expected_size}")]
    Range {
        found: BatchRange,
        found_size: usize,
        expected: BatchRange,
        expected_size: usize,
    },

    #[error("row {index} of the batch has changed since the checkpoint was written")]
    RowChanged { index: usize },

    #[error("resume offset {next_index} is past the end of a {len}-row batch")]
    Offset { next_index: usize, len: usize },
}

impl CheckpointState {
    pub fn new(
        source: DataSource,
        range: BatchRange,
        batch_size: usize,
        row_hashes: Vec<String>,
        next_index: usize,
        result: BatchResult,
    ) -> Self {
        Self {
            version: CHECKPOINT_VERSION,
            source,
            range,
            batch_size,
            row_hashes,
            next_index,
            result,
            saved_at: chrono::Utc::now(),
        }
    }

    /// Check that this checkpoint was written for exactly these rows.
    pub fn verify(
        &self,
        source: DataSource,
        range: BatchRange,
        batch_size: usize,
        row_hashes: &[String],
    ) -> Result<(), CheckpointMismatch> {
        if self.version != CHECKPOINT_VERSION {
            return Err(CheckpointMismatch::Version {
                found: self.version,
                expected: CHECKPOINT_VERSION,
            });
        }
        if self.source != source {
            return Err(CheckpointMismatch::Source {
                found: self.source,
                expected: source,
            });
        }
        if self.range != range || self.batch_size != batch_size {
            return Err(CheckpointMismatch::Range {
                found: self.range,
                found_size: self.batch_size,
                expected: range,
                expected_size: batch_size,
            });
        }
        if let Some(index) = first_difference(&self.row_hashes, row_hashes) {
            return Err(CheckpointMismatch::RowChanged { index });
        }
        if self.next_index > row_hashes.len() {
            return Err(CheckpointMismatch::Offset {
                next_index: self.next_index,
                len: row_hashes.len(),
            });
        }
        Ok(())
    }
}

fn first_difference(a: &[String], b: &[String]) -> Option<usize> {
    a.iter()
        .zip(b)
        .position(|(x, y)| x != y)
        .or_else(|| (a.len() != b.len()).then(|| a.len().min(b.len())))
}
