//! Batch orchestration: runs every enabled source adapter over the ledger in
//! fixed-size batches, checkpoints interrupted batches, resumes them, and
//! persists per-batch outcomes so reruns only touch unprocessed rows.

pub mod batch;
pub mod checkpoint;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod outcome;
pub mod progress;
pub mod reduce;
pub mod report;
pub mod resolve;
pub mod store;

pub use batch::{BatchRange, BatchResult, OutcomeCounts, RowMatches, RowNote, plan_batches};
pub use checkpoint::{CHECKPOINT_VERSION, CheckpointMismatch, CheckpointState};
pub use config::{ConfigError, RunConfig, parse_sources};
pub use error::BatchError;
pub use orchestrator::{BatchOrchestrator, BatchState};
pub use outcome::{MatchOutcome, OutcomeKind};
pub use progress::{BatchProgress, LogProgress, RowProgress, SilentProgress, format_duration};
pub use reduce::{Reduction, reduce};
pub use report::{RunSummary, SourceEnd, SourceSummary};
pub use resolve::{AutoAccept, Disambiguator};
pub use store::{ProcessedIndex, ResultStore, SourceStatus};
