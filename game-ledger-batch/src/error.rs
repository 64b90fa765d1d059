use std::path::PathBuf;

use crate::checkpoint::CheckpointMismatch;
use crate::config::ConfigError;

/// Errors raised by the orchestrator and its result store.
#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error in {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Stale checkpoint: {0}")]
    CheckpointMismatch(#[from] CheckpointMismatch),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Store(String),
}

impl BatchError {
    pub fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.into(),
            source,
        }
    }

    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }
}
