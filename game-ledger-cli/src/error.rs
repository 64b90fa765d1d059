use thiserror::Error;

use game_ledger_batch::{BatchError, ConfigError};

use crate::rows::RowParseError;

/// Errors that can occur during CLI command execution.
#[derive(Debug, Error)]
pub(crate) enum CliError {
    /// Ledger file could not be read
    #[error("Ledger error: {0}")]
    Rows(#[from] RowParseError),

    #[error("Config error: {0}")]
    Config(String),

    #[error(transparent)]
    Batch(#[from] BatchError),

    /// One or more sources stopped or failed
    #[error("{0}")]
    Incomplete(String),
}

impl CliError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub(crate) fn incomplete(msg: impl Into<String>) -> Self {
        Self::Incomplete(msg.into())
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e.to_string())
    }
}
