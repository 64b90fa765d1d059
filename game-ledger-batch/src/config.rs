//! Run configuration: the `[run]` table of the shared config file.
//!
//! ```toml
//! [run]
//! batch_size = 50
//! output_dir = "/home/me/ledger-matches"
//! sources = ["moby_games", "game_jolt"]
//! retry_errors = false
//! ```

use std::path::{Path, PathBuf};

use game_ledger_core::{DataSource, settings};
use serde::Deserialize;

pub const DEFAULT_BATCH_SIZE: usize = 50;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid [run] table: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid [run] table: {0}")]
    Invalid(String),
}

impl ConfigError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::Invalid(msg.into())
    }
}

/// Everything the orchestrator needs to know about a run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub batch_size: usize,
    /// Root of persisted outputs and checkpoints, one subdirectory per source.
    pub output_dir: PathBuf,
    /// Sources to run. Sources without a registered adapter are ignored.
    pub sources: Vec<DataSource>,
    /// Treat rows persisted as errors as unprocessed so they are retried.
    pub retry_errors: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            output_dir: settings::default_output_dir(),
            sources: DataSource::with_adapters(),
            retry_errors: false,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RunTable {
    batch_size: Option<usize>,
    output_dir: Option<PathBuf>,
    sources: Option<Vec<String>>,
    retry_errors: Option<bool>,
}

impl RunConfig {
    /// Defaults overlaid with the `[run]` table of the default config file.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&settings::config_path())
    }

    /// Defaults overlaid with the `[run]` table of `path`. A missing file or
    /// table yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match settings::read_table(path, "run") {
            Some(table) => Self::from_table(table),
            None => Ok(Self::default()),
        }
    }

    fn from_table(table: toml::Table) -> Result<Self, ConfigError> {
        let run: RunTable = toml::Value::Table(table).try_into()?;
        let mut config = Self::default();

        if let Some(size) = run.batch_size {
            if size == 0 {
                return Err(ConfigError::invalid("batch_size must be at least 1"));
            }
            config.batch_size = size;
        }
        if let Some(dir) = run.output_dir {
            config.output_dir = dir;
        }
        if let Some(names) = run.sources {
            config.sources = parse_sources(&names)?;
        }
        if let Some(retry) = run.retry_errors {
            config.retry_errors = retry;
        }
        Ok(config)
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn with_sources(mut self, sources: Vec<DataSource>) -> Self {
        self.sources = sources;
        self
    }

    pub fn with_retry_errors(mut self, retry: bool) -> Self {
        self.retry_errors = retry;
        self
    }
}

/// Parse source names, dropping duplicates while keeping order.
pub fn parse_sources(names: &[String]) -> Result<Vec<DataSource>, ConfigError> {
    let mut sources = Vec::new();
    for name in names {
        let source: DataSource = name
            .parse()
            .map_err(|e| ConfigError::invalid(format!("{}", e)))?;
        if !sources.contains(&source) {
            sources.push(source);
        }
    }
    Ok(sources)
}
