//! Shared file locations (config file, default output directory).
//!
//! The CLI, the key loader and the run config loader all go through these
//! functions so the config file is always
//! `~/.config/game-ledger/config.toml`.

use std::path::{Path, PathBuf};

/// Canonical path to the config file: `~/.config/game-ledger/config.toml`.
pub fn config_path() -> PathBuf {
    let config = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    config.join("game-ledger").join("config.toml")
}

/// Default root for persisted match outputs and checkpoints.
pub fn default_output_dir() -> PathBuf {
    let data = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
    data.join("game-ledger").join("matches")
}

/// Read one top-level table (e.g. `[keys]`) from a config file.
///
/// A missing file, unparsable TOML or an absent table all yield `None`;
/// callers fall back to defaults.
pub fn read_table(path: &Path, name: &str) -> Option<toml::Table> {
    let contents = std::fs::read_to_string(path).ok()?;
    let mut doc: toml::Table = contents.parse().ok()?;
    match doc.remove(name)? {
        toml::Value::Table(table) => Some(table),
        _ => None,
    }
}

/// The whole config file re-serialized for display, if it exists and parses.
pub fn load_config_string(path: &Path) -> Option<String> {
    let contents = std::fs::read_to_string(path).ok()?;
    let doc: toml::Table = contents.parse().ok()?;
    toml::to_string_pretty(&doc).ok()
}
