//! API keys for sources that require them.
//!
//! Keys come from environment variables first, then the `[keys]` table of
//! the shared config file.

use std::collections::HashMap;
use std::path::Path;

use game_ledger_core::settings;

use crate::error::ScrapeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiKey {
    MobyGames,
    GiantBomb,
    IgdbClientId,
    IgdbClientSecret,
    SteamWebApi,
    PriceCharting,
}

const ALL_KEYS: &[ApiKey] = &[
    ApiKey::MobyGames,
    ApiKey::GiantBomb,
    ApiKey::IgdbClientId,
    ApiKey::IgdbClientSecret,
    ApiKey::SteamWebApi,
    ApiKey::PriceCharting,
];

impl ApiKey {
    pub fn env_var(&self) -> &'static str {
        match self {
            Self::MobyGames => "MOBYGAMES_API_KEY",
            Self::GiantBomb => "GIANTBOMB_API_KEY",
            Self::IgdbClientId => "IGDB_CLIENT_ID",
            Self::IgdbClientSecret => "IGDB_CLIENT_SECRET",
            Self::SteamWebApi => "STEAM_WEB_API_KEY",
            Self::PriceCharting => "PRICECHARTING_API_KEY",
        }
    }

    /// Name of the entry in the `[keys]` table.
    pub fn config_key(&self) -> &'static str {
        match self {
            Self::MobyGames => "mobygames",
            Self::GiantBomb => "giantbomb",
            Self::IgdbClientId => "igdb_client_id",
            Self::IgdbClientSecret => "igdb_client_secret",
            Self::SteamWebApi => "steam_web_api",
            Self::PriceCharting => "pricecharting",
        }
    }

    pub fn all() -> &'static [ApiKey] {
        ALL_KEYS
    }
}

/// Where a key's value came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeySource {
    EnvVar(&'static str),
    ConfigFile,
    Missing,
}

impl std::fmt::Display for KeySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EnvVar(var) => write!(f, "env ${}", var),
            Self::ConfigFile => write!(f, "config file"),
            Self::Missing => write!(f, "not set"),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ApiKeys {
    values: HashMap<ApiKey, (String, KeySource)>,
}

impl ApiKeys {
    /// Load from the process environment and the default config file.
    pub fn load() -> Self {
        Self::load_with(&settings::config_path(), |var| std::env::var(var).ok())
    }

    /// Load with an explicit config path and environment lookup.
    pub fn load_with(config: &Path, env: impl Fn(&str) -> Option<String>) -> Self {
        let table = settings::read_table(config, "keys").unwrap_or_default();
        let mut values = HashMap::new();
        for &key in ALL_KEYS {
            let from_env = env(key.env_var())
                .filter(|v| !v.trim().is_empty())
                .map(|v| (v, KeySource::EnvVar(key.env_var())));
            let from_file = || {
                table
                    .get(key.config_key())
                    .and_then(|v| v.as_str())
                    .filter(|v| !v.trim().is_empty())
                    .map(|v| (v.to_string(), KeySource::ConfigFile))
            };
            if let Some(found) = from_env.or_else(from_file) {
                values.insert(key, found);
            }
        }
        Self { values }
    }

    /// Keys given directly, e.g. in tests.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (ApiKey, String)>) -> Self {
        let values = pairs
            .into_iter()
            .map(|(key, value)| (key, (value, KeySource::ConfigFile)))
            .collect();
        Self { values }
    }

    pub fn get(&self, key: ApiKey) -> Option<&str> {
        self.values.get(&key).map(|(v, _)| v.as_str())
    }

    pub fn source_of(&self, key: ApiKey) -> KeySource {
        self.values
            .get(&key)
            .map(|(_, s)| s.clone())
            .unwrap_or(KeySource::Missing)
    }

    /// The key, or a configuration error naming both ways to set it.
    pub fn require(&self, key: ApiKey) -> Result<&str, ScrapeError> {
        self.get(key).ok_or_else(|| {
            ScrapeError::config(format!(
                "Missing API key. Set {} or add `{}` to the [keys] table in {}",
                key.env_var(),
                key.config_key(),
                settings::config_path().display()
            ))
        })
    }
}
