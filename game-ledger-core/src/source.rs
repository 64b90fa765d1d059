use serde::{Deserialize, Serialize};

/// External game-information services a ledger row can be reconciled against.
///
/// This enum is the key of the adapter registry and of every persisted
/// output directory, so `short_name()` must never change for an existing
/// variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    // Catalogs
    GiantBomb,
    Igdb,
    MobyGames,
    GameFaqs,
    Backloggd,
    ArcadeDatabase,
    RomHacking,

    // Reviews and stats
    Metacritic,
    Hltb,
    VgChartz,
    Cooptimus,

    // Prices and storefronts
    PriceCharting,
    Gameye,
    Steam,
    GameJolt,
    Amazon,
}

const ALL_SOURCES: &[DataSource] = &[
    DataSource::GiantBomb,
    DataSource::Igdb,
    DataSource::MobyGames,
    DataSource::GameFaqs,
    DataSource::Backloggd,
    DataSource::ArcadeDatabase,
    DataSource::RomHacking,
    DataSource::Metacritic,
    DataSource::Hltb,
    DataSource::VgChartz,
    DataSource::Cooptimus,
    DataSource::PriceCharting,
    DataSource::Gameye,
    DataSource::Steam,
    DataSource::GameJolt,
    DataSource::Amazon,
];

impl DataSource {
    /// Identifier used for CLI arguments, config files and output folders.
    pub fn short_name(&self) -> &'static str {
        match self {
            Self::GiantBomb => "giant_bomb",
            Self::Igdb => "igdb",
            Self::MobyGames => "moby_games",
            Self::GameFaqs => "game_faqs",
            Self::Backloggd => "backloggd",
            Self::ArcadeDatabase => "arcade_database",
            Self::RomHacking => "rom_hacking",
            Self::Metacritic => "metacritic",
            Self::Hltb => "hltb",
            Self::VgChartz => "vg_chartz",
            Self::Cooptimus => "cooptimus",
            Self::PriceCharting => "price_charting",
            Self::Gameye => "gameye",
            Self::Steam => "steam",
            Self::GameJolt => "game_jolt",
            Self::Amazon => "amazon",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::GiantBomb => "Giant Bomb",
            Self::Igdb => "IGDB",
            Self::MobyGames => "MobyGames",
            Self::GameFaqs => "GameFAQs",
            Self::Backloggd => "Backloggd",
            Self::ArcadeDatabase => "Arcade Database",
            Self::RomHacking => "ROMhacking.net",
            Self::Metacritic => "Metacritic",
            Self::Hltb => "HowLongToBeat",
            Self::VgChartz => "VGChartz",
            Self::Cooptimus => "Co-Optimus",
            Self::PriceCharting => "PriceCharting",
            Self::Gameye => "Gameye",
            Self::Steam => "Steam",
            Self::GameJolt => "Game Jolt",
            Self::Amazon => "Amazon",
        }
    }

    /// Accepted spellings, short name first. Matched case-insensitively.
    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            Self::GiantBomb => &["giant_bomb", "giantbomb", "giant bomb", "gb"],
            Self::Igdb => &["igdb"],
            Self::MobyGames => &["moby_games", "mobygames", "moby", "mobygames.com"],
            Self::GameFaqs => &["game_faqs", "gamefaqs", "faqs"],
            Self::Backloggd => &["backloggd"],
            Self::ArcadeDatabase => &["arcade_database", "arcadedatabase", "adb"],
            Self::RomHacking => &["rom_hacking", "romhacking", "romhacking.net", "rhdn"],
            Self::Metacritic => &["metacritic", "mc"],
            Self::Hltb => &["hltb", "howlongtobeat", "how long to beat"],
            Self::VgChartz => &["vg_chartz", "vgchartz"],
            Self::Cooptimus => &["cooptimus", "co-optimus", "co_optimus"],
            Self::PriceCharting => &["price_charting", "pricecharting"],
            Self::Gameye => &["gameye"],
            Self::Steam => &["steam"],
            Self::GameJolt => &["game_jolt", "gamejolt", "game jolt"],
            Self::Amazon => &["amazon"],
        }
    }

    /// Whether this build ships an adapter for the source.
    pub fn has_adapter(&self) -> bool {
        matches!(self, Self::MobyGames | Self::GameJolt)
    }

    pub fn all() -> &'static [DataSource] {
        ALL_SOURCES
    }

    /// Sources this build can actually run, in registration order.
    pub fn with_adapters() -> Vec<DataSource> {
        ALL_SOURCES.iter().copied().filter(|s| s.has_adapter()).collect()
    }
}

impl std::fmt::Display for DataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Error returned when a string cannot be parsed into a `DataSource`.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown data source: '{0}'")]
pub struct DataSourceParseError(pub String);

impl std::str::FromStr for DataSource {
    type Err = DataSourceParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        ALL_SOURCES
            .iter()
            .copied()
            .find(|source| source.aliases().iter().any(|a| *a == lower))
            .ok_or_else(|| DataSourceParseError(s.to_string()))
    }
}
