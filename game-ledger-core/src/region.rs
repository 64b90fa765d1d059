use serde::{Deserialize, Serialize};

/// Release region of a ledger row, using the two-letter codes from the
/// collection spreadsheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Region {
    #[serde(rename = "AS")]
    Asia,
    #[serde(rename = "BR")]
    Brazil,
    #[serde(rename = "DE")]
    Germany,
    #[serde(rename = "EU")]
    Europe,
    #[serde(rename = "FR")]
    France,
    #[serde(rename = "JP")]
    Japan,
    #[serde(rename = "KO")]
    Korea,
    #[serde(rename = "NA")]
    NorthAmerica,
    #[serde(rename = "SP")]
    Spain,
    #[serde(rename = "TW")]
    Taiwan,
    #[serde(rename = "IT")]
    Italy,
}

const ALL_REGIONS: &[Region] = &[
    Region::Asia,
    Region::Brazil,
    Region::Germany,
    Region::Europe,
    Region::France,
    Region::Japan,
    Region::Korea,
    Region::NorthAmerica,
    Region::Spain,
    Region::Taiwan,
    Region::Italy,
];

impl Region {
    /// Two-letter code as written in the ledger.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Asia => "AS",
            Self::Brazil => "BR",
            Self::Germany => "DE",
            Self::Europe => "EU",
            Self::France => "FR",
            Self::Japan => "JP",
            Self::Korea => "KO",
            Self::NorthAmerica => "NA",
            Self::Spain => "SP",
            Self::Taiwan => "TW",
            Self::Italy => "IT",
        }
    }

    pub fn all() -> &'static [Region] {
        ALL_REGIONS
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Error returned when a string is not a known region code.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown release region: '{0}'")]
pub struct RegionParseError(pub String);

impl std::str::FromStr for Region {
    type Err = RegionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_uppercase();
        ALL_REGIONS
            .iter()
            .copied()
            .find(|r| r.code() == upper)
            .ok_or_else(|| RegionParseError(s.to_string()))
    }
}
