use serde::{Deserialize, Serialize};

/// Which signals agreed between a ledger row and an external candidate.
///
/// A dimension the candidate has no data for is recorded as `false`; it is
/// never an error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationInfo {
    pub title_matched: bool,
    /// Normalized titles are identical.
    pub exact: bool,
    pub platform_matched: bool,
    pub date_matched: bool,
    pub publisher_matched: bool,
    pub developer_matched: bool,
    pub franchise_matched: bool,
}

const TITLE_WEIGHT: u32 = 4;
const EXACT_WEIGHT: u32 = 2;
const PLATFORM_WEIGHT: u32 = 3;
const DATE_WEIGHT: u32 = 2;
const COMPANY_WEIGHT: u32 = 1;
const FRANCHISE_WEIGHT: u32 = 1;

impl ValidationInfo {
    /// Nothing matched; what `validate` returns when titles disagree.
    pub fn unmatched() -> Self {
        Self::default()
    }

    pub fn likely_match(&self) -> bool {
        self.title_matched && self.platform_matched
    }

    pub fn full_match(&self) -> bool {
        self.likely_match() && self.date_matched
    }

    pub fn guaranteed_match(&self) -> bool {
        self.exact && self.full_match()
    }

    /// Weighted sum of the individual signals, used for ranking.
    pub fn score(&self) -> u32 {
        let weights = [
            (self.title_matched, TITLE_WEIGHT),
            (self.exact, EXACT_WEIGHT),
            (self.platform_matched, PLATFORM_WEIGHT),
            (self.date_matched, DATE_WEIGHT),
            (self.publisher_matched, COMPANY_WEIGHT),
            (self.developer_matched, COMPANY_WEIGHT),
            (self.franchise_matched, FRANCHISE_WEIGHT),
        ];
        weights
            .iter()
            .filter(|(matched, _)| *matched)
            .map(|(_, weight)| weight)
            .sum()
    }
}

/// A search result proposed as a match for a ledger row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchCandidate {
    pub title: String,
    pub url: Option<String>,
    pub source_id: Option<String>,
    /// Source-specific payload, persisted as-is.
    #[serde(default)]
    pub match_info: serde_json::Value,
    pub validation: ValidationInfo,
}

impl MatchCandidate {
    pub fn new(title: impl Into<String>, validation: ValidationInfo) -> Self {
        Self {
            title: title.into(),
            url: None,
            source_id: None,
            match_info: serde_json::Value::Null,
            validation,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_source_id(mut self, id: impl Into<String>) -> Self {
        self.source_id = Some(id.into());
        self
    }

    pub fn with_match_info(mut self, info: serde_json::Value) -> Self {
        self.match_info = info;
        self
    }
}
