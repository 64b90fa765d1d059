use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::region::Region;

/// One row of the personal collection ledger.
///
/// Rows are immutable once loaded. [`hash_id`](Self::hash_id) is derived from
/// the identifying fields only, so notes and owned format can change without
/// invalidating persisted match results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerRow {
    pub title: String,
    pub platform: String,
    /// `None` for unreleased or early-access titles.
    pub release_date: Option<NaiveDate>,
    pub release_region: Option<Region>,
    pub publisher: Option<String>,
    pub developer: Option<String>,
    pub franchise: Option<String>,
    pub genre: Option<String>,
    pub notes: Option<String>,
    pub owned_format: Option<String>,
}

impl LedgerRow {
    pub fn new(title: impl Into<String>, platform: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            platform: platform.into(),
            release_date: None,
            release_region: None,
            publisher: None,
            developer: None,
            franchise: None,
            genre: None,
            notes: None,
            owned_format: None,
        }
    }

    pub fn with_release_date(mut self, date: NaiveDate) -> Self {
        self.release_date = Some(date);
        self
    }

    pub fn with_release_region(mut self, region: Region) -> Self {
        self.release_region = Some(region);
        self
    }

    pub fn with_publisher(mut self, publisher: impl Into<String>) -> Self {
        self.publisher = Some(publisher.into());
        self
    }

    pub fn with_developer(mut self, developer: impl Into<String>) -> Self {
        self.developer = Some(developer.into());
        self
    }

    pub fn with_franchise(mut self, franchise: impl Into<String>) -> Self {
        self.franchise = Some(franchise.into());
        self
    }

    pub fn with_genre(mut self, genre: impl Into<String>) -> Self {
        self.genre = Some(genre.into());
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn with_owned_format(mut self, format: impl Into<String>) -> Self {
        self.owned_format = Some(format.into());
        self
    }

    pub fn release_year(&self) -> Option<i32> {
        self.release_date.map(|d| d.year())
    }

    /// Stable identifier used as the key for every persisted result.
    ///
    /// SHA-256 over (title, platform, release year, region, publisher,
    /// developer, franchise, genre). Fields are joined with a unit separator
    /// so that values containing commas or spaces cannot collide.
    pub fn hash_id(&self) -> String {
        let year = self.release_year().map(|y| y.to_string());
        let region = self.release_region.map(|r| r.code().to_string());
        let parts: [Option<&str>; 8] = [
            Some(self.title.as_str()),
            Some(self.platform.as_str()),
            year.as_deref(),
            region.as_deref(),
            self.publisher.as_deref(),
            self.developer.as_deref(),
            self.franchise.as_deref(),
            self.genre.as_deref(),
        ];

        let mut hasher = Sha256::new();
        for (i, part) in parts.iter().enumerate() {
            if i > 0 {
                hasher.update([0x1F]);
            }
            match part {
                Some(value) => {
                    hasher.update([b'S']);
                    hasher.update(value.as_bytes());
                }
                None => hasher.update([b'N']),
            }
        }
        format!("{:x}", hasher.finalize())
    }

    /// Human-readable label, e.g. `Chrono Trigger (SNES) [1995]`.
    pub fn full_name(&self) -> String {
        match self.release_year() {
            Some(year) => format!("{} ({}) [{}]", self.title, self.platform, year),
            None => format!("{} ({}) [Unreleased]", self.title, self.platform),
        }
    }
}

#[cfg(test)]
#[path = "tests/row_tests.rs"]
mod tests;
