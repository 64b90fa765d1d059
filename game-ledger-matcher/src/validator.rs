use game_ledger_core::{LedgerRow, ValidationInfo};
use strsim::levenshtein;

use crate::normalize::{DEFAULT_MAX_ROMAN, Normalizer};
use crate::platforms;

/// Largest edit distance between normalized titles still considered equal.
const MAX_EDIT_DISTANCE: usize = 2;

/// Facts an adapter extracted about a candidate, one list per dimension.
///
/// An empty list means the source had nothing to say about that dimension,
/// which scores as "not matched" rather than an error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateFacts {
    pub platforms: Vec<String>,
    pub years: Vec<i32>,
    pub publishers: Vec<String>,
    pub developers: Vec<String>,
    pub franchises: Vec<String>,
}

impl CandidateFacts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn platform(mut self, platform: impl Into<String>) -> Self {
        self.platforms.push(platform.into());
        self
    }

    pub fn platforms<I, S>(mut self, platforms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.platforms.extend(platforms.into_iter().map(Into::into));
        self
    }

    pub fn year(mut self, year: i32) -> Self {
        self.years.push(year);
        self
    }

    pub fn years(mut self, years: impl IntoIterator<Item = i32>) -> Self {
        self.years.extend(years);
        self
    }

    pub fn publisher(mut self, publisher: impl Into<String>) -> Self {
        self.publishers.push(publisher.into());
        self
    }

    pub fn developer(mut self, developer: impl Into<String>) -> Self {
        self.developers.push(developer.into());
        self
    }

    pub fn franchise(mut self, franchise: impl Into<String>) -> Self {
        self.franchises.push(franchise.into());
        self
    }
}

/// Decides whether an external search result denotes the same game as a
/// ledger row.
///
/// Every check is a pure function of its inputs; the only state is the
/// normalization memo, so one validator can be shared by all adapters.
#[derive(Debug, Default)]
pub struct MatchValidator {
    normalizer: Normalizer,
}

impl MatchValidator {
    pub fn new() -> Self {
        Self::with_max_roman(DEFAULT_MAX_ROMAN)
    }

    /// Validator converting Roman numerals up to `max_roman`.
    pub fn with_max_roman(max_roman: u32) -> Self {
        Self {
            normalizer: Normalizer::new(max_roman),
        }
    }

    pub fn normalize(&self, s: &str) -> String {
        self.normalizer.normalize(s)
    }

    pub fn titles_equal_normalized(&self, a: &str, b: &str) -> bool {
        self.normalize(a) == self.normalize(b)
    }

    /// Looser title equality, true when any of these hold:
    ///
    /// - the parts before the first `:` agree once a leading "The " is
    ///   removed (subtitles differ between regions and sources);
    /// - normalized titles are within a small edit distance and neither
    ///   title ends in a digit, before or after normalization, so "Game 2"
    ///   never matches "Game 3" and "Final Fantasy VI" never matches
    ///   "Final Fantasy III";
    /// - one title is a Pokémon title missing the "Version" suffix the
    ///   other carries.
    pub fn titles_equal_fuzzy(&self, a: &str, b: &str) -> bool {
        self.main_titles_equal(a, b) || self.within_edit_distance(a, b) || self.pokemon_version_equal(a, b)
    }

    fn main_titles_equal(&self, a: &str, b: &str) -> bool {
        let main_a = self.normalize(main_title(a));
        let main_b = self.normalize(main_title(b));
        !main_a.is_empty() && main_a == main_b
    }

    fn within_edit_distance(&self, a: &str, b: &str) -> bool {
        if ends_with_digit(a) || ends_with_digit(b) {
            return false;
        }
        let norm_a = self.normalize(a);
        let norm_b = self.normalize(b);
        // Roman sequel numbers are digits once normalized.
        if norm_a.is_empty() || norm_b.is_empty() || ends_with_digit(&norm_a) || ends_with_digit(&norm_b) {
            return false;
        }
        levenshtein(&norm_a, &norm_b) <= MAX_EDIT_DISTANCE
    }

    fn pokemon_version_equal(&self, a: &str, b: &str) -> bool {
        let norm_a = self.normalize(a);
        let norm_b = self.normalize(b);
        let with_suffix = |s: &str| {
            (s.starts_with("pokemon") && !s.ends_with("version")).then(|| format!("{s}version"))
        };
        with_suffix(&norm_a).is_some_and(|s| s == norm_b)
            || with_suffix(&norm_b).is_some_and(|s| s == norm_a)
    }

    /// True when any candidate platform equals `platform` case-insensitively
    /// or is a known alias of it.
    pub fn verify_platform(&self, platform: &str, candidates: &[String]) -> bool {
        let wanted = platform.trim().to_lowercase();
        let aliases = platforms::aliases_for(&wanted).unwrap_or(&[]);
        candidates.iter().any(|candidate| {
            let candidate = candidate.trim().to_lowercase();
            candidate == wanted || aliases.contains(&candidate.as_str())
        })
    }

    pub fn verify_release_year(&self, year: Option<i32>, candidates: &[i32]) -> bool {
        year.is_some_and(|y| candidates.contains(&y))
    }

    /// Normalized membership, used for publishers and developers.
    pub fn verify_component(&self, value: Option<&str>, candidates: &[String]) -> bool {
        let Some(value) = value.map(|v| self.normalize(v)).filter(|v| !v.is_empty()) else {
            return false;
        };
        candidates.iter().any(|c| self.normalize(c) == value)
    }

    /// Like [`verify_component`](Self::verify_component), except that a row
    /// and candidate that both lack franchise data agree.
    pub fn verify_franchise(&self, value: Option<&str>, candidates: &[String]) -> bool {
        let row_empty = value.is_none_or(|v| v.trim().is_empty());
        let candidates_empty = candidates.iter().all(|c| c.trim().is_empty());
        if row_empty && candidates_empty {
            return true;
        }
        self.verify_component(value, candidates)
    }

    /// Score `title` and `facts` against `row`.
    ///
    /// Returns [`ValidationInfo::unmatched`] without looking at any other
    /// dimension when the titles disagree.
    pub fn validate(&self, row: &LedgerRow, title: &str, facts: &CandidateFacts) -> ValidationInfo {
        let exact = self.titles_equal_normalized(&row.title, title);
        if !exact && !self.titles_equal_fuzzy(&row.title, title) {
            return ValidationInfo::unmatched();
        }

        ValidationInfo {
            title_matched: true,
            exact,
            platform_matched: self.verify_platform(&row.platform, &facts.platforms),
            date_matched: self.verify_release_year(row.release_year(), &facts.years),
            publisher_matched: self.verify_component(row.publisher.as_deref(), &facts.publishers),
            developer_matched: self.verify_component(row.developer.as_deref(), &facts.developers),
            franchise_matched: self.verify_franchise(row.franchise.as_deref(), &facts.franchises),
        }
    }
}

/// Title before the first `:`, without a leading "The ".
fn main_title(title: &str) -> &str {
    let head = title.split(':').next().unwrap_or(title).trim();
    head.strip_prefix("The ").unwrap_or(head)
}

fn ends_with_digit(title: &str) -> bool {
    title.trim_end().chars().last().is_some_and(|c| c.is_numeric())
}

#[cfg(test)]
#[path = "tests/validator_tests.rs"]
mod tests;
