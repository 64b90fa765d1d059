//! Ledger rows from a CSV export of the collection spreadsheet.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use serde::Deserialize;

use game_ledger_core::{LedgerRow, Region, RegionParseError};

/// Release date cell meaning "playable but not released yet".
const EARLY_ACCESS: &str = "Early Access";

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d", "%m/%d/%y"];

#[derive(Debug, thiserror::Error)]
pub(crate) enum RowParseError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("line {line}: unrecognized release date '{value}'")]
    Date { line: u64, value: String },

    #[error("line {line}: {source}")]
    Region {
        line: u64,
        #[source]
        source: RegionParseError,
    },
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(rename = "Title")]
    title: String,
    #[serde(rename = "Platform")]
    platform: String,
    #[serde(rename = "Release Date", default)]
    release_date: Option<String>,
    #[serde(rename = "Release Region", default)]
    release_region: Option<String>,
    #[serde(rename = "Publisher", default)]
    publisher: Option<String>,
    #[serde(rename = "Developer", default)]
    developer: Option<String>,
    #[serde(rename = "Franchise", default)]
    franchise: Option<String>,
    #[serde(rename = "Genre", default)]
    genre: Option<String>,
    #[serde(rename = "Notes", default)]
    notes: Option<String>,
    #[serde(rename = "Format", default)]
    format: Option<String>,
}

pub(crate) fn load_rows(path: &Path) -> Result<Vec<LedgerRow>, RowParseError> {
    let file = File::open(path).map_err(csv::Error::from)?;
    read_rows(file)
}

/// Rows with a blank title are spreadsheet padding and are dropped.
pub(crate) fn read_rows<R: Read>(input: R) -> Result<Vec<LedgerRow>, RowParseError> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(input);
    let headers = reader.headers()?.clone();
    let mut record = csv::StringRecord::new();
    let mut rows = Vec::new();
    while reader.read_record(&mut record)? {
        let parsed: CsvRow = record.deserialize(Some(&headers))?;
        if parsed.title.is_empty() {
            continue;
        }
        let line = record.position().map(|p| p.line()).unwrap_or_default();
        rows.push(to_row(parsed, line)?);
    }
    Ok(rows)
}

fn to_row(record: CsvRow, line: u64) -> Result<LedgerRow, RowParseError> {
    let mut row = LedgerRow::new(record.title, record.platform);
    if let Some(value) = present(record.release_date) {
        row.release_date = parse_release_date(&value).ok_or(RowParseError::Date { line, value })?;
    }
    if let Some(value) = present(record.release_region) {
        let region = value
            .parse::<Region>()
            .map_err(|source| RowParseError::Region { line, source })?;
        row = row.with_release_region(region);
    }
    row.publisher = present(record.publisher);
    row.developer = present(record.developer);
    row.franchise = present(record.franchise);
    row.genre = present(record.genre);
    row.notes = present(record.notes);
    row.owned_format = present(record.format);
    Ok(row)
}

fn present(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// `Some(None)` for early access, `None` when the value is not a date.
fn parse_release_date(value: &str) -> Option<Option<NaiveDate>> {
    if value.eq_ignore_ascii_case(EARLY_ACCESS) {
        return Some(None);
    }
    // Spreadsheet exports may append a midnight time.
    let date = value.split_whitespace().next().unwrap_or(value);
    if let Some(parsed) = DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(date, fmt).ok())
    {
        return Some(Some(parsed));
    }
    date.parse::<i32>()
        .ok()
        .filter(|y| (1950..=2100).contains(y))
        .and_then(|y| NaiveDate::from_ymd_opt(y, 1, 1))
        .map(Some)
}

#[cfg(test)]
#[path = "tests/rows_tests.rs"]
mod tests;
