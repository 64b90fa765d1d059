//! Game Jolt site search.
//!
//! Game Jolt only hosts PC games, and a row already attributed to a major
//! storefront is not worth searching there. The site API rejects obvious
//! bots, so requests carry spoofed browser headers; a 403 means the client
//! has been blocked and the source stops.

use std::sync::Arc;

use futures::future::BoxFuture;
use game_ledger_core::{DataSource, LedgerRow, MatchCandidate};
use game_ledger_matcher::{CandidateFacts, MatchValidator};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::adapter::SourceAdapter;
use crate::client::{ClientConfig, HttpClient, Request};
use crate::error::ScrapeError;
use crate::rate_limit::{RateLimit, TimeUnit};

pub const BASE_URL: &str = "https://gamejolt.com/site-api/web";

/// Storefront notes that mean the row is owned somewhere other than Game Jolt.
const STOREFRONT_NOTES: &[&str] = &[
    "Steam",
    "Epic Games Store",
    "GOG",
    "uPlay",
    "Twitch",
    "Amazon",
    "Battle.net",
];

pub struct GameJoltAdapter {
    client: HttpClient,
    validator: Arc<MatchValidator>,
    base_url: String,
}

impl GameJoltAdapter {
    pub fn client_config() -> ClientConfig {
        ClientConfig::new(DataSource::GameJolt, RateLimit::new(600, TimeUnit::Hour))
            .spoof_headers(true)
            .immediate_stop_on(&[403])
    }

    pub fn new(validator: Arc<MatchValidator>, cancel: CancellationToken) -> Result<Self, ScrapeError> {
        let client = HttpClient::new(Self::client_config(), cancel)?;
        Ok(Self::with_client(client, validator))
    }

    pub fn with_client(client: HttpClient, validator: Arc<MatchValidator>) -> Self {
        Self {
            client,
            validator,
            base_url: BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

impl SourceAdapter for GameJoltAdapter {
    fn source(&self) -> DataSource {
        DataSource::GameJolt
    }

    fn should_skip(&self, row: &LedgerRow) -> bool {
        let on_storefront = row
            .notes
            .as_deref()
            .is_some_and(|notes| STOREFRONT_NOTES.contains(&notes.trim()));
        !row.platform.trim().eq_ignore_ascii_case("PC") || on_storefront
    }

    fn get_candidates<'a>(
        &'a self,
        row: &'a LedgerRow,
    ) -> BoxFuture<'a, Result<Vec<Value>, ScrapeError>> {
        Box::pin(async move {
            let req = Request::get(format!("{}/search", self.base_url))
                .param("q", &row.title)
                .param("post-feed-use-offset", 1);
            let body = self.client.get_json(req).await?;
            Ok(body["payload"]["games"].as_array().cloned().unwrap_or_default())
        })
    }

    fn to_match<'a>(
        &'a self,
        row: &'a LedgerRow,
        raw: Value,
    ) -> BoxFuture<'a, Result<Option<MatchCandidate>, ScrapeError>> {
        Box::pin(async move {
            let Some(title) = raw["title"].as_str() else {
                return Ok(None);
            };

            // Everything on Game Jolt is a PC game.
            let mut facts = CandidateFacts::new().platform(row.platform.clone());
            if let Some(year) = posted_year(&raw) {
                facts = facts.year(year);
            }
            if let Some(dev) = raw["developer"]["display_name"].as_str().filter(|d| !d.is_empty()) {
                facts = facts.developer(dev);
            }

            let info = self.validator.validate(row, title, &facts);
            if !info.likely_match() {
                return Ok(None);
            }

            let id = id_string(&raw["id"]);
            let mut candidate = MatchCandidate::new(title, info);
            if let (Some(slug), Some(id)) = (raw["slug"].as_str(), id.as_deref()) {
                candidate = candidate.with_url(format!("https://gamejolt.com/games/{}/{}", slug, id));
            }
            if let Some(id) = id {
                candidate = candidate.with_source_id(id);
            }
            Ok(Some(candidate.with_match_info(raw)))
        })
    }

    /// Stops validating further results once one is a guaranteed match.
    fn match_row<'a>(
        &'a self,
        row: &'a LedgerRow,
    ) -> BoxFuture<'a, Result<Vec<MatchCandidate>, ScrapeError>> {
        Box::pin(async move {
            let mut matches: Vec<MatchCandidate> = Vec::new();
            for raw in self.get_candidates(row).await? {
                if matches.iter().any(|m| m.validation.guaranteed_match()) {
                    break;
                }
                if let Some(candidate) = self.to_match(row, raw).await? {
                    matches.push(candidate);
                }
            }
            Ok(matches)
        })
    }
}

/// Year from the `posted_on` millisecond timestamp.
fn posted_year(game: &Value) -> Option<i32> {
    use chrono::Datelike;
    let millis = game["posted_on"]
        .as_i64()
        .or_else(|| game["posted_on"].as_str().and_then(|s| s.parse().ok()))?;
    chrono::DateTime::from_timestamp_millis(millis).map(|dt| dt.year())
}

fn id_string(id: &Value) -> Option<String> {
    match id {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}
