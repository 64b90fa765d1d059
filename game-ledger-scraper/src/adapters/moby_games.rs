//! MobyGames JSON API.
//!
//! A title search returns games with their platforms. Titles are checked
//! against the row (falling back to alternate titles); for a title that
//! matches on the row's platform, a second request fetches that platform's
//! releases to confirm release year, publisher and developer.

use std::sync::Arc;

use futures::future::BoxFuture;
use game_ledger_core::{DataSource, LedgerRow, MatchCandidate, ValidationInfo};
use game_ledger_matcher::{CandidateFacts, MatchValidator};
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;

use crate::adapter::SourceAdapter;
use crate::client::{ClientConfig, HttpClient, Request};
use crate::error::ScrapeError;
use crate::rate_limit::{RateLimit, TimeUnit};

pub const BASE_URL: &str = "https://api.mobygames.com/v1";

pub struct MobyGamesAdapter {
    client: HttpClient,
    api_key: String,
    validator: Arc<MatchValidator>,
    base_url: String,
}

impl MobyGamesAdapter {
    /// Request policy: 360 requests per hour, and a rejected key (401)
    /// stops the source.
    pub fn client_config() -> ClientConfig {
        ClientConfig::new(DataSource::MobyGames, RateLimit::new(360, TimeUnit::Hour))
            .immediate_stop_on(&[401])
    }

    pub fn new(
        api_key: impl Into<String>,
        validator: Arc<MatchValidator>,
        cancel: CancellationToken,
    ) -> Result<Self, ScrapeError> {
        let client = HttpClient::new(Self::client_config(), cancel)?;
        Ok(Self::with_client(client, api_key, validator))
    }

    pub fn with_client(
        client: HttpClient,
        api_key: impl Into<String>,
        validator: Arc<MatchValidator>,
    ) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            validator,
            base_url: BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn request(&self, route: &str) -> Request {
        Request::get(format!("{}/{}", self.base_url, route)).param("api_key", &self.api_key)
    }

    /// Release details for one game on one platform.
    async fn platform_releases(&self, game_id: u64, platform_id: u64) -> Result<Value, ScrapeError> {
        self.client
            .get_json(self.request(&format!("games/{}/platforms/{}", game_id, platform_id)))
            .await
    }

    /// First title (main, then alternates) that passes title validation.
    fn best_title_match(&self, row: &LedgerRow, game: &Value, facts: &CandidateFacts) -> ValidationInfo {
        let main = game_title(game);
        let info = self.validator.validate(row, &main, facts);
        if info.title_matched {
            return info;
        }
        game["alternate_titles"]
            .as_array()
            .into_iter()
            .flatten()
            .filter_map(|alt| alt["title"].as_str())
            .map(|alt| self.validator.validate(row, alt, facts))
            .find(|info| info.title_matched)
            .unwrap_or(info)
    }
}

impl SourceAdapter for MobyGamesAdapter {
    fn source(&self) -> DataSource {
        DataSource::MobyGames
    }

    fn get_candidates<'a>(
        &'a self,
        row: &'a LedgerRow,
    ) -> BoxFuture<'a, Result<Vec<Value>, ScrapeError>> {
        Box::pin(async move {
            let req = self
                .request("games")
                .param("title", &row.title)
                .param("format", "normal");
            let body = self.client.get_json(req).await?;
            match body.get("games") {
                Some(Value::Array(games)) => Ok(games.clone()),
                Some(_) => Err(ScrapeError::parse("MobyGames `games` is not an array")),
                None => Ok(Vec::new()),
            }
        })
    }

    fn to_match<'a>(
        &'a self,
        row: &'a LedgerRow,
        raw: Value,
    ) -> BoxFuture<'a, Result<Option<MatchCandidate>, ScrapeError>> {
        Box::pin(async move {
            let platforms = game_platforms(&raw);
            if platforms.is_empty() {
                return Ok(None);
            }
            let names: Vec<String> = platforms.iter().map(|(_, name)| name.clone()).collect();
            let facts = CandidateFacts::new().platforms(names);

            let info = self.best_title_match(row, &raw, &facts);
            if !info.likely_match() {
                return Ok(None);
            }

            let Some(game_id) = raw["game_id"].as_u64() else {
                return Err(ScrapeError::parse("MobyGames game without game_id"));
            };
            let platform_id = platforms
                .iter()
                .find(|(_, name)| {
                    self.validator
                        .verify_platform(&row.platform, std::slice::from_ref(name))
                })
                .map(|(id, _)| *id);

            let (facts, releases) = match platform_id {
                Some(pid) => {
                    let releases = self.platform_releases(game_id, pid).await?;
                    (release_facts(facts, &releases), releases)
                }
                None => (facts, Value::Null),
            };

            let info = self.best_title_match(row, &raw, &facts);
            let mut candidate =
                MatchCandidate::new(game_title(&raw), info).with_source_id(game_id.to_string());
            if let Some(url) = raw["moby_url"].as_str() {
                candidate = candidate.with_url(url);
            }
            Ok(Some(candidate.with_match_info(
                json!({ "game": raw, "platform_releases": releases }),
            )))
        })
    }
}

fn game_title(game: &Value) -> String {
    let title = game["title"].as_str().unwrap_or_default();
    html_escape::decode_html_entities(title).into_owned()
}

fn game_platforms(game: &Value) -> Vec<(u64, String)> {
    game["platforms"]
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(|p| {
            let id = p["platform_id"].as_u64()?;
            let name = p["platform_name"].as_str()?;
            Some((id, name.to_string()))
        })
        .collect()
}

/// Add release years and company credits from a platform lookup.
fn release_facts(mut facts: CandidateFacts, platform: &Value) -> CandidateFacts {
    for release in platform["releases"].as_array().into_iter().flatten() {
        if let Some(year) = release["release_date"]
            .as_str()
            .and_then(|d| d.get(0..4))
            .and_then(|y| y.parse::<i32>().ok())
        {
            facts.years.push(year);
        }
        for company in release["companies"].as_array().into_iter().flatten() {
            let Some(name) = company["company_name"].as_str() else {
                continue;
            };
            match company["role"].as_str() {
                Some("Published by") => facts.publishers.push(name.to_string()),
                Some("Developed by") => facts.developers.push(name.to_string()),
                _ => {}
            }
        }
    }
    facts
}
