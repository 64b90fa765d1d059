use std::time::Duration;

use game_ledger_core::DataSource;
use reqwest::Method;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::backoff::{Backoff, BackoffPolicy, FailureReason};
use crate::cache::{Payload, ResponseCache};
use crate::error::ScrapeError;
use crate::headers::HeaderSpoofer;
use crate::rate_limit::{RateLimit, RateLimiter};

pub const DEFAULT_USER_AGENT: &str = concat!("game-ledger/", env!("CARGO_PKG_VERSION"));
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Request policy for one source.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub source: DataSource,
    pub rate_limit: RateLimit,
    pub backoff: BackoffPolicy,
    /// Statuses that end the source run at once instead of being retried.
    pub immediate_stop: Vec<u16>,
    pub spoof_headers: bool,
    pub timeout: Duration,
    pub user_agent: String,
    pub cache_responses: bool,
}

impl ClientConfig {
    pub fn new(source: DataSource, rate_limit: RateLimit) -> Self {
        Self {
            source,
            rate_limit,
            backoff: BackoffPolicy::default(),
            immediate_stop: Vec::new(),
            spoof_headers: false,
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            cache_responses: true,
        }
    }

    pub fn backoff(mut self, policy: BackoffPolicy) -> Self {
        self.backoff = policy;
        self
    }

    pub fn immediate_stop_on(mut self, statuses: &[u16]) -> Self {
        self.immediate_stop.extend_from_slice(statuses);
        self
    }

    pub fn spoof_headers(mut self, spoof: bool) -> Self {
        self.spoof_headers = spoof;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn cache_responses(mut self, cache: bool) -> Self {
        self.cache_responses = cache;
        self
    }
}

/// One logical request. Query parameters are kept apart from the URL so
/// they can be sorted into the cache key and left out of logs.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub url: String,
    pub params: Vec<(String, String)>,
    pub body: Option<Value>,
    pub want_json: bool,
}

impl Request {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            params: Vec::new(),
            body: None,
            want_json: true,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    pub fn param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.params.push((key.into(), value.to_string()));
        self
    }

    pub fn json_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Return the body as text instead of parsing it as JSON.
    pub fn text(mut self) -> Self {
        self.want_json = false;
        self
    }
}

enum Attempt {
    Body(String),
    Stop(u16),
}

/// HTTP client shared by every request one source issues.
///
/// Composes the rate limiter, retry backoff, response cache, optional header
/// spoofing and the immediate-stop policy. All waits observe the run's
/// cancellation token.
pub struct HttpClient {
    http: reqwest::Client,
    config: ClientConfig,
    limiter: RateLimiter,
    cache: ResponseCache,
    spoofer: Option<HeaderSpoofer>,
    cancel: CancellationToken,
}

impl HttpClient {
    pub fn new(config: ClientConfig, cancel: CancellationToken) -> Result<Self, ScrapeError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()?;
        let limiter = RateLimiter::new(config.rate_limit, config.source.display_name());
        let spoofer = config.spoof_headers.then(HeaderSpoofer::default);

        Ok(Self {
            http,
            config,
            limiter,
            cache: ResponseCache::new(),
            spoofer,
            cancel,
        })
    }

    pub fn source(&self) -> DataSource {
        self.config.source
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn cached_responses(&self) -> usize {
        self.cache.len()
    }

    /// Issue `req`, serving it from the cache when an identical request was
    /// already answered.
    ///
    /// Non-2xx statuses and network failures are retried per the backoff
    /// policy; statuses listed in `immediate_stop` fail at once with
    /// [`ScrapeError::ImmediateStop`].
    pub async fn request(&self, req: Request) -> Result<Payload, ScrapeError> {
        let source = self.config.source;
        let shown = strip_query(&req.url);
        let key = ResponseCache::key(
            req.method.as_str(),
            &req.url,
            &req.params,
            req.body.as_ref(),
            req.want_json,
        );

        if self.config.cache_responses
            && let Some(hit) = self.cache.get(&key)
        {
            log::debug!("{}: cache hit for {} {}", source, req.method, shown);
            return Ok(hit);
        }

        let route = self.limiter.key_for(&req.url);
        let mut backoff = Backoff::new(self.config.backoff.clone());

        loop {
            let wait = self.limiter.schedule(&route).await;
            self.pause(wait).await?;

            log::debug!(
                "{}: {} {} (attempt {})",
                source,
                req.method,
                shown,
                backoff.failures() + 1
            );
            let outcome = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(ScrapeError::Cancelled),
                outcome = self.attempt(&req) => outcome,
            };

            let reason = match outcome {
                Ok(Attempt::Stop(status)) => {
                    log::error!("{}: HTTP {} from {}, stopping source", source, status, shown);
                    return Err(ScrapeError::ImmediateStop {
                        site: source,
                        status,
                        url: shown,
                    });
                }
                Ok(Attempt::Body(body)) => {
                    let payload = if req.want_json {
                        Payload::Json(serde_json::from_str(&body)?)
                    } else {
                        Payload::Text(body)
                    };
                    if backoff.failures() > 0 {
                        log::info!(
                            "{}: {} succeeded after {} retries",
                            source,
                            shown,
                            backoff.failures()
                        );
                    }
                    if self.config.cache_responses {
                        self.cache.insert(key, payload.clone());
                    }
                    return Ok(payload);
                }
                Err(reason) => reason,
            };

            match backoff.on_failure(reason.clone()) {
                Ok(delay) => {
                    log::warn!(
                        "{}: {} failed ({}), retry {}/{} in {:.1}s",
                        source,
                        shown,
                        reason,
                        backoff.failures(),
                        self.config.backoff.max_attempts.saturating_sub(1),
                        delay.as_secs_f64()
                    );
                    self.pause(delay).await?;
                }
                Err(exhausted) => {
                    log::warn!("{}: giving up on {}: {}", source, shown, exhausted);
                    return Err(ScrapeError::ExhaustedRetries {
                        url: shown,
                        attempts: exhausted.attempts,
                        last: exhausted.last.to_string(),
                    });
                }
            }
        }
    }

    /// Convenience wrapper for JSON endpoints.
    pub async fn get_json(&self, req: Request) -> Result<Value, ScrapeError> {
        self.request(req)
            .await?
            .into_json()
            .ok_or_else(|| ScrapeError::parse("expected a JSON response"))
    }

    async fn attempt(&self, req: &Request) -> Result<Attempt, FailureReason> {
        let mut builder = self
            .http
            .request(req.method.clone(), &req.url)
            .query(&req.params);
        if let Some(spoofer) = &self.spoofer {
            builder = builder.headers(spoofer.headers());
        }
        if let Some(body) = &req.body {
            builder = builder.json(body);
        }

        let resp = builder.send().await.map_err(network_failure)?;
        let status = resp.status();
        if self.config.immediate_stop.contains(&status.as_u16()) {
            return Ok(Attempt::Stop(status.as_u16()));
        }
        if !status.is_success() {
            return Err(FailureReason::Status(status.as_u16()));
        }
        let body = resp.text().await.map_err(network_failure)?;
        Ok(Attempt::Body(body))
    }

    /// Sleep for `duration` unless the run is cancelled first.
    async fn pause(&self, duration: Duration) -> Result<(), ScrapeError> {
        if duration.is_zero() {
            return if self.cancel.is_cancelled() {
                Err(ScrapeError::Cancelled)
            } else {
                Ok(())
            };
        }
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(ScrapeError::Cancelled),
            _ = tokio::time::sleep(duration) => Ok(()),
        }
    }
}

/// reqwest includes the full URL (and so any API key) in its messages.
fn network_failure(err: reqwest::Error) -> FailureReason {
    FailureReason::Network(err.without_url().to_string())
}

/// URL without its query string, for logs and error messages.
pub fn strip_query(url: &str) -> String {
    url.split(['?', '#']).next().unwrap_or(url).to_string()
}
