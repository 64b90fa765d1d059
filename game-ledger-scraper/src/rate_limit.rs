//! Per-key request spacing.
//!
//! A [`RateLimiter`] hands out dispatch slots. Each call to
//! [`schedule`](RateLimiter::schedule) reserves the next slot for its key and
//! returns how long the caller must wait before sending. Reservation and
//! bookkeeping happen under one lock, so concurrent callers under the same
//! key always end up at least one spacing apart.

use std::collections::HashMap;

use rand::Rng;
use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};

/// Waits longer than this are logged at info level; shorter ones at debug.
const LONG_WAIT: Duration = Duration::from_secs(5);

/// Upper bound on the random jitter added to each slot.
const MAX_JITTER: Duration = Duration::from_millis(250);

/// Key used for every request when limits are global rather than per route.
const GLOBAL_KEY: &str = "*";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Second,
    Minute,
    Hour,
    Day,
    Week,
    Month,
    Year,
}

impl TimeUnit {
    pub fn duration(&self) -> Duration {
        const DAY: u64 = 24 * 60 * 60;
        Duration::from_secs(match self {
            Self::Second => 1,
            Self::Minute => 60,
            Self::Hour => 60 * 60,
            Self::Day => DAY,
            Self::Week => 7 * DAY,
            Self::Month => 30 * DAY,
            Self::Year => 365 * DAY,
        })
    }
}

/// How many requests are allowed per [`TimeUnit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestBudget {
    Fixed(u32),
    /// A budget drawn uniformly from `min..=max` for every scheduling
    /// decision, so traffic does not look machine-regular.
    Range { min: u32, max: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimit {
    pub budget: RequestBudget,
    pub per: TimeUnit,
    /// Track each route (scheme, host and path) separately instead of one
    /// limit for the whole source.
    pub per_route: bool,
}

impl RateLimit {
    pub fn new(requests: u32, per: TimeUnit) -> Self {
        Self {
            budget: RequestBudget::Fixed(requests),
            per,
            per_route: false,
        }
    }

    pub fn randomized(min: u32, max: u32, per: TimeUnit) -> Self {
        let (min, max) = if min <= max { (min, max) } else { (max, min) };
        Self {
            budget: RequestBudget::Range { min, max },
            per,
            per_route: false,
        }
    }

    pub fn per_route(mut self) -> Self {
        self.per_route = true;
        self
    }

    /// Minimum gap between two dispatches for a given request budget.
    pub fn spacing_for(&self, requests: u32) -> Duration {
        self.per.duration() / requests.max(1)
    }

    /// The tightest spacing this limit can produce.
    pub fn min_spacing(&self) -> Duration {
        match self.budget {
            RequestBudget::Fixed(n) => self.spacing_for(n),
            RequestBudget::Range { max, .. } => self.spacing_for(max),
        }
    }

    fn draw_spacing(&self, rng: &mut impl Rng) -> Duration {
        match self.budget {
            RequestBudget::Fixed(n) => self.spacing_for(n),
            RequestBudget::Range { min, max } => self.spacing_for(rng.random_range(min..=max)),
        }
    }
}

/// Last-dispatch bookkeeping for one source.
#[derive(Debug)]
pub struct RateLimiter {
    limit: RateLimit,
    label: String,
    last_dispatch: Mutex<HashMap<String, Instant>>,
}

impl RateLimiter {
    /// `label` only appears in log lines (usually the source name).
    pub fn new(limit: RateLimit, label: impl Into<String>) -> Self {
        Self {
            limit,
            label: label.into(),
            last_dispatch: Mutex::new(HashMap::new()),
        }
    }

    pub fn limit(&self) -> &RateLimit {
        &self.limit
    }

    /// Bookkeeping key for `url`: the route without its query string when
    /// limiting per route, otherwise one shared key.
    pub fn key_for(&self, url: &str) -> String {
        if !self.limit.per_route {
            return GLOBAL_KEY.to_string();
        }
        match reqwest::Url::parse(url) {
            Ok(parsed) => format!(
                "{}://{}{}",
                parsed.scheme(),
                parsed.host_str().unwrap_or_default(),
                parsed.path()
            ),
            Err(_) => url.split('?').next().unwrap_or(url).to_string(),
        }
    }

    /// Reserve the next slot for `key` and return how long to wait for it.
    pub async fn schedule(&self, key: &str) -> Duration {
        self.reserve_at(key, Instant::now()).await
    }

    /// [`schedule`](Self::schedule) with an explicit clock reading.
    pub async fn reserve_at(&self, key: &str, now: Instant) -> Duration {
        let (spacing, jitter) = {
            let mut rng = rand::rng();
            let spacing = self.limit.draw_spacing(&mut rng);
            (spacing, draw_jitter(&mut rng, spacing))
        };

        let wait = {
            let mut last = self.last_dispatch.lock().await;
            let slot = match last.get(key) {
                Some(prev) => (*prev + spacing + jitter).max(now),
                None => now,
            };
            last.insert(key.to_string(), slot);
            slot - now
        };

        if wait > LONG_WAIT {
            log::info!("{}: rate limit, waiting {:.1}s", self.label, wait.as_secs_f64());
        } else if !wait.is_zero() {
            log::debug!("{}: rate limit, waiting {}ms", self.label, wait.as_millis());
        }
        wait
    }

    /// Reserve a slot and sleep until it arrives.
    pub async fn acquire(&self, key: &str) -> Duration {
        let wait = self.schedule(key).await;
        if !wait.is_zero() {
            tokio::time::sleep(wait).await;
        }
        wait
    }
}

fn draw_jitter(rng: &mut impl Rng, spacing: Duration) -> Duration {
    let ceiling = (spacing / 10).min(MAX_JITTER);
    if ceiling.is_zero() {
        return Duration::ZERO;
    }
    Duration::from_nanos(rng.random_range(0..=ceiling.as_nanos() as u64))
}

#[cfg(test)]
#[path = "tests/rate_limit_tests.rs"]
mod tests;
