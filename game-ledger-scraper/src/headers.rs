//! Browser-like request headers for sources that reject obvious bots.
//!
//! One randomized bundle is kept for a fixed lifetime so consecutive requests
//! look like a single browsing session instead of a new browser every call.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use rand::Rng;
use rand::seq::IndexedRandom;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue, REFERER, USER_AGENT};

pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60);

const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:125.0) Gecko/20100101 Firefox/125.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_4_1) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4.1 Safari/605.1.15",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Ubuntu; Linux x86_64; rv:124.0) Gecko/20100101 Firefox/124.0",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36 Edg/124.0.0.0",
];

const REFERERS: &[&str] = &[
    "https://www.google.com/",
    "https://www.bing.com/",
    "https://duckduckgo.com/",
    "https://www.reddit.com/",
];

const ACCEPTS: &[&str] = &[
    "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8",
    "application/json, text/plain, */*",
];

const LANGUAGES: &[&str] = &["en-US,en;q=0.9", "en-GB,en;q=0.8", "en-US,en;q=0.5"];

#[derive(Debug)]
struct Session {
    headers: HeaderMap,
    created: Instant,
}

#[derive(Debug)]
pub struct HeaderSpoofer {
    ttl: Duration,
    session: Mutex<Option<Session>>,
}

impl Default for HeaderSpoofer {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl HeaderSpoofer {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            session: Mutex::new(None),
        }
    }

    /// Current header bundle, regenerated once it is older than the TTL.
    pub fn headers(&self) -> HeaderMap {
        let mut session = self.session.lock().unwrap_or_else(|e| e.into_inner());
        let stale = session.as_ref().is_none_or(|s| s.created.elapsed() >= self.ttl);
        if stale {
            log::debug!("Rotating spoofed browser headers");
            *session = Some(Session {
                headers: random_bundle(&mut rand::rng()),
                created: Instant::now(),
            });
        }
        session
            .as_ref()
            .map(|s| s.headers.clone())
            .unwrap_or_default()
    }
}

fn random_bundle(rng: &mut impl Rng) -> HeaderMap {
    let mut headers = HeaderMap::new();
    let pairs = [
        (USER_AGENT, USER_AGENTS),
        (REFERER, REFERERS),
        (ACCEPT, ACCEPTS),
        (ACCEPT_LANGUAGE, LANGUAGES),
    ];
    for (name, choices) in pairs {
        if let Some(value) = choices.choose(rng) {
            headers.insert(name, HeaderValue::from_static(*value));
        }
    }
    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundle_sets_every_header() {
        let headers = random_bundle(&mut rand::rng());
        let ua = headers.get(USER_AGENT).unwrap().to_str().unwrap();
        assert!(USER_AGENTS.contains(&ua));
        assert!(headers.contains_key(REFERER));
        assert!(headers.contains_key(ACCEPT));
        assert!(headers.contains_key(ACCEPT_LANGUAGE));
    }

    #[test]
    fn headers_are_stable_within_ttl() {
        let spoofer = HeaderSpoofer::new(Duration::from_secs(3600));
        let first = spoofer.headers();
        for _ in 0..20 {
            assert_eq!(spoofer.headers(), first);
        }
    }

    #[test]
    fn zero_ttl_regenerates_each_call() {
        let spoofer = HeaderSpoofer::new(Duration::ZERO);
        // Still a valid bundle every time, even though it is rebuilt.
        for _ in 0..5 {
            assert_eq!(spoofer.headers().len(), 4);
        }
    }
}
