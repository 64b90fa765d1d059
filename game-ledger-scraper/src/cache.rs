use std::collections::HashMap;
use std::sync::Mutex;

use serde_json::Value;

/// A decoded response body.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Json(Value),
    Text(String),
}

impl Payload {
    pub fn into_json(self) -> Option<Value> {
        match self {
            Self::Json(value) => Some(value),
            Self::Text(_) => None,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            Self::Json(value) => value.to_string(),
            Self::Text(text) => text,
        }
    }
}

/// Process-lifetime response cache.
///
/// Runs are short and requests idempotent, so entries never expire.
#[derive(Debug, Default)]
pub struct ResponseCache {
    entries: Mutex<HashMap<String, Payload>>,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache key for a request. Parameters are sorted so their order does
    /// not matter; the method and expected body kind are part of the key.
    pub fn key(
        method: &str,
        url: &str,
        params: &[(String, String)],
        body: Option<&Value>,
        want_json: bool,
    ) -> String {
        let mut sorted: Vec<_> = params.iter().collect();
        sorted.sort();
        let params = sorted
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");
        let body = body.map(Value::to_string).unwrap_or_default();
        let kind = if want_json { "json" } else { "text" };
        format!("{method} {url}?{params} {kind} {body}")
    }

    pub fn get(&self, key: &str) -> Option<Payload> {
        self.lock().get(key).cloned()
    }

    pub fn insert(&self, key: String, payload: Payload) {
        self.lock().insert(key, payload);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Payload>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn key_ignores_param_order() {
        let a = ResponseCache::key("GET", "https://x/y", &params(&[("a", "1"), ("b", "2")]), None, true);
        let b = ResponseCache::key("GET", "https://x/y", &params(&[("b", "2"), ("a", "1")]), None, true);
        assert_eq!(a, b);
    }

    #[test]
    fn key_distinguishes_method_body_and_kind() {
        let base = ResponseCache::key("GET", "https://x/y", &[], None, true);
        assert_ne!(base, ResponseCache::key("POST", "https://x/y", &[], None, true));
        assert_ne!(base, ResponseCache::key("GET", "https://x/y", &[], Some(&json!({"q": 1})), true));
        assert_ne!(base, ResponseCache::key("GET", "https://x/y", &[], None, false));
    }

    #[test]
    fn stores_and_returns_payloads() {
        let cache = ResponseCache::new();
        assert!(cache.is_empty());
        cache.insert("k".into(), Payload::Json(json!({"games": []})));
        assert_eq!(cache.get("k"), Some(Payload::Json(json!({"games": []}))));
        assert_eq!(cache.get("missing"), None);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn payload_conversions() {
        assert_eq!(Payload::Json(json!({"a": 1})).into_text(), r#"{"a":1}"#);
        assert_eq!(Payload::Text("<html>".into()).into_json(), None);
    }
}
