//! Title normalization.
//!
//! Two titles that denote the same game should normalize to the same string.
//! The pipeline runs in a fixed order:
//!
//! 1. Unescape HTML entities (`&amp;`, `&#233;`).
//! 2. Drop trademark/copyright glyphs.
//! 3. Transliterate macron vowels common in romanized Japanese titles.
//! 4. Remove one trailing `(1998)` / `(SLUS)` style four-character suffix.
//! 5. NFKD decomposition, dropping combining marks.
//! 6. Lowercase.
//! 7. `&` becomes `and`.
//! 8. Roman numeral tokens up to a bound become Arabic digits.
//! 9. Keep only alphanumerics.
//!
//! The output contains no separators, so running the pipeline again is a
//! no-op.

use std::collections::HashMap;
use std::sync::Mutex;

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Largest Roman numeral converted by default. Keeps words like "XL" or
/// "MIX" from turning into numbers.
pub const DEFAULT_MAX_ROMAN: u32 = 20;

/// Memoizing title normalizer.
///
/// Safe to share between tasks; the cache is behind a mutex and a poisoned
/// lock is recovered rather than propagated.
#[derive(Debug)]
pub struct Normalizer {
    max_roman: u32,
    cache: Mutex<HashMap<String, String>>,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ROMAN)
    }
}

impl Normalizer {
    pub fn new(max_roman: u32) -> Self {
        Self {
            max_roman,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn max_roman(&self) -> u32 {
        self.max_roman
    }

    /// Normalize `input`, returning a cached result when this exact string
    /// was seen before.
    pub fn normalize(&self, input: &str) -> String {
        if let Some(hit) = self.lock().get(input) {
            return hit.clone();
        }
        let normalized = normalize_uncached(input, self.max_roman);
        self.lock().insert(input.to_string(), normalized.clone());
        normalized
    }

    /// Number of distinct inputs normalized so far.
    pub fn cached_len(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.cache.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Run the full pipeline without touching any cache.
pub fn normalize_uncached(input: &str, max_roman: u32) -> String {
    let unescaped = html_escape::decode_html_entities(input);
    let stripped: String = unescaped
        .chars()
        .filter(|c| !matches!(c, '™' | '®' | '©'))
        .map(transliterate)
        .collect();
    let without_suffix = strip_trailing_code(&stripped);

    let folded = without_suffix
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
        .replace('&', " and ");

    let mut out = String::with_capacity(folded.len());
    for token in folded.split(|c: char| !c.is_alphanumeric()) {
        match roman_value(token, max_roman) {
            Some(value) => out.push_str(&value.to_string()),
            None => out.extend(
                token
                    .chars()
                    .filter(|c| c.is_alphanumeric() && !is_combining_mark(*c)),
            ),
        }
    }
    out
}

fn transliterate(c: char) -> char {
    match c {
        'ō' => 'o',
        'ū' => 'u',
        'Ō' => 'O',
        'Ū' => 'U',
        other => other,
    }
}

/// Remove a trailing ` (XXXX)` group where XXXX is four ASCII alphanumerics.
/// The group must be preceded by whitespace so that a title consisting only
/// of a parenthesized year is left alone.
pub fn strip_trailing_code(s: &str) -> &str {
    let trimmed = s.trim_end();
    let Some(inner_start) = trimmed.len().checked_sub(6) else {
        return s;
    };
    let Some(tail) = trimmed.get(inner_start..) else {
        return s;
    };
    let bytes = tail.as_bytes();
    let is_code = bytes[0] == b'('
        && bytes[5] == b')'
        && bytes[1..5].iter().all(|b| b.is_ascii_alphanumeric());
    if !is_code {
        return s;
    }
    let head = &trimmed[..inner_start];
    if head.ends_with(char::is_whitespace) {
        head.trim_end()
    } else {
        s
    }
}

/// Value of `token` if it is a canonical lowercase Roman numeral in
/// `1..=max`.
fn roman_value(token: &str, max: u32) -> Option<u32> {
    if token.is_empty() || !token.chars().all(|c| "ivxlcdm".contains(c)) {
        return None;
    }
    (1..=max).find(|&n| to_roman(n) == token)
}

fn to_roman(mut n: u32) -> String {
    const TABLE: &[(u32, &str)] = &[
        (1000, "m"),
        (900, "cm"),
        (500, "d"),
        (400, "cd"),
        (100, "c"),
        (90, "xc"),
        (50, "l"),
        (40, "xl"),
        (10, "x"),
        (9, "ix"),
        (5, "v"),
        (4, "iv"),
        (1, "i"),
    ];
    let mut out = String::new();
    for &(value, numeral) in TABLE {
        while n >= value {
            out.push_str(numeral);
            n -= value;
        }
    }
    out
}

#[cfg(test)]
#[path = "tests/normalize_tests.rs"]
mod tests;
