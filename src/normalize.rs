//! Display-key normalization for free-text brand/model strings.

use lazy_static::lazy_static;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref SPEC_PAGE_URL: Regex = Regex::new(r"/([^/]+)-(\d+)\.php").unwrap();
}

/// Combining diacritical marks block (U+0300..U+036F)
fn is_combining_mark(ch: char) -> bool {
    ('\u{0300}'..='\u{036f}').contains(&ch)
}

/// Canonicalize text for comparison.
///
/// Accents are decomposed and dropped, the result is lowercased and every run
/// of characters outside `[a-z0-9]` becomes a single space. Leading and
/// trailing separators are removed.
pub fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_space = false;

    for ch in text
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
    {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            out.push(ch);
        } else {
            pending_space = true;
        }
    }

    out
}

/// Display key for a brand/model pair: `normalize(brand)|normalize(model)`
pub fn key_for(brand: &str, model: &str) -> String {
    format!("{}|{}", normalize(brand), normalize(model))
}

/// Extract the page slug from a spec page URL such as
/// `https://www.gsmarena.com/samsung_galaxy_s25-13610.php`.
///
/// Returns an empty string for anything else.
pub fn slug_from_url(url: &str) -> String {
    SPEC_PAGE_URL
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
#[path = "normalize_tests.rs"]
mod tests;
