//! Title canonicalization for duplicate detection.
//!
//! Keys produced here are only ever compared, never displayed.

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

static PARENTHESIZED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\([^)]*\)").expect("valid parenthesized pattern"));

/// Version, sequel, season and episode markers removed as whole words
static MARKER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(version|v\.|vol\.|volume|part|partie|saison|season|s\d+|épisode|episode|ep\.?)\b",
    )
    .expect("valid marker pattern")
});

/// Same token set, anchored on both ends
static WHOLE_MARKER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(version|volume|part|partie|saison|season|s\d+|episode|ep)$")
        .expect("valid whole marker pattern")
});

/// Canonical comparison key for a title
///
/// Parenthesized segments and marker words are removed, the text is NFKD
/// decomposed with every non-ASCII character dropped, then lower-cased and
/// reduced to `[a-z0-9]` with no separators. Empty input yields an empty key.
pub fn normalize(title: &str) -> String {
    if title.is_empty() {
        return String::new();
    }

    let without_parens = PARENTHESIZED_RE.replace_all(title, "");
    let without_markers = MARKER_RE.replace_all(&without_parens, "");

    let key: String = without_markers
        .nfkd()
        .filter(char::is_ascii)
        .collect::<String>()
        .to_lowercase()
        .trim()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        .collect();

    // A key spelling out a marker ("P-art" -> "part") would vanish on a second pass
    if WHOLE_MARKER_RE.is_match(&key) {
        return String::new();
    }

    key
}
