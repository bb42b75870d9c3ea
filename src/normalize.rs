//! Name normalization for token-level matching.
//!
//! Record names are identifiers like `fooBar`, `snake_name` or `kebab-name`.
//! The FTS tokenizer sees each of those as a single token, so a search for
//! `foo` would miss `fooBar`. [`normalize_name`] splits them into words.

use once_cell::sync::Lazy;
use regex::Regex;

static CAMEL_BOUNDARY: Lazy<Regex> = Lazy::new(|| Regex::new(r"[a-z0-9][A-Z]").unwrap());
static UPPERCASE: Lazy<Regex> = Lazy::new(|| Regex::new(r"([A-Z])").unwrap());
// Separators count only when a word character sits on both sides.
static SNAKE_SEPARATOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Za-z0-9_]_[A-Za-z0-9_]").unwrap());
static KEBAB_SEPARATOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Za-z0-9_]-[A-Za-z0-9_]").unwrap());

/// Splits a camelCase, snake_case or kebab-case name into space-separated words.
///
/// Checks run in that order and only the first matching style is applied,
/// so `foo_barBaz` becomes `foo_bar Baz`. Returns `None` for names that
/// match none of the styles.
///
/// ```
/// use valsearch::normalize::normalize_name;
///
/// assert_eq!(normalize_name("fooBarBaz").as_deref(), Some("foo Bar Baz"));
/// assert_eq!(normalize_name("snake_name").as_deref(), Some("snake name"));
/// assert_eq!(normalize_name("kebab-name").as_deref(), Some("kebab name"));
/// assert_eq!(normalize_name("plain"), None);
/// ```
pub fn normalize_name(name: &str) -> Option<String> {
    if CAMEL_BOUNDARY.is_match(name) {
        let spaced = UPPERCASE.replace_all(name, " $1");
        return Some(spaced.trim_start().to_string());
    }
    if SNAKE_SEPARATOR.is_match(name) {
        return Some(name.replace('_', " "));
    }
    if KEBAB_SEPARATOR.is_match(name) {
        return Some(name.replace('-', " "));
    }
    None
}
