//! Pure normalization and validation helpers for user supplied strings.
//!
//! Nothing here touches I/O, so every function is deterministic and can be
//! called from the parsed domain types as well as from tests.

use regex::Regex;

use unicode_segmentation::UnicodeSegmentation;

/// Maximum length, in graphemes, of any stored email or city
pub const MAX_LEN: usize = 256;
/// Minimum length, in graphemes, accepted by the strict city check
pub const MIN_CITY_LEN: usize = 2;

/// Characters removed from every stored string as a markup-injection guard
const MARKUP_CHARS: [char; 5] = ['<', '>', '"', '\'', '`'];

lazy_static::lazy_static! {
    static ref EMAIL_REGEX: Regex = Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap();
    static ref CITY_REGEX: Regex = Regex::new(r"^[\p{L}\p{M}][\p{L}\p{M}\s\-().,']*$").unwrap();
}

/// Remove the markup-injection characters `< > " ' \``.
/// This is not HTML escaping, only a guard before storage.
pub fn strip_markup(value: &str) -> String {
    value.chars().filter(|c| !MARKUP_CHARS.contains(c)).collect()
}

/// Trim, lower-case and strip an email address
pub fn normalize_email(value: &str) -> String {
    strip_markup(value.trim()).to_lowercase()
}

/// Trim and strip a city name, case is preserved
pub fn normalize_city(value: &str) -> String {
    strip_markup(value.trim()).trim().to_string()
}

/// Basic `local@domain.tld` shape check
pub fn is_valid_email(value: &str) -> bool {
    value.graphemes(true).count() <= MAX_LEN && EMAIL_REGEX.is_match(value)
}

/// Stricter city shape check used when validating frontend input.
///
/// Accepts letters of any script plus spaces, hyphens, parentheses,
/// apostrophes, dots and commas.
pub fn is_valid_city_name(value: &str) -> bool {
    let len = value.graphemes(true).count();
    (MIN_CITY_LEN..=MAX_LEN).contains(&len) && CITY_REGEX.is_match(value)
}
