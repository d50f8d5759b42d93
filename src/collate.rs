//! Human-oriented ordering for tag names
//!
//! Approximates a root-locale collation without pulling in locale data:
//! whitespace sorts before punctuation, punctuation before digits, digits
//! before letters, and letters compare case-insensitively. Lowercase wins a
//! remaining case tie, and byte order settles anything still equal so the
//! result is a total order.

use std::cmp::Ordering;

/// Compare two names the way a reader would expect them listed
pub fn collate(a: &str, b: &str) -> Ordering {
    a.chars()
        .map(primary_key)
        .cmp(b.chars().map(primary_key))
        .then_with(|| a.chars().map(char::is_uppercase).cmp(b.chars().map(char::is_uppercase)))
        .then_with(|| a.cmp(b))
}

fn primary_key(c: char) -> (u8, char) {
    let class = if c.is_whitespace() {
        0
    } else if c.is_numeric() {
        2
    } else if c.is_alphabetic() {
        3
    } else {
        1
    };
    (class, c.to_lowercase().next().unwrap_or(c))
}
