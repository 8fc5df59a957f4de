//! Text normalization helpers shared by ingestion and extraction.

use crate::constants::ingestion::KEYWORD_SEPARATOR;
use crate::types::Keyword;

/// Collapse runs of whitespace into single spaces and trim.
pub fn normalize_inline_whitespace<T: AsRef<str>>(text: T) -> String {
    let mut normalized = String::new();
    let mut seen_space = false;
    for ch in text.as_ref().chars() {
        if ch.is_whitespace() {
            if !seen_space {
                normalized.push(' ');
                seen_space = true;
            }
        } else {
            normalized.push(ch);
            seen_space = false;
        }
    }
    normalized.trim().to_string()
}

/// Split a `kw1;kw2;...;` list, dropping the empty token left by a terminal separator.
///
/// Only the final empty token is dropped; an interior `;;` keeps its empty keyword.
pub fn split_keywords(raw: &str) -> Vec<Keyword> {
    let mut keywords: Vec<Keyword> = raw
        .trim()
        .split(KEYWORD_SEPARATOR)
        .map(str::to_string)
        .collect();
    if keywords.last().is_some_and(|last| last.is_empty()) {
        keywords.pop();
    }
    keywords
}
