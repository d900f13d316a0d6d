//! Keyword extraction.
//!
//! Keywords are the distinct plain words of a page: the raw token text is
//! reduced to ASCII letters, digits and whitespace, lowercased and split; a
//! word is kept when it has at least two characters and is made only of
//! letters or only of digits. The result is deduplicated and sorted in
//! string order, so `"10"` sorts before `"2"`.
//!
//! # Example
//!
//! ```rust
//! use vellum::keywords::extract_keywords_from_text;
//!
//! assert_eq!(
//!     extract_keywords_from_text("Año 1914, lote #12-A"),
//!     vec!["1914", "ao", "lote"]
//! );
//! ```

use crate::types::OcrToken;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;

/// Anything that is not an ASCII letter, digit, whitespace or underscore.
static STRIPPED_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9\s_]").expect("Keyword strip regex pattern is valid and should compile"));

const MIN_KEYWORD_LEN: usize = 2;

/// Keywords of a token stream, ignoring its layout.
pub fn extract_keywords(tokens: &[OcrToken]) -> Vec<String> {
    let text = tokens.iter().map(|t| t.text.as_str()).collect::<Vec<_>>().join(" ");
    extract_keywords_from_text(&text)
}

/// Keywords of free text.
pub fn extract_keywords_from_text(text: &str) -> Vec<String> {
    let cleaned = STRIPPED_CHARS.replace_all(text, "").replace('_', " ").to_lowercase();

    cleaned
        .split_whitespace()
        .filter(|word| is_keyword(word))
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn is_keyword(word: &str) -> bool {
    word.len() >= MIN_KEYWORD_LEN
        && (word.chars().all(|c| c.is_ascii_alphabetic()) || word.chars().all(|c| c.is_ascii_digit()))
}

/// Render keywords one per line, each followed by a newline.
pub fn keywords_to_lines(keywords: &[String]) -> String {
    keywords.iter().map(|k| format!("{}\n", k)).collect()
}
