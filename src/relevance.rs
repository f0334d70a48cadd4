//! Heuristic keyword relevance.
//!
//! A deliberately coarse score: count how many distinct keywords appear in a
//! document and map the hit count onto a 0–5 scale.
//!
//! | Hits | Score |
//! |------|-------|
//! | 0 | 0 |
//! | 1 | 3 |
//! | 2 | 4 |
//! | 3+ | 5 |
//!
//! Scores of 1 and 2 are never produced. This is a toy metric, not a
//! relevance model.

use crate::models::KeywordSet;

/// Highest score [`score`] can return.
pub const MAX_SCORE: u8 = 5;

/// Number of distinct keywords found in `text` (case-insensitive substring).
pub fn keyword_hits(text: &str, keywords: &KeywordSet) -> usize {
    let text_lower = text.to_lowercase();
    keywords.iter().filter(|kw| text_lower.contains(kw)).count()
}

/// Map a hit count onto the 0–5 scale.
pub fn score_for_hits(hits: usize) -> u8 {
    match hits {
        0 => 0,
        1 => 3,
        2 => 4,
        _ => MAX_SCORE,
    }
}

/// Heuristic relevance of `text` for `keywords`.
pub fn score(text: &str, keywords: &KeywordSet) -> u8 {
    score_for_hits(keyword_hits(text, keywords))
}

/// True when `text` contains at least one keyword.
pub fn mentions_any(text: &str, keywords: &KeywordSet) -> bool {
    let text_lower = text.to_lowercase();
    keywords.iter().any(|kw| text_lower.contains(kw))
}
