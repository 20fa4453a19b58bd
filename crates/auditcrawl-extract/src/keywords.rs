//! Keyword density analysis (spec.md §4.5 "Keyword density"): top-10 terms
//! by density, computed only once a page clears a minimum word threshold.

use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::HashMap;

const MIN_TOKENS: usize = 50;
const TOP_N: usize = 10;

static STOP_WORDS: Lazy<std::collections::HashSet<&'static str>> = Lazy::new(|| {
    [
        "the", "a", "an", "and", "or", "but", "of", "to", "in", "on", "for", "with", "as", "is",
        "are", "was", "were", "be", "been", "being", "this", "that", "these", "those", "it",
        "its", "at", "by", "from", "into", "about", "we", "you", "your", "our", "i", "he", "she",
        "they", "them", "his", "her", "their", "not", "no", "can", "will", "would", "should",
        "has", "have", "had", "do", "does", "did", "if", "so", "than", "then", "there", "here",
        "which", "who", "what", "when", "where", "how", "all", "any", "more", "most", "some",
        "such", "only", "also", "just", "up", "down", "out", "over", "under", "again",
    ]
    .into_iter()
    .collect()
});

#[derive(Debug, Clone, Serialize)]
pub struct KeywordDensity {
    pub term: String,
    /// Percentage, rounded to one decimal place.
    pub density: f64,
    pub count: u32,
}

fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .filter(|t| !STOP_WORDS.contains(t.as_str()) && t.chars().any(|c| c.is_alphabetic()))
        .collect()
}

/// Returns an empty list for pages with fewer than 50 content tokens.
pub fn density(text: &str) -> Vec<KeywordDensity> {
    let tokens = tokenize(text);
    if tokens.len() < MIN_TOKENS {
        return Vec::new();
    }

    let total = tokens.len() as f64;
    let mut counts: HashMap<String, u32> = HashMap::new();
    for token in &tokens {
        *counts.entry(token.clone()).or_insert(0) += 1;
    }

    let mut ranked: Vec<KeywordDensity> = counts
        .into_iter()
        .map(|(term, count)| KeywordDensity {
            term,
            density: (count as f64 / total * 1000.0).round() / 10.0,
            count,
        })
        .collect();

    ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.term.cmp(&b.term)));
    ranked.truncate(TOP_N);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn returns_empty_below_minimum_token_count() {
        assert!(density("too short a page to analyze").is_empty());
    }

    #[test]
    fn ranks_by_frequency_excluding_stop_words() {
        let text = "rust rust rust crawler crawler seo ".repeat(10);
        let result = density(&text);
        assert_eq!(result[0].term, "rust");
        assert!(result[0].density > result[1].density);
    }
}
