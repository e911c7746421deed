//! Lexical helpers shared by the matcher, the extractor and the grouper.

use std::collections::{BTreeSet, HashSet};
use std::sync::LazyLock;

/// Tokens shorter than this (after stemming) carry no grouping signal.
const MIN_TOKEN_CHARS: usize = 3;

/// Function words plus the filler that demand phrases themselves contribute.
/// Two posts that both say "looking for" are not similar for that reason.
static STOP_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "a", "about", "after", "all", "also", "am", "an", "and", "any", "anyone", "anything",
        "are", "as", "at", "be", "been", "but", "by", "can", "could", "did", "do", "does",
        "doing", "for", "from", "get", "had", "has", "have", "help", "how", "i", "if", "in",
        "into", "is", "it", "its", "just", "know", "like", "look", "looking", "me", "more",
        "my", "need", "needs", "not", "of", "on", "or", "other", "our", "please", "should",
        "so", "some", "something", "struggling", "than", "that", "the", "their", "them",
        "then", "there", "these", "they", "this", "those", "to", "too", "use", "using", "very",
        "want", "was", "way", "we", "were", "what", "when", "where", "which", "while", "who",
        "why", "will", "wish", "with", "would", "you", "your",
    ]
    .into_iter()
    .collect()
});

/// Lowercase, turn every non-alphanumeric run into one space, trim.
///
/// `"I've got: NEED-a tool!"` becomes `"i ve got need a tool"`.
pub fn normalize_words(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_space = false;
    for ch in text.chars() {
        if ch.is_alphanumeric() {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            out.extend(ch.to_lowercase());
        } else {
            pending_space = true;
        }
    }
    out
}

/// Collapse all whitespace runs to single spaces and trim.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Cut `text` to at most `max_chars` characters, marking the cut with "...".
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    // No room for the marker.
    if max_chars <= 3 {
        return text.chars().take(max_chars).collect();
    }
    let keep = max_chars.saturating_sub(3);
    let mut cut: String = text.chars().take(keep).collect();
    cut.truncate(cut.trim_end().len());
    cut.push_str("...");
    cut
}

/// Light suffix stemming so "spreadsheets"/"spreadsheet" and
/// "dedupe"/"dedup"/"deduped" land on the same token.
pub fn stem(word: &str) -> String {
    let len = word.chars().count();
    let mut token = if len > 4 && word.ends_with("ies") {
        format!("{}y", &word[..word.len() - 3])
    } else if len > 5 && word.ends_with("ing") {
        word[..word.len() - 3].to_string()
    } else if len > 4 && word.ends_with("ed") {
        word[..word.len() - 2].to_string()
    } else if len > 3 && word.ends_with('s') && !word.ends_with("ss") {
        word[..word.len() - 1].to_string()
    } else {
        word.to_string()
    };
    if token.chars().count() > 4 && token.ends_with('e') {
        token.pop();
    }
    token
}

/// Token set used for similarity: normalized words minus stop words, stemmed,
/// short tokens dropped.
pub fn similarity_tokens(text: &str) -> BTreeSet<String> {
    normalize_words(text)
        .split(' ')
        .filter(|w| !w.is_empty() && !STOP_WORDS.contains(w))
        .map(stem)
        .filter(|t| t.chars().count() >= MIN_TOKEN_CHARS)
        .collect()
}

/// Jaccard similarity of two token sets. Two empty sets score 0.
pub fn jaccard(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
    let intersection = a.intersection(b).count();
    let union = a.len() + b.len() - intersection;
    if union == 0 {
        0.0
    } else {
        intersection as f64 / union as f64
    }
}
