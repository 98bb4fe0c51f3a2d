//! Title similarity scoring.
//!
//! Jaccard similarity over whitespace-delimited token sets after lowercasing
//! and stripping punctuation. Purely set-overlap based: no partial credit for
//! substring or edit-distance closeness. This is a deliberate simplification
//! and will false-negative on heavily paraphrased titles and false-positive
//! on short generic titles sharing common words.

use std::collections::HashSet;

/// Normalize a title into its comparison token set.
///
/// Lowercases, replaces every character that is not alphanumeric or
/// whitespace with a space, then splits on whitespace.
fn tokenize(title: &str) -> HashSet<String> {
    title
        .to_lowercase()
        .replace(|c: char| !c.is_alphanumeric() && !c.is_whitespace(), " ")
        .split_whitespace()
        .map(|t| t.to_string())
        .collect()
}

/// Score two titles in `[0.0, 1.0]` by token-set Jaccard similarity.
///
/// Returns `0.0` if either input is empty or normalizes to an empty token
/// set (e.g. punctuation only). Symmetric in its arguments.
pub fn title_similarity(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let tokens_a = tokenize(a);
    let tokens_b = tokenize(b);
    if tokens_a.is_empty() || tokens_b.is_empty() {
        return 0.0;
    }

    let intersection = tokens_a.intersection(&tokens_b).count();
    let union = tokens_a.len() + tokens_b.len() - intersection;
    intersection as f64 / union as f64
}
