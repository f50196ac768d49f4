//! Lexical similarity primitives used by the matcher.
//!
//! Two signals, both in `[0, 1]`:
//!
//! - [`sequence_ratio`]: `2·LCS(a, b) / (|a| + |b|)` over characters.
//!   Symmetric, `1.0` for identical strings, `0.0` when nothing is shared.
//! - [`word_overlap`]: Jaccard index of whitespace-separated word sets.
//!
//! [`composite_score`] blends them with configurable weights:
//!
//! ```text
//! score = w_seq × sequence_ratio + w_overlap × word_overlap
//! ```

use std::collections::HashSet;

/// Lower-case `text`, optionally dropping everything outside `[a-z0-9 ]`.
pub fn normalize(text: &str, strip_punctuation: bool) -> String {
    let lowered = text.to_lowercase();
    if strip_punctuation {
        lowered
            .chars()
            .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == ' ')
            .collect()
    } else {
        lowered
    }
}

/// Length of the longest common subsequence of two char slices.
fn lcs_len(a: &[char], b: &[char]) -> usize {
    // Keep the DP row over the shorter input.
    let (long, short) = if a.len() >= b.len() { (a, b) } else { (b, a) };
    if short.is_empty() {
        return 0;
    }

    let mut prev = vec![0usize; short.len() + 1];
    let mut curr = vec![0usize; short.len() + 1];
    for &lc in long {
        for (j, &sc) in short.iter().enumerate() {
            curr[j + 1] = if lc == sc {
                prev[j] + 1
            } else {
                prev[j + 1].max(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[short.len()]
}

/// Normalized common-subsequence ratio of two strings.
pub fn sequence_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    (2 * lcs_len(&a, &b)) as f64 / total as f64
}

/// Jaccard index of the whitespace-tokenized word sets.
pub fn word_overlap(a: &str, b: &str) -> f64 {
    let set_a: HashSet<&str> = a.split_whitespace().collect();
    let set_b: HashSet<&str> = b.split_whitespace().collect();
    let intersection = set_a.intersection(&set_b).count();
    let union = set_a.union(&set_b).count();
    intersection as f64 / union.max(1) as f64
}

/// Weighted blend of [`sequence_ratio`] and [`word_overlap`], clamped to `[0, 1]`.
///
/// Both inputs are expected to be normalized already.
pub fn composite_score(a: &str, b: &str, sequence_weight: f64, overlap_weight: f64) -> f64 {
    let score = sequence_weight * sequence_ratio(a, b) + overlap_weight * word_overlap(a, b);
    score.clamp(0.0, 1.0)
}
