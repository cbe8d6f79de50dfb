//! Text and temporal similarity for the deduplication engine.
//!
//! Two recognizer results describe the same utterance when their normalized
//! texts are close in edit distance AND their spans either overlap or start
//! within a few seconds of each other.

use crate::capture::TimeSpan;

/// Lowercases, strips punctuation and collapses whitespace so edit distance
/// compares words, not formatting.
pub fn normalize_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last_was_space = true;
    for ch in text.chars() {
        if ch.is_alphanumeric() {
            for lower in ch.to_lowercase() {
                out.push(lower);
            }
            last_was_space = false;
        } else if ch.is_whitespace() || ch.is_ascii_punctuation() {
            if !last_was_space {
                out.push(' ');
                last_was_space = true;
            }
        }
    }
    out.trim_end().to_string()
}

/// Levenshtein edit distance over characters.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = if ca == cb { 0 } else { 1 };
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// Normalized edit-distance similarity of two texts, in [0, 1].
///
/// Both empty → 1.0; exactly one empty → 0.0.
pub fn text_similarity(a: &str, b: &str) -> f32 {
    let a = normalize_text(a);
    let b = normalize_text(b);
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let max_len = a.chars().count().max(b.chars().count());
    1.0 - levenshtein(&a, &b) as f32 / max_len as f32
}

/// Whether two spans are close enough in time to describe the same utterance.
pub fn temporally_close(
    a: &TimeSpan,
    b: &TimeSpan,
    overlap_ratio_threshold: f64,
    start_proximity_seconds: f64,
) -> bool {
    a.overlap_ratio(b) > overlap_ratio_threshold || a.start_distance(b) <= start_proximity_seconds
}
