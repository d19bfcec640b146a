//! Fuzzy similarity between queries and entry names.
//!
//! The base metric is the normalized Indel similarity: `100 * 2 * lcs /
//! (len(a) + len(b))` over Unicode scalar values, where `lcs` is the length
//! of the longest common subsequence. Both sides are trimmed and lowercased
//! before comparison.
//!
//! Dotted names are compared component by component from the right, so
//! `Bot.send_message` lines up with `telegram.Bot.send_message` instead of
//! being penalized for the missing `telegram.` prefix. The final score is
//! the mean of the per-component ratios and the whole-string ratio, scaled
//! by the entry's weight. A name equal to the query (ignoring case and
//! surrounding whitespace) always scores [`MAX_SCORE`], whatever its weight,
//! so an exact match is never outranked.

use rayon::prelude::*;
use serde::Serialize;

use crate::{entry::Entry, index::EntryIndex};

/// Highest attainable score, reached by exact name matches.
pub const MAX_SCORE: f32 = 100.0;

/// Characters that separate the components of a documented name.
const NAME_SEPARATORS: &[char] = &['.', '/', '-'];

/// An entry together with its similarity to the current query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoredEntry<'a> {
    pub entry: &'a Entry,
    pub score: f32,
}

/// A query split into the pieces the scorer compares against.
#[derive(Debug, Clone)]
pub struct PreparedQuery {
    full: Vec<char>,
    parts: Vec<Vec<char>>,
}

impl PreparedQuery {
    pub fn new(query: &str) -> Self {
        let normalized = normalize(query);
        Self {
            full: normalized.chars().collect(),
            parts: split_reversed(&normalized),
        }
    }

    /// Similarity of this query to `name`, in `[0, MAX_SCORE]`.
    pub fn similarity(&self, name: &str) -> f32 {
        let normalized = normalize(name);
        let name_full: Vec<char> = normalized.chars().collect();
        let name_parts = split_reversed(&normalized);

        let part_sum: f32 = self
            .parts
            .iter()
            .zip(&name_parts)
            .map(|(q, n)| ratio(q, n))
            .sum();
        let total = part_sum + ratio(&self.full, &name_full);

        total / (self.parts.len() + 1) as f32
    }

    /// Weighted score of `entry` against this query.
    pub fn score(&self, entry: &Entry) -> f32 {
        let similarity = self.similarity(&entry.name);
        if similarity >= MAX_SCORE {
            return MAX_SCORE;
        }
        similarity * entry.weight.min(1.0)
    }
}

/// Score every entry in `index` against `query`.
///
/// Returns one [`ScoredEntry`] per entry, highest score first. Entries with
/// equal scores keep their index order.
pub fn rank<'a>(query: &str, index: &'a EntryIndex) -> Vec<ScoredEntry<'a>> {
    let prepared = PreparedQuery::new(query);

    // Indexed parallel collect keeps index order, which the stable sort
    // below relies on for tie-breaking.
    let mut scored: Vec<ScoredEntry<'a>> = index
        .entries()
        .par_iter()
        .map(|entry| ScoredEntry {
            entry,
            score: prepared.score(entry),
        })
        .collect();

    scored.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    tracing::trace!(query, candidates = scored.len(), "ranked entries");
    scored
}

/// Normalized Indel similarity of two character sequences, in `[0, 100]`.
pub fn ratio(a: &[char], b: &[char]) -> f32 {
    let total = a.len() + b.len();
    if total == 0 {
        return MAX_SCORE;
    }
    let lcs = lcs_len(a, b);
    MAX_SCORE * (2 * lcs) as f32 / total as f32
}

/// Convenience wrapper around [`ratio`] for string slices.
pub fn str_ratio(a: &str, b: &str) -> f32 {
    let a: Vec<char> = normalize(a).chars().collect();
    let b: Vec<char> = normalize(b).chars().collect();
    ratio(&a, &b)
}

fn lcs_len(a: &[char], b: &[char]) -> usize {
    let (short, long) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    if short.is_empty() {
        return 0;
    }

    let mut row = vec![0usize; short.len() + 1];
    for &lc in long {
        let mut diagonal = 0;
        for (j, &sc) in short.iter().enumerate() {
            let above = row[j + 1];
            row[j + 1] = if lc == sc {
                diagonal + 1
            } else {
                above.max(row[j])
            };
            diagonal = above;
        }
    }
    row[short.len()]
}

fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

fn split_reversed(normalized: &str) -> Vec<Vec<char>> {
    normalized
        .split(NAME_SEPARATORS)
        .rev()
        .map(|part| part.chars().collect())
        .collect()
}
