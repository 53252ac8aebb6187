//! Fuzzy track lookup by free-text term
//!
//! Two strategies are unioned: the best Ratcliff/Obershelp matches over file
//! stems select a set of close names, then plain case-insensitive substring
//! matches are appended.

use std::collections::HashSet;
use tunekeep_core::Track;

/// Maximum number of distinct names taken from the similarity ranking
pub const DEFAULT_MAX_CLOSE: usize = 15;

/// Minimum similarity ratio for a name to count as close
pub const DEFAULT_CUTOFF: f64 = 0.3;

/// Ratcliff/Obershelp similarity between two character sequences
///
/// Finds the longest common block, then recurses on the pieces to its left
/// and right. The ratio is `2 * matched / (len(a) + len(b))`.
#[derive(Debug, Clone)]
pub struct SequenceMatcher {
    a: Vec<char>,
    b: Vec<char>,
}

impl SequenceMatcher {
    pub fn new(a: &str, b: &str) -> Self {
        Self {
            a: a.chars().collect(),
            b: b.chars().collect(),
        }
    }

    /// Longest common block within `a[alo..ahi]` and `b[blo..bhi]`
    ///
    /// Returns `(i, j, size)`. Among blocks of equal size the one starting
    /// earliest in `a` wins, then the one starting earliest in `b`.
    pub fn find_longest_match(
        &self,
        alo: usize,
        ahi: usize,
        blo: usize,
        bhi: usize,
    ) -> (usize, usize, usize) {
        let (mut best_i, mut best_j, mut best_size) = (alo, blo, 0);
        // prev[j - blo + 1]: size of the block ending at a[i - 1], b[j]
        let width = bhi.saturating_sub(blo) + 1;
        let mut prev = vec![0usize; width];
        let mut curr = vec![0usize; width];

        for i in alo..ahi {
            for j in blo..bhi {
                let slot = j - blo + 1;
                if self.a[i] == self.b[j] {
                    let k = prev[slot - 1] + 1;
                    curr[slot] = k;
                    if k > best_size {
                        best_i = i + 1 - k;
                        best_j = j + 1 - k;
                        best_size = k;
                    }
                } else {
                    curr[slot] = 0;
                }
            }
            std::mem::swap(&mut prev, &mut curr);
        }

        (best_i, best_j, best_size)
    }

    /// Total number of characters in matching blocks
    pub fn matched_chars(&self) -> usize {
        let mut total = 0;
        let mut queue = vec![(0, self.a.len(), 0, self.b.len())];

        while let Some((alo, ahi, blo, bhi)) = queue.pop() {
            let (i, j, k) = self.find_longest_match(alo, ahi, blo, bhi);
            if k == 0 {
                continue;
            }
            total += k;
            if alo < i && blo < j {
                queue.push((alo, i, blo, j));
            }
            if i + k < ahi && j + k < bhi {
                queue.push((i + k, ahi, j + k, bhi));
            }
        }

        total
    }

    pub fn ratio(&self) -> f64 {
        let length = self.a.len() + self.b.len();
        if length == 0 {
            return 1.0;
        }
        2.0 * self.matched_chars() as f64 / length as f64
    }
}

/// Similarity ratio of two strings, case-sensitive
pub fn similarity(a: &str, b: &str) -> f64 {
    SequenceMatcher::new(a, b).ratio()
}

/// Names scoring at least `cutoff` against `term`, best first
///
/// Ties on score are broken by name, descending. At most `limit` names are
/// returned.
pub fn close_matches<'a>(
    term: &str,
    names: impl IntoIterator<Item = &'a str>,
    limit: usize,
    cutoff: f64,
) -> Vec<&'a str> {
    let mut scored: Vec<(f64, &str)> = names
        .into_iter()
        .filter_map(|name| {
            let score = SequenceMatcher::new(name, term).ratio();
            (score >= cutoff).then_some((score, name))
        })
        .collect();

    scored.sort_by(|x, y| y.0.total_cmp(&x.0).then_with(|| y.1.cmp(x.1)));
    scored.truncate(limit);
    scored.into_iter().map(|(_, name)| name).collect()
}

/// Resolves a term to candidate tracks
#[derive(Debug, Clone)]
pub struct FuzzyMatcher {
    limit: usize,
    cutoff: f64,
}

impl Default for FuzzyMatcher {
    fn default() -> Self {
        Self {
            limit: DEFAULT_MAX_CLOSE,
            cutoff: DEFAULT_CUTOFF,
        }
    }
}

impl FuzzyMatcher {
    /// Create a new fuzzy matcher with default limit and cutoff
    pub fn new() -> Self {
        Self::default()
    }

    /// Candidate tracks for `term`, de-duplicated by path
    ///
    /// `tracks` is the snapshot to search. The similarity ranking only picks
    /// which names count as close; tracks carrying those names come first in
    /// snapshot order, followed by the remaining substring matches.
    pub fn find(&self, term: &str, tracks: &[Track]) -> Vec<Track> {
        let stems: Vec<String> = tracks.iter().map(Track::stem).collect();

        let mut seen_names = HashSet::new();
        let close: HashSet<&str> = close_matches(
            term,
            stems.iter().map(String::as_str),
            usize::MAX,
            self.cutoff,
        )
        .into_iter()
        .filter(|name| seen_names.insert(*name))
        .take(self.limit)
        .collect();

        let mut seen = HashSet::new();
        let mut results = Vec::new();

        for (track, stem) in tracks.iter().zip(&stems) {
            if close.contains(stem.as_str()) && seen.insert(track.path().to_path_buf()) {
                results.push(track.clone());
            }
        }

        let needle = term.to_lowercase();
        for (track, stem) in tracks.iter().zip(&stems) {
            if stem.to_lowercase().contains(&needle) && seen.insert(track.path().to_path_buf()) {
                results.push(track.clone());
            }
        }

        results
    }
}
