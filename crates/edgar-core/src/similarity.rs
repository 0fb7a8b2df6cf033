//! String similarity scoring.
//!
//! All scorers are case-insensitive and work on a normalized form of their
//! inputs (lowercase, punctuation folded to spaces, whitespace collapsed).
//! The `*_ratio` functions return integer percentages in `0..=100`;
//! [`score`] maps token-set similarity into `[0.0, 1.0]`.

use std::collections::{BTreeSet, HashMap};

/// Lowercase, replace every non-alphanumeric character with a space and
/// collapse runs of whitespace.
pub fn normalize(text: &str) -> String {
    let folded: String = text
        .chars()
        .map(|c| {
            if c.is_alphanumeric() {
                c.to_lowercase().next().unwrap_or(c)
            } else {
                ' '
            }
        })
        .collect();
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Number of whitespace-separated words in `text`.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Bit-parallel LCS pattern over one side of a comparison.
///
/// Each character of the pattern owns one bit; scanning a text costs one
/// pass of `ceil(len / 64)` word operations per text character.
struct LcsPattern {
    len: usize,
    masks: HashMap<char, Vec<u64>>,
}

impl LcsPattern {
    fn new(pattern: &[char]) -> Self {
        let words = pattern.len().div_ceil(64);
        let mut masks: HashMap<char, Vec<u64>> = HashMap::new();
        for (i, &c) in pattern.iter().enumerate() {
            masks.entry(c).or_insert_with(|| vec![0; words])[i / 64] |= 1u64 << (i % 64);
        }
        Self {
            len: pattern.len(),
            masks,
        }
    }

    /// Length of the longest common subsequence of the pattern and `text`.
    fn lcs_len(&self, text: &[char]) -> usize {
        if self.len == 0 || text.is_empty() {
            return 0;
        }
        let words = self.len.div_ceil(64);
        let mut state = vec![u64::MAX; words];
        for c in text {
            let Some(mask) = self.masks.get(c) else {
                continue;
            };
            let mut carry = false;
            for (s, &m) in state.iter_mut().zip(mask) {
                let u = *s & m;
                let (sum, c1) = s.overflowing_add(u);
                let (sum, c2) = sum.overflowing_add(u64::from(carry));
                carry = c1 || c2;
                *s = sum | (*s & !u);
            }
        }
        state
            .iter()
            .enumerate()
            .map(|(w, s)| {
                let bits = (self.len - w * 64).min(64);
                let valid = if bits == 64 { u64::MAX } else { (1u64 << bits) - 1 };
                (!s & valid).count_ones() as usize
            })
            .sum()
    }
}

/// Length of the longest common subsequence of two char slices.
fn lcs_len(a: &[char], b: &[char]) -> usize {
    let (pattern, text) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    LcsPattern::new(pattern).lcs_len(text)
}

fn ratio_from_lcs(lcs: usize, total: usize) -> u8 {
    // (total - indel_distance) / total, where indel_distance = total - 2 * lcs
    ((2 * lcs) as f64 * 100.0 / total as f64).round() as u8
}

fn ratio_chars(a: &[char], b: &[char]) -> u8 {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    ratio_from_lcs(lcs_len(a, b), a.len() + b.len())
}

/// Edit-distance ratio between two strings as a percentage.
///
/// Uses insert/delete distance, so a substitution costs two edits. Either
/// side being empty yields 0.
pub fn ratio(a: &str, b: &str) -> u8 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    ratio_chars(&a, &b)
}

/// Best [`ratio`] between the shorter string and any equal-length window of
/// the longer one.
pub fn partial_ratio(a: &str, b: &str) -> u8 {
    let a: Vec<char> = normalize(a).chars().collect();
    let b: Vec<char> = normalize(b).chars().collect();
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    let (shorter, longer) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let width = shorter.len();
    let pattern = LcsPattern::new(&shorter);

    let mut best = 0u8;
    for window in longer.windows(width) {
        let r = ratio_from_lcs(pattern.lcs_len(window), 2 * width);
        if r > best {
            best = r;
            if best == 100 {
                break;
            }
        }
    }
    best
}

/// Word-order-insensitive similarity as a percentage.
///
/// Both inputs are reduced to word sets. With `I` the sorted intersection and
/// `A`, `B` the sorted differences, the result is the best ratio among
/// `(I, I+A)`, `(I, I+B)` and `(I+A, I+B)`. When one word set contains the
/// other the result is 100.
pub fn token_set_ratio(a: &str, b: &str) -> u8 {
    let a = normalize(a);
    let b = normalize(b);
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    let set_a: BTreeSet<&str> = a.split(' ').collect();
    let set_b: BTreeSet<&str> = b.split(' ').collect();

    let join = |words: Vec<&str>| words.join(" ");
    let intersection = join(set_a.intersection(&set_b).copied().collect());
    let only_a = join(set_a.difference(&set_b).copied().collect());
    let only_b = join(set_b.difference(&set_a).copied().collect());

    let combine = |rest: &str| {
        format!("{} {}", intersection, rest).trim().to_string()
    };
    let combined_a = combine(&only_a);
    let combined_b = combine(&only_b);

    ratio(&intersection, &combined_a)
        .max(ratio(&intersection, &combined_b))
        .max(ratio(&combined_a, &combined_b))
}

/// Similarity in `[0.0, 1.0]` used for question and branch matching.
pub fn score(a: &str, b: &str) -> f32 {
    (f32::from(token_set_ratio(a, b)) / 100.0).clamp(0.0, 1.0)
}
