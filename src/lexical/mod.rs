//! Surface-level similarity between an input chunk and a matched chunk.
//!
//! Embedding similarity alone over-reports paraphrase: two passages about
//! the same topic score high semantically even when no text was copied.
//! The lexical score anchors the verdict to actual token overlap.

pub mod citation;


use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

pub use citation::{CITATION_PENALTY, cites_source, has_citation};

/// Length ratio above which the two texts are compared symmetrically.
const SYMMETRIC_LEN_RATIO: f32 = 0.7;

static NON_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s]").expect("non-word regex is valid"));

static CITATION_SPAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\([^)]*\d{4}[^)]*\)").expect("citation-span regex is valid"));

static WHITESPACE_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace regex is valid"));

/// Lowercases, drops citation spans, strips punctuation to spaces, and
/// collapses whitespace. Stopwords are retained: function words carry
/// stylistic signal that separates copied text from coincidental overlap.
pub fn normalize_for_comparison(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let text = text.to_lowercase();
    let text = CITATION_SPAN.replace_all(&text, "");
    let text = NON_WORD.replace_all(&text, " ");
    let text = WHITESPACE_RUNS.replace_all(&text, " ");
    text.trim().to_string()
}

/// Lexical similarity in [0, 1] between an input chunk and a matched chunk.
///
/// When the two sides have comparable length the comparison is symmetric:
/// Jaccard overlap on word sets (weight 0.6) blended with a
/// longest-common-subsequence ratio over the token stream (weight 0.4).
/// When one side is much shorter, a containment score (fraction of the
/// shorter side's words present in the longer) replaces Jaccard, blended
/// with a character-level sequence ratio. Containment keeps a short stored
/// chunk that was wholly copied into a longer input from being diluted.
pub fn lexical_similarity(input_text: &str, matched_text: &str) -> f32 {
    let input = normalize_for_comparison(input_text);
    let matched = normalize_for_comparison(matched_text);

    if input.is_empty() || matched.is_empty() {
        return 0.0;
    }

    let input_tokens: Vec<&str> = input.split(' ').collect();
    let matched_tokens: Vec<&str> = matched.split(' ').collect();

    let shorter = input_tokens.len().min(matched_tokens.len());
    let longer = input_tokens.len().max(matched_tokens.len());
    let len_ratio = shorter as f32 / longer as f32;

    let input_set: HashSet<&str> = input_tokens.iter().copied().collect();
    let matched_set: HashSet<&str> = matched_tokens.iter().copied().collect();

    if len_ratio > SYMMETRIC_LEN_RATIO {
        let jaccard = jaccard_similarity(&input_set, &matched_set);
        let sequence = lcs_ratio(&input_tokens, &matched_tokens);
        jaccard * 0.6 + sequence * 0.4
    } else {
        let intersection = input_set.intersection(&matched_set).count();
        let shorter_set = input_set.len().min(matched_set.len());
        let containment = if shorter_set == 0 {
            0.0
        } else {
            intersection as f32 / shorter_set as f32
        };

        let input_chars: Vec<char> = input.chars().collect();
        let matched_chars: Vec<char> = matched.chars().collect();
        let sequence = lcs_ratio(&input_chars, &matched_chars);

        containment * 0.6 + sequence * 0.4
    }
}

/// Jaccard similarity on word sets.
pub fn jaccard_similarity(a: &HashSet<&str>, b: &HashSet<&str>) -> f32 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let intersection = a.intersection(b).count();
    let union = a.len() + b.len() - intersection;

    intersection as f32 / union as f32
}

/// Longest-common-subsequence ratio `2·L / (m + n)` over two item streams.
///
/// Rolling single-row DP; chunk texts are bounded by the chunking window so
/// the quadratic cost stays small.
pub fn lcs_ratio<T: PartialEq>(a: &[T], b: &[T]) -> f32 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];

    for x in a {
        for (j, y) in b.iter().enumerate() {
            curr[j + 1] = if x == y {
                prev[j] + 1
            } else {
                prev[j + 1].max(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    let lcs = prev[b.len()];
    (2 * lcs) as f32 / (a.len() + b.len()) as f32
}
