//! Citation markers and the score penalty they earn.

use std::sync::LazyLock;

use regex::Regex;

/// Fraction removed from a combined score when the chunk visibly cites a
/// source other than the matched document.
pub const CITATION_PENALTY: f32 = 0.15;

static PAREN_CITATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(([^)]*\d{4}[^)]*)\)").expect("paren-citation regex is valid"));

static BRACKET_CITATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\d{1,3}\]").expect("bracket-citation regex is valid"));

static DOI: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"10\.\d{4,}/").expect("doi regex is valid"));

static URL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"https?://").expect("url regex is valid"));

/// Returns `true` if the text carries at least one visible source
/// reference: `(Name, 2020)`, `[12]`, a DOI prefix, or a bare URL.
pub fn has_citation(text: &str) -> bool {
    PAREN_CITATION.is_match(text)
        || BRACKET_CITATION.is_match(text)
        || DOI.is_match(text)
        || URL.is_match(text)
}

/// Returns `true` when a `(Name, YYYY)` citation in `text` plausibly names
/// the document titled `matched_title` — i.e. the chunk is quoting the very
/// source it matched, so the penalty must not fire.
///
/// Bracket/DOI/URL markers carry no author name, so they never suppress
/// the penalty.
pub fn cites_source(text: &str, matched_title: &str) -> bool {
    let title_tokens: Vec<String> = name_tokens(matched_title);
    if title_tokens.is_empty() {
        return false;
    }

    for captures in PAREN_CITATION.captures_iter(text) {
        let inner = &captures[1];
        for token in name_tokens(inner) {
            if title_tokens.contains(&token) {
                return true;
            }
        }
    }

    false
}

fn name_tokens(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphabetic())
        .filter(|t| t.chars().count() > 2)
        .map(|t| t.to_lowercase())
        .collect()
}
