//! Text normalisation and overlapping word-window chunking.

#[cfg(test)]
mod tests;

use std::sync::LazyLock;

use regex::Regex;

use crate::config::Config;

static WHITESPACE_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace regex is valid"));

static CONTROL_CHARS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\x00-\x08\x0b\x0c\x0e-\x1f\x7f-\u{9f}]").expect("control-char regex is valid")
});

/// A window of consecutive words cut from a normalised document.
#[derive(Debug, Clone, PartialEq)]
pub struct TextChunk {
    /// The chunk text (words joined by single spaces).
    pub text: String,
    /// Sequential index within the document, `0..N-1`.
    pub position: usize,
    /// Offset of the first word from the start of the normalised text.
    pub word_offset: usize,
    /// Number of words in the chunk.
    pub word_count: usize,
}

/// Splits text into overlapping word windows.
///
/// Windows advance by `chunk_size - chunk_overlap` words. A trailing window
/// that would contribute fewer than `min_chunk_size` new words is merged
/// into the previous chunk, so the windows always cover the whole text.
#[derive(Debug, Clone)]
pub struct TextChunker {
    chunk_size: usize,
    chunk_overlap: usize,
    min_chunk_size: usize,
}

impl TextChunker {
    /// Creates a chunker with explicit parameters.
    ///
    /// Callers are expected to have validated `chunk_overlap < chunk_size`
    /// (see [`Config::validate`]).
    pub fn new(chunk_size: usize, chunk_overlap: usize, min_chunk_size: usize) -> Self {
        Self {
            chunk_size,
            chunk_overlap,
            min_chunk_size,
        }
    }

    /// Creates a chunker from the configured chunking parameters.
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.chunk_size, config.chunk_overlap, config.min_chunk_size)
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Collapses whitespace runs to single spaces, strips control
    /// characters, and trims. Casing is preserved.
    pub fn normalize(&self, text: &str) -> String {
        if text.is_empty() {
            return String::new();
        }

        let text = WHITESPACE_RUNS.replace_all(text, " ");
        let text = CONTROL_CHARS.replace_all(&text, "");
        text.trim().to_string()
    }

    /// Splits `text` into overlapping chunks with positions `0..N-1`.
    ///
    /// Empty or whitespace-only input yields no chunks. Text at most
    /// `chunk_size` words long becomes a single chunk.
    pub fn chunk_text(&self, text: &str) -> Vec<TextChunk> {
        let text = self.normalize(text);
        if text.is_empty() {
            return Vec::new();
        }

        let words: Vec<&str> = text.split(' ').collect();
        let total = words.len();

        if total <= self.chunk_size {
            return vec![TextChunk {
                text,
                position: 0,
                word_offset: 0,
                word_count: total,
            }];
        }

        let step = self.chunk_size - self.chunk_overlap;
        let mut chunks: Vec<TextChunk> = Vec::new();
        let mut start = 0;

        while start < total {
            let end = (start + self.chunk_size).min(total);
            let is_trailing = end == total;

            // A trailing window shorter than min_chunk_size beyond the
            // overlap carries too little new text to stand alone; fold it
            // into the previous chunk instead of emitting a runt.
            if is_trailing
                && !chunks.is_empty()
                && total - start < self.min_chunk_size + self.chunk_overlap
            {
                let prev = chunks.last_mut().expect("previous chunk exists");
                prev.text = words[prev.word_offset..total].join(" ");
                prev.word_count = total - prev.word_offset;
                break;
            }

            chunks.push(TextChunk {
                text: words[start..end].join(" "),
                position: chunks.len(),
                word_offset: start,
                word_count: end - start,
            });

            if is_trailing {
                break;
            }
            start += step;
        }

        chunks
    }

    /// Returns the whitespace-token count of `text`.
    pub fn word_count(&self, text: &str) -> usize {
        text.split_whitespace().count()
    }
}

/// Best-effort language tag for a text sample.
///
/// Looks at the script and diacritic profile of the first few hundred
/// characters. Returns `"unknown"` for short or ambiguous input; the tag is
/// metadata only and never changes detection behaviour.
pub fn detect_language(text: &str) -> &'static str {
    let sample: String = text.chars().take(400).collect();
    if sample.chars().count() < 20 {
        return "unknown";
    }

    let mut letters = 0usize;
    let mut ascii = 0usize;
    let mut vietnamese = 0usize;
    let mut cyrillic = 0usize;
    let mut cjk = 0usize;

    for c in sample.chars() {
        if !c.is_alphabetic() {
            continue;
        }
        letters += 1;
        if c.is_ascii_alphabetic() {
            ascii += 1;
        } else if is_vietnamese_letter(c) {
            vietnamese += 1;
        } else if ('\u{0400}'..='\u{04ff}').contains(&c) {
            cyrillic += 1;
        } else if ('\u{4e00}'..='\u{9fff}').contains(&c) {
            cjk += 1;
        }
    }

    if letters == 0 {
        return "unknown";
    }

    if cjk * 4 > letters {
        "zh"
    } else if cyrillic * 2 > letters {
        "ru"
    } else if vietnamese * 50 > letters {
        "vi"
    } else if ascii * 10 > letters * 9 {
        "en"
    } else {
        "unknown"
    }
}

fn is_vietnamese_letter(c: char) -> bool {
    matches!(c,
        'à'..='ã' | 'è'..='ê' | 'ì' | 'í' | 'ò'..='õ' | 'ù' | 'ú' | 'ý'
        | 'ă' | 'đ' | 'ĩ' | 'ũ' | 'ơ' | 'ư'
        | '\u{1ea0}'..='\u{1ef9}')
}
