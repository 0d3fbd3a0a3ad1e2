//! PDF text extraction for the ingest and check paths.
//!
//! Extraction keeps narrative text and drops document furniture: tables of
//! contents, lists of figures/tables, bibliographies, and short fragments
//! such as running headers, footers, and page numbers.


use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;
use tracing::debug;

/// Extracted segments shorter than this are discarded.
const MIN_SEGMENT_CHARS: usize = 200;

static DOTTED_LEADER_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)(\.{3,}\s*\d{1,4}\s*$)|(\s\d{1,4}\s*$)").expect("leader regex is valid")
});

#[derive(Debug, Error)]
/// Errors from PDF processing.
pub enum PdfError {
    /// The PDF could not be parsed.
    #[error("PDF extraction failed: {message}")]
    Extract {
        /// Underlying parser error.
        message: String,
    },

    /// Parsing succeeded but no usable text remained after filtering.
    #[error("no usable text content in PDF")]
    Empty,
}

/// Result of extracting a PDF.
#[derive(Debug, Clone)]
pub struct PdfExtraction {
    /// Retained narrative text, segments joined by blank lines.
    pub text: String,
    pub total_pages: usize,
    /// Segments dropped by the furniture/length filters.
    pub discarded_segments: usize,
}

/// Extracts narrative text from PDF bytes.
pub fn extract_text(bytes: &[u8]) -> Result<PdfExtraction, PdfError> {
    let raw = pdf_extract::extract_text_from_mem(bytes).map_err(|e| PdfError::Extract {
        message: e.to_string(),
    })?;

    let total_pages = raw.split('\u{c}').count();
    let (text, discarded_segments) = filter_segments(&raw);

    debug!(total_pages, discarded_segments, kept_chars = text.len(), "PDF extracted");

    if text.is_empty() {
        return Err(PdfError::Empty);
    }

    Ok(PdfExtraction {
        text,
        total_pages,
        discarded_segments,
    })
}

/// Splits raw extracted text into blank-line-separated segments and drops
/// the ones that are not narrative content. Returns the retained text and
/// the number of discarded segments.
///
/// Everything after a bibliography heading is dropped: reference lists sit
/// at the end of academic documents, and matching against them produces
/// exactly the false positives the citation handling exists to avoid.
pub fn filter_segments(raw: &str) -> (String, usize) {
    let mut kept: Vec<&str> = Vec::new();
    let mut discarded = 0usize;
    let mut in_bibliography = false;

    for segment in raw.split("\n\n").map(str::trim).filter(|s| !s.is_empty()) {
        if in_bibliography {
            discarded += 1;
            continue;
        }

        if is_bibliography_heading(segment) {
            in_bibliography = true;
            discarded += 1;
            continue;
        }

        if is_front_matter_heading(segment) || is_toc_like(segment) {
            discarded += 1;
            continue;
        }

        if segment.chars().count() < MIN_SEGMENT_CHARS {
            discarded += 1;
            continue;
        }

        kept.push(segment);
    }

    (kept.join("\n\n"), discarded)
}

fn is_bibliography_heading(segment: &str) -> bool {
    let first_line = segment.lines().next().unwrap_or("").trim().to_lowercase();
    matches!(
        first_line.as_str(),
        "references" | "bibliography" | "works cited" | "literature cited"
    )
}

fn is_front_matter_heading(segment: &str) -> bool {
    let first_line = segment.lines().next().unwrap_or("").trim().to_lowercase();
    matches!(
        first_line.as_str(),
        "table of contents" | "contents" | "list of figures" | "list of tables"
    )
}

/// A segment reads as a table of contents when most of its lines end in
/// dotted leaders or bare page numbers.
fn is_toc_like(segment: &str) -> bool {
    let lines: Vec<&str> = segment.lines().filter(|l| !l.trim().is_empty()).collect();
    if lines.len() < 3 {
        return false;
    }

    let leader_lines = lines
        .iter()
        .filter(|line| DOTTED_LEADER_LINE.is_match(line))
        .count();

    leader_lines * 2 > lines.len()
}
