use super::*;

fn chunker() -> TextChunker {
    // Small parameters keep the fixtures readable.
    TextChunker::new(10, 2, 3)
}

fn words(n: usize) -> String {
    (0..n).map(|i| format!("word{}", i)).collect::<Vec<_>>().join(" ")
}

#[test]
fn test_normalize_collapses_whitespace() {
    let c = chunker();

    assert_eq!(c.normalize("Hello    world   test"), "Hello world test");
    assert_eq!(c.normalize("Hello\n\nworld\ttest"), "Hello world test");
    assert_eq!(c.normalize("  Hello world  "), "Hello world");
}

#[test]
fn test_normalize_strips_control_chars() {
    let c = chunker();
    assert_eq!(c.normalize("Hel\u{0001}lo\u{0002} world"), "Hello world");
}

#[test]
fn test_normalize_preserves_case_and_punctuation() {
    let c = chunker();
    assert_eq!(c.normalize("Hello, World! Ünïcode."), "Hello, World! Ünïcode.");
}

#[test]
fn test_normalize_empty() {
    let c = chunker();
    assert_eq!(c.normalize(""), "");
    assert_eq!(c.normalize("   "), "");
}

#[test]
fn test_empty_text_yields_no_chunks() {
    let c = chunker();
    assert!(c.chunk_text("").is_empty());
    assert!(c.chunk_text("  \t\n ").is_empty());
}

#[test]
fn test_short_text_single_chunk() {
    let c = chunker();
    let chunks = c.chunk_text("Hello world test");

    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].text, "Hello world test");
    assert_eq!(chunks[0].position, 0);
    assert_eq!(chunks[0].word_offset, 0);
    assert_eq!(chunks[0].word_count, 3);
}

#[test]
fn test_long_text_overlapping_windows() {
    let c = chunker();
    let chunks = c.chunk_text(&words(26));

    // step = 8: windows at 0, 8, 16 and a trailing window at 24 (2 new
    // words < min 3) merged into the chunk at 16.
    assert_eq!(chunks.len(), 3);
    assert_eq!(chunks[0].word_count, 10);
    assert_eq!(chunks[1].word_offset, 8);
    assert_eq!(chunks[1].word_count, 10);
    assert_eq!(chunks[2].word_offset, 16);
    assert_eq!(chunks[2].word_count, 10);

    // Overlap: the last 2 words of a chunk open the next one.
    assert!(chunks[0].text.ends_with("word8 word9"));
    assert!(chunks[1].text.starts_with("word8 word9"));
}

#[test]
fn test_positions_are_sequential() {
    let c = chunker();
    let chunks = c.chunk_text(&words(40));

    for (i, chunk) in chunks.iter().enumerate() {
        assert_eq!(chunk.position, i);
    }
}

#[test]
fn test_trailing_runt_merged_into_previous() {
    let c = chunker();
    // chunk_size + min_chunk_size - 1 words: the tail past the first
    // window carries min_chunk_size - 1 new words and must be merged.
    let chunks = c.chunk_text(&words(12));

    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].word_count, 12);
}

#[test]
fn test_trailing_window_emitted_at_min_size() {
    let c = chunker();
    // One more word than the merge case: the tail now carries exactly
    // min_chunk_size new words and stands alone.
    let chunks = c.chunk_text(&words(13));

    assert_eq!(chunks.len(), 2);
    assert_eq!(chunks[1].word_offset, 8);
    assert_eq!(chunks[1].word_count, 5);
}

#[test]
fn test_windows_reconstruct_normalized_text() {
    let c = chunker();
    let text = words(57);
    let chunks = c.chunk_text(&text);

    // Concatenating each chunk's non-overlapping prefix (the words before
    // the next chunk's offset) plus the full final chunk reproduces the
    // normalised input.
    let mut rebuilt: Vec<&str> = Vec::new();
    for pair in chunks.windows(2) {
        let fresh = pair[1].word_offset - pair[0].word_offset;
        rebuilt.extend(pair[0].text.split(' ').take(fresh));
    }
    rebuilt.extend(chunks.last().unwrap().text.split(' '));

    assert_eq!(rebuilt.join(" "), text);
}

#[test]
fn test_word_count() {
    let c = chunker();
    assert_eq!(c.word_count("Hello world"), 2);
    assert_eq!(c.word_count(""), 0);
    assert_eq!(c.word_count("One"), 1);
}

#[test]
fn test_detect_language_english() {
    let lang = detect_language("This is a test sentence in English language for detection.");
    assert_eq!(lang, "en");
}

#[test]
fn test_detect_language_vietnamese() {
    let lang = detect_language("Đây là một câu tiếng Việt để kiểm tra phát hiện ngôn ngữ.");
    assert_eq!(lang, "vi");
}

#[test]
fn test_detect_language_short_text() {
    assert_eq!(detect_language("Hi"), "unknown");
}
