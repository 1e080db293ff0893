//! Document chunking.
//!
//! This module provides the [`Chunker`] trait and [`RecursiveChunker`],
//! which splits text hierarchically — paragraphs, then sentences, then
//! words — falling back to a hard character cut only when no higher-level
//! boundary exists inside the window.

use std::collections::VecDeque;

use crate::document::{Chunk, Document};

/// Separator hierarchy tried in order: paragraph, sentence, word.
const SEPARATORS: [&str; 5] = ["\n\n", ". ", "! ", "? ", " "];

/// A strategy for splitting documents into chunks.
///
/// Implementations produce [`Chunk`]s carrying the parent document's
/// metadata. No produced chunk is empty.
pub trait Chunker: Send + Sync {
    /// Split a single document into chunks, preserving text order.
    ///
    /// Returns an empty `Vec` if the document has no text.
    fn chunk(&self, document: &Document) -> Vec<Chunk>;

    /// Split a sequence of documents, preserving document order and,
    /// within each document, text order.
    fn chunk_all(&self, documents: &[Document]) -> Vec<Chunk> {
        documents.iter().flat_map(|d| self.chunk(d)).collect()
    }
}

/// Splits text into windows of at most `chunk_size` characters where
/// consecutive windows from the same document share up to `chunk_overlap`
/// characters.
///
/// Splitting prefers natural boundaries (paragraph → sentence → word) and
/// only cuts mid-word when a single unbroken run exceeds the window.
///
/// # Example
///
/// ```rust,ignore
/// use docrag::RecursiveChunker;
///
/// let chunker = RecursiveChunker::new(1000, 250);
/// let chunks = chunker.chunk(&document);
/// ```
#[derive(Debug, Clone)]
pub struct RecursiveChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl RecursiveChunker {
    /// Create a new `RecursiveChunker`.
    ///
    /// # Arguments
    ///
    /// * `chunk_size` — maximum number of characters per chunk
    /// * `chunk_overlap` — target overlap between consecutive chunks
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self { chunk_size, chunk_overlap }
    }
}

impl Chunker for RecursiveChunker {
    fn chunk(&self, document: &Document) -> Vec<Chunk> {
        if document.text.is_empty() {
            return Vec::new();
        }

        split_text(&document.text, self.chunk_size, self.chunk_overlap, &SEPARATORS)
            .into_iter()
            .filter(|text| !text.is_empty())
            .map(|text| Chunk { text, metadata: document.metadata.clone() })
            .collect()
    }
}

/// Split `text` at the first separator level, recursing into finer
/// separators for segments that still exceed `chunk_size`, then merge the
/// resulting pieces into overlapping windows.
fn split_text(
    text: &str,
    chunk_size: usize,
    chunk_overlap: usize,
    separators: &[&str],
) -> Vec<String> {
    if text.len() <= chunk_size || separators.is_empty() {
        return split_by_size(text, chunk_size, chunk_overlap);
    }

    let separator = separators[0];
    let remaining_separators = &separators[1..];

    let mut pieces = Vec::new();
    for segment in split_keeping_separator(text, separator) {
        if segment.len() > chunk_size {
            pieces.extend(split_text(segment, chunk_size, chunk_overlap, remaining_separators));
        } else {
            pieces.push(segment.to_string());
        }
    }

    merge_with_overlap(pieces, chunk_size, chunk_overlap)
}

/// Split text at a separator while keeping the separator attached to the
/// preceding segment, so rejoining pieces reproduces the original text.
fn split_keeping_separator<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    let mut result = Vec::new();
    let mut start = 0;

    while let Some(pos) = text[start..].find(separator) {
        let end = start + pos + separator.len();
        result.push(&text[start..end]);
        start = end;
    }

    if start < text.len() {
        result.push(&text[start..]);
    }

    result
}

/// Merge boundary-aligned pieces into windows of at most `chunk_size`
/// characters. When a window fills, trailing whole pieces totalling at
/// most `chunk_overlap` characters are retained to seed the next window.
fn merge_with_overlap(pieces: Vec<String>, chunk_size: usize, chunk_overlap: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut window: VecDeque<String> = VecDeque::new();
    let mut window_len = 0usize;

    for piece in pieces {
        if piece.is_empty() {
            continue;
        }

        if !window.is_empty() && window_len + piece.len() > chunk_size {
            chunks.push(window.iter().map(String::as_str).collect::<String>());
            // Keep a tail of whole pieces as overlap, popping further if
            // the incoming piece would not fit beside it.
            while !window.is_empty()
                && (window_len > chunk_overlap || window_len + piece.len() > chunk_size)
            {
                if let Some(head) = window.pop_front() {
                    window_len -= head.len();
                }
            }
        }

        window_len += piece.len();
        window.push_back(piece);
    }

    if !window.is_empty() {
        chunks.push(window.iter().map(String::as_str).collect::<String>());
    }

    chunks
}

/// Hard character-cut splitting with overlap, used when no separator
/// exists inside the window. Cut points are snapped to UTF-8 boundaries.
fn split_by_size(text: &str, chunk_size: usize, chunk_overlap: usize) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }

    let mut chunks = Vec::new();
    let mut start = 0;

    while start < text.len() {
        let mut end = (start + chunk_size).min(text.len());
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        chunks.push(text[start..end].to_string());
        if end == text.len() {
            break;
        }

        let step = chunk_size.saturating_sub(chunk_overlap);
        if step == 0 {
            break;
        }
        let mut next = start + step;
        while !text.is_char_boundary(next) {
            next += 1;
        }
        start = next;
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;

    fn doc(text: &str) -> Document {
        Document::with_source(text, "test.txt")
    }

    #[test]
    fn empty_document_yields_no_chunks() {
        let chunker = RecursiveChunker::new(1000, 250);
        assert!(chunker.chunk(&doc("")).is_empty());
        assert!(chunker.chunk_all(&[]).is_empty());
    }

    #[test]
    fn document_of_exactly_chunk_size_is_one_chunk() {
        let text = "a".repeat(1000);
        let chunker = RecursiveChunker::new(1000, 250);
        let chunks = chunker.chunk(&doc(&text));
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, text);
    }

    #[test]
    fn unbroken_text_is_cut_into_overlapping_windows() {
        let text = "a".repeat(2000);
        let chunker = RecursiveChunker::new(1000, 250);
        let chunks = chunker.chunk(&doc(&text));

        // ceil(2000 / (1000 - 250)) == 3
        assert_eq!(chunks.len(), 3);
        for pair in chunks.windows(2) {
            let prev = &pair[0].text;
            let next = &pair[1].text;
            assert!(prev.len() <= 1000);
            assert_eq!(&prev[prev.len() - 250..], &next[..250]);
        }
    }

    #[test]
    fn word_text_respects_size_and_shares_overlap() {
        let text = (0..100).map(|i| format!("word{i:04}")).collect::<Vec<_>>().join(" ");
        let chunker = RecursiveChunker::new(100, 30);
        let chunks = chunker.chunk(&doc(&text));

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(!chunk.text.is_empty());
            assert!(chunk.text.len() <= 100);
        }
        for pair in chunks.windows(2) {
            let prev = &pair[0].text;
            let next = &pair[1].text;
            let shared = (1..=prev.len().min(30))
                .rev()
                .find(|&k| next.len() >= k && prev[prev.len() - k..] == next[..k])
                .unwrap_or(0);
            assert!(shared > 0, "windows share no overlap: {prev:?} / {next:?}");
        }
    }

    #[test]
    fn prefers_paragraph_boundaries() {
        let text = format!("{}\n\n{}", "alpha ".repeat(20).trim(), "beta ".repeat(20).trim());
        let chunker = RecursiveChunker::new(150, 20);
        let chunks = chunker.chunk(&doc(&text));

        assert_eq!(chunks.len(), 2);
        assert!(chunks[0].text.contains("alpha"));
        assert!(!chunks[0].text.contains("beta"));
        assert!(chunks[1].text.contains("beta"));
    }

    #[test]
    fn chunk_order_and_metadata_follow_input() {
        let docs = vec![
            Document::with_source("first ".repeat(300), "one.txt"),
            Document::with_source("second ".repeat(300), "two.txt"),
        ];
        let chunker = RecursiveChunker::new(500, 100);
        let chunks = chunker.chunk_all(&docs);

        let boundary = chunks.iter().position(|c| c.metadata["source"] == "two.txt").unwrap();
        assert!(boundary > 0);
        assert!(chunks[..boundary].iter().all(|c| c.metadata["source"] == "one.txt"));
        assert!(chunks[boundary..].iter().all(|c| c.metadata["source"] == "two.txt"));
    }

    #[test]
    fn multibyte_text_never_splits_a_code_point() {
        let text = "é".repeat(1200);
        let chunker = RecursiveChunker::new(1000, 250);
        let chunks = chunker.chunk(&doc(&text));
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.text.chars().all(|c| c == 'é'));
        }
    }
}
