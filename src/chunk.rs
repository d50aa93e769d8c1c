//! Recursive character text splitter.
//!
//! Splits document text into overlapping windows of at most `chunk_size`
//! characters. The splitter tries coarse separators first (paragraphs, then
//! lines, then words) and only falls back to single characters for pieces
//! that still do not fit. Small pieces are merged greedily; when a window is
//! emitted, its tail (up to `chunk_overlap` characters) seeds the next one.
//!
//! Lengths are counted in `char`s, never bytes, so multi-byte text is never
//! cut inside a code point.

use serde_json::{json, Map, Value};
use std::collections::VecDeque;

use crate::config::ChunkingConfig;
use crate::models::{Chunk, Document};

/// Separators tried in order, coarsest first. The empty separator means
/// "split into characters".
pub const DEFAULT_SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

#[derive(Debug, Clone)]
pub struct TextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<String>,
}

impl TextSplitter {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size,
            chunk_overlap,
            separators: DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn from_config(config: &ChunkingConfig) -> Self {
        Self::new(config.chunk_size, config.chunk_overlap)
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Split raw text into trimmed, non-empty windows.
    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.split_recursive(text, &self.separators)
    }

    /// Split every document, copying its metadata onto each chunk and
    /// recording the chunk's 1-based line range under `loc.lines`.
    pub fn split_documents(&self, documents: &[Document]) -> Vec<Chunk> {
        let mut chunks = Vec::new();

        for doc in documents {
            let text = doc.page_content.as_str();
            let mut line_counter: i64 = 1;
            let mut prev: Option<(usize, String)> = None;

            for piece in self.split_text(text) {
                let search_from = match &prev {
                    Some((idx, _)) => next_char_boundary(text, *idx),
                    None => 0,
                };
                let index = text[search_from..]
                    .find(piece.as_str())
                    .map(|pos| pos + search_from)
                    .unwrap_or(search_from);

                match &prev {
                    None => line_counter += count_newlines(&text[..index]),
                    Some((prev_index, prev_text)) => {
                        let prev_end = prev_index + prev_text.len();
                        if prev_end < index {
                            line_counter += count_newlines(&text[prev_end..index]);
                        } else if prev_end > index {
                            line_counter -= count_newlines(&text[index..prev_end]);
                        }
                    }
                }

                let newlines = count_newlines(&piece);
                let metadata = with_location(&doc.metadata, line_counter, line_counter + newlines);
                line_counter += newlines;

                chunks.push(Chunk {
                    text: piece.clone(),
                    metadata,
                });
                prev = Some((index, piece));
            }
        }

        chunks
    }

    fn split_recursive(&self, text: &str, separators: &[String]) -> Vec<String> {
        let mut final_chunks = Vec::new();

        // Pick the first separator that occurs in the text
        let mut separator = separators.last().map(String::as_str).unwrap_or("");
        let mut remaining: &[String] = &[];
        for (i, s) in separators.iter().enumerate() {
            if s.is_empty() {
                separator = "";
                break;
            }
            if text.contains(s.as_str()) {
                separator = s.as_str();
                remaining = &separators[i + 1..];
                break;
            }
        }

        let splits = split_keeping_separator(text, separator);
        let mut good: Vec<&str> = Vec::new();

        for s in splits {
            if char_len(s) < self.chunk_size {
                good.push(s);
                continue;
            }

            if !good.is_empty() {
                final_chunks.extend(self.merge_splits(&good));
                good.clear();
            }

            if remaining.is_empty() {
                final_chunks.push(s.to_string());
            } else {
                final_chunks.extend(self.split_recursive(s, remaining));
            }
        }

        if !good.is_empty() {
            final_chunks.extend(self.merge_splits(&good));
        }

        final_chunks
    }

    fn merge_splits(&self, splits: &[&str]) -> Vec<String> {
        let mut docs = Vec::new();
        let mut current: VecDeque<&str> = VecDeque::new();
        let mut total = 0usize;

        for &piece in splits {
            let len = char_len(piece);

            if total + len > self.chunk_size {
                if total > self.chunk_size {
                    tracing::warn!(
                        length = total,
                        chunk_size = self.chunk_size,
                        "created a chunk longer than the configured size"
                    );
                }

                if !current.is_empty() {
                    if let Some(doc) = join_pieces(&current) {
                        docs.push(doc);
                    }

                    // Keep at most `chunk_overlap` characters, and make room for the next piece
                    while total > self.chunk_overlap || (total + len > self.chunk_size && total > 0)
                    {
                        match current.pop_front() {
                            Some(front) => total -= char_len(front),
                            None => break,
                        }
                    }
                }
            }

            current.push_back(piece);
            total += len;
        }

        if let Some(doc) = join_pieces(&current) {
            docs.push(doc);
        }

        docs
    }
}

/// Split `text` before every occurrence of `separator`, so each separator
/// stays attached to the start of the piece that follows it.
fn split_keeping_separator<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    if separator.is_empty() {
        return text
            .char_indices()
            .map(|(i, c)| &text[i..i + c.len_utf8()])
            .collect();
    }

    let mut pieces = Vec::new();
    let mut start = 0;
    for (i, _) in text.char_indices() {
        if i > start && text[i..].starts_with(separator) {
            pieces.push(&text[start..i]);
            start = i;
        }
    }
    pieces.push(&text[start..]);
    pieces.retain(|p| !p.is_empty());
    pieces
}

fn join_pieces(pieces: &VecDeque<&str>) -> Option<String> {
    let joined: String = pieces.iter().copied().collect();
    let trimmed = joined.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn with_location(metadata: &Value, from: i64, to: i64) -> Value {
    let mut map = match metadata {
        Value::Object(map) => map.clone(),
        _ => Map::new(),
    };
    map.insert("loc".to_string(), json!({ "lines": { "from": from, "to": to } }));
    Value::Object(map)
}

fn next_char_boundary(text: &str, index: usize) -> usize {
    text[index..]
        .chars()
        .next()
        .map(|c| index + c.len_utf8())
        .unwrap_or(text.len())
}

fn count_newlines(text: &str) -> i64 {
    text.matches('\n').count() as i64
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_text_single_chunk() {
        let splitter = TextSplitter::new(1000, 200);
        let chunks = splitter.split_text("Hello, world!");
        assert_eq!(chunks, vec!["Hello, world!".to_string()]);
    }

    #[test]
    fn test_empty_text_no_chunks() {
        let splitter = TextSplitter::new(1000, 200);
        assert!(splitter.split_text("").is_empty());
        assert!(splitter.split_text("   \n\n  ").is_empty());
    }

    #[test]
    fn test_paragraphs_kept_whole_when_they_fit() {
        let a = "a".repeat(60);
        let b = "b".repeat(60);
        let text = format!("{}\n\n{}", a, b);
        let chunks = TextSplitter::new(100, 20).split_text(&text);
        assert_eq!(chunks, vec![a, b]);
    }

    #[test]
    fn test_chunk_count_follows_size_and_overlap() {
        // 25 characters, no separators: windows [0,10) [5,15) [10,20) [15,25)
        let text: String = ('a'..='y').collect();
        let chunks = TextSplitter::new(10, 5).split_text(&text);
        assert_eq!(chunks.len(), 4);
        assert_eq!(chunks[0], &text[0..10]);
        assert_eq!(chunks[1], &text[5..15]);
        assert_eq!(chunks[3], &text[15..25]);

        let no_overlap = TextSplitter::new(10, 0).split_text(&text);
        assert_eq!(no_overlap.len(), 3);
    }

    #[test]
    fn test_chunks_respect_size_and_overlap() {
        let text = (0..200)
            .map(|i| format!("word{}", i))
            .collect::<Vec<_>>()
            .join(" ");
        let chunks = TextSplitter::new(100, 20).split_text(&text);
        assert!(chunks.len() > 1);

        for c in &chunks {
            assert!(c.chars().count() <= 100, "chunk too long: {}", c.len());
        }

        for pair in chunks.windows(2) {
            let first_word = pair[1].split(' ').next().unwrap();
            assert!(
                pair[0].split(' ').any(|w| w == first_word),
                "expected '{}' to carry over from previous chunk",
                first_word
            );
        }
    }

    #[test]
    fn test_multibyte_text_is_not_cut_mid_char() {
        let text = "é".repeat(30);
        let chunks = TextSplitter::new(10, 0).split_text(&text);
        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| c.chars().count() == 10));
    }

    #[test]
    fn test_split_keeping_separator_attaches_to_next_piece() {
        let pieces = split_keeping_separator("a\nb\nc", "\n");
        assert_eq!(pieces, vec!["a", "\nb", "\nc"]);
    }

    #[test]
    fn test_documents_carry_metadata_and_line_ranges() {
        let doc = Document {
            page_content: "aaaaaaaa\nbbbbbbbb\ncccccccc".to_string(),
            metadata: json!({ "source": "books.csv", "line": 7 }),
        };
        let chunks = TextSplitter::new(10, 0).split_documents(&[doc]);

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[1].text, "bbbbbbbb");
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.metadata["source"], "books.csv");
            assert_eq!(chunk.metadata["line"], 7);
            assert_eq!(chunk.metadata["loc"]["lines"]["from"], (i + 1) as i64);
            assert_eq!(chunk.metadata["loc"]["lines"]["to"], (i + 1) as i64);
        }
    }

    #[test]
    fn test_single_chunk_spans_all_lines() {
        let doc = Document {
            page_content: "title: Dune\nauthor: Frank Herbert\nyear: 1965".to_string(),
            metadata: json!({ "line": 1 }),
        };
        let chunks = TextSplitter::new(1000, 200).split_documents(&[doc]);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].metadata["loc"]["lines"]["from"], 1);
        assert_eq!(chunks[0].metadata["loc"]["lines"]["to"], 3);
    }

    #[test]
    fn test_deterministic() {
        let text = "Alpha beta.\n\nGamma delta epsilon.\n\nZeta eta theta iota kappa.";
        let splitter = TextSplitter::new(20, 5);
        assert_eq!(splitter.split_text(text), splitter.split_text(text));
    }
}
