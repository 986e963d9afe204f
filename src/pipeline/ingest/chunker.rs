use super::types::{Chunker, TextChunk};
use crate::config;

/// Fixed-size chunker with overlap between consecutive segments.
///
/// Each chunk covers `chunk_chars` bytes (snapped back to UTF-8
/// boundaries) and the next chunk starts `chunk_chars - overlap_chars`
/// further along, so neighbors share `overlap_chars` of text. Overlap is
/// clamped below the chunk size so the walk always terminates and no
/// chunk consists solely of repeated text.
pub struct OverlapChunker {
    chunk_chars: usize,
    overlap_chars: usize,
}

impl OverlapChunker {
    pub fn new() -> Self {
        Self::with_sizes(config::CHUNK_SIZE_CHARS, config::CHUNK_OVERLAP_CHARS)
    }

    pub fn with_sizes(chunk_chars: usize, overlap_chars: usize) -> Self {
        let chunk_chars = chunk_chars.max(1);
        let overlap_chars = if overlap_chars >= chunk_chars {
            tracing::warn!(
                chunk_chars,
                overlap_chars,
                "Chunk overlap >= chunk size, clamping"
            );
            chunk_chars - 1
        } else {
            overlap_chars
        };
        Self {
            chunk_chars,
            overlap_chars,
        }
    }
}

impl Default for OverlapChunker {
    fn default() -> Self {
        Self::new()
    }
}

impl Chunker for OverlapChunker {
    fn chunk(&self, text: &str) -> Vec<TextChunk> {
        let mut chunks = Vec::new();
        if text.is_empty() {
            return chunks;
        }

        let step = self.chunk_chars - self.overlap_chars;
        let mut start = 0;
        let mut chunk_index = 0;

        while start < text.len() {
            let mut end = floor_char_boundary(text, (start + self.chunk_chars).min(text.len()));
            if end <= start {
                // Chunk size smaller than the character at `start`; widen
                // to the next boundary so the chunk is never empty.
                end = ceil_char_boundary(text, start + 1);
            }
            chunks.push(TextChunk {
                content: text[start..end].to_string(),
                chunk_index,
                char_offset: start,
            });
            chunk_index += 1;

            if end >= text.len() {
                break;
            }
            // Boundary snapping can pull the next start back onto the
            // current one; fall through to `end` to keep advancing.
            let next = floor_char_boundary(text, start + step);
            start = if next <= start { end } else { next };
        }

        chunks
    }
}

/// Largest index <= `index` that lies on a char boundary.
fn floor_char_boundary(text: &str, mut index: usize) -> usize {
    while index > 0 && !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

/// Smallest index >= `index` (capped at `text.len()`) on a char boundary.
fn ceil_char_boundary(text: &str, mut index: usize) -> usize {
    while index < text.len() && !text.is_char_boundary(index) {
        index += 1;
    }
    index
}
