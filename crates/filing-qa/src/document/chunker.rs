use serde::Serialize;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Chunk {
    pub index: usize,
    pub content: String,
    /// Offset of the first unit (char or word) of this chunk in the source.
    pub start_pos: usize,
    /// Exclusive end offset, in the same unit as `start_pos`.
    pub end_pos: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChunkUnit {
    Chars,
    Words,
}

/// Overlapping sliding windows over text.
#[derive(Debug, Clone)]
pub struct TextChunker {
    unit: ChunkUnit,
    chunk_size: usize,
    step: usize,
}

impl TextChunker {
    /// Character windows of `size` chars, a new one starting every `stride` chars.
    pub fn char_windows(size: usize, stride: usize) -> Self {
        let size = size.max(1);
        Self {
            unit: ChunkUnit::Chars,
            chunk_size: size,
            step: stride.clamp(1, size),
        }
    }

    /// Word windows of `size` words, consecutive windows sharing `overlap` words.
    pub fn word_windows(size: usize, overlap: usize) -> Self {
        let size = size.max(1);
        Self {
            unit: ChunkUnit::Words,
            chunk_size: size,
            step: size.saturating_sub(overlap).max(1),
        }
    }

    /// Windows cover the whole text; the last one may be shorter. Empty text
    /// gives no chunks.
    pub fn chunk(&self, text: &str) -> Vec<Chunk> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let chunks = match self.unit {
            ChunkUnit::Chars => self.chunk_chars(text),
            ChunkUnit::Words => self.chunk_words(text),
        };

        debug!(
            unit = ?self.unit,
            chunks = chunks.len(),
            size = self.chunk_size,
            step = self.step,
            "Chunked text"
        );

        chunks
    }

    fn chunk_chars(&self, text: &str) -> Vec<Chunk> {
        let chars: Vec<char> = text.chars().collect();
        self.windows(chars.len(), |start, end| chars[start..end].iter().collect())
    }

    fn chunk_words(&self, text: &str) -> Vec<Chunk> {
        let words: Vec<&str> = text.split_whitespace().collect();
        self.windows(words.len(), |start, end| words[start..end].join(" "))
    }

    fn windows<F>(&self, total: usize, render: F) -> Vec<Chunk>
    where
        F: Fn(usize, usize) -> String,
    {
        let mut chunks = Vec::new();
        let mut start = 0;
        let mut index = 0;

        while start < total {
            let end = (start + self.chunk_size).min(total);

            chunks.push(Chunk {
                index,
                content: render(start, end),
                start_pos: start,
                end_pos: end,
            });

            if end >= total {
                break;
            }

            index += 1;
            start += self.step;
        }

        chunks
    }
}
