//! Splits source documents into overlapping passages for ingestion.

use crate::core::config::IngestConfig;

/// A passage cut from a source document, ready for embedding.
#[derive(Debug, Clone)]
pub struct PassageDraft {
    pub text: String,
    pub source: String,
    pub chunk_index: usize,
    pub start_offset: usize,
}

pub struct Chunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl Chunker {
    pub fn new(config: &IngestConfig) -> Self {
        Self {
            chunk_size: config.chunk_size.max(1),
            chunk_overlap: config.chunk_overlap.min(config.chunk_size.saturating_sub(1)),
        }
    }

    /// Split text into overlapping character windows.
    ///
    /// Offsets are in characters, not bytes, so multi-byte text slices
    /// cleanly.
    pub fn split(&self, text: &str, source: &str) -> Vec<PassageDraft> {
        let chars: Vec<char> = text.chars().collect();
        let total_chars = chars.len();

        let mut chunks = Vec::new();
        if total_chars == 0 {
            return chunks;
        }

        let step = self.chunk_size.saturating_sub(self.chunk_overlap).max(1);
        let mut start = 0;
        let mut chunk_index = 0;

        while start < total_chars {
            let end = (start + self.chunk_size).min(total_chars);
            let chunk_text: String = chars[start..end].iter().collect();
            let trimmed = chunk_text.trim();

            if !trimmed.is_empty() {
                chunks.push(PassageDraft {
                    text: trimmed.to_string(),
                    source: source.to_string(),
                    chunk_index,
                    start_offset: start,
                });
                chunk_index += 1;
            }

            if end == total_chars {
                break;
            }
            start += step;
        }

        chunks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunker(size: usize, overlap: usize) -> Chunker {
        Chunker::new(&IngestConfig {
            chunk_size: size,
            chunk_overlap: overlap,
        })
    }

    #[test]
    fn short_text_is_a_single_chunk() {
        let chunks = chunker(100, 20).split("hello world", "doc.txt");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "hello world");
        assert_eq!(chunks[0].source, "doc.txt");
        assert_eq!(chunks[0].chunk_index, 0);
    }

    #[test]
    fn consecutive_chunks_overlap() {
        let text = "abcdefghij".repeat(5);
        let chunks = chunker(20, 5).split(&text, "doc.txt");

        assert!(chunks.len() > 1);
        for pair in chunks.windows(2) {
            let step = pair[1].start_offset - pair[0].start_offset;
            assert_eq!(step, 15);
        }
        // Tail of one chunk reappears at the head of the next.
        let first_tail: String = chunks[0].text.chars().skip(15).collect();
        assert!(chunks[1].text.starts_with(&first_tail));
    }

    #[test]
    fn empty_text_yields_nothing() {
        assert!(chunker(100, 20).split("", "doc.txt").is_empty());
    }

    #[test]
    fn whitespace_only_windows_are_skipped() {
        let text = format!("words{}more", " ".repeat(40));
        let chunks = chunker(10, 0).split(&text, "doc.txt");
        assert!(chunks.iter().all(|c| !c.text.trim().is_empty()));
    }

    #[test]
    fn multibyte_text_splits_on_char_boundaries() {
        let text = "こんにちは世界".repeat(10);
        let chunks = chunker(16, 4).split(&text, "doc.txt");
        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| c.text.chars().count() <= 16));
    }
}
