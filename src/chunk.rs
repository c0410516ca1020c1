//! Sentence-window chunking for regulatory documents

use crate::{Document, DocumentMetadata};
use crate::{Error, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A contiguous window of sentences from one document, ready for indexing.
///
/// Chunks are never mutated after creation; a corpus change means a full
/// re-chunk and re-index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Deterministic identifier, `{document_id}-chunk-{index}`
    pub chunk_id: String,
    /// Source document reference
    pub document_id: String,
    /// 0-based position of this chunk within its document
    pub chunk_index: usize,
    /// Window text
    pub chunk_text: String,
    /// Source document title
    pub document_title: String,
    /// Source document category
    pub category: String,
    /// Source document publication date
    pub published_date: NaiveDate,
    /// Source document URL
    pub source_url: String,
    /// Metadata inherited from the document
    pub metadata: DocumentMetadata,
}

impl Chunk {
    /// Number of whitespace-separated words in the chunk text.
    pub fn word_count(&self) -> usize {
        self.chunk_text.split_whitespace().count()
    }

    /// Check if the chunk text is empty.
    pub fn is_empty(&self) -> bool {
        self.chunk_text.is_empty()
    }
}

/// Split text into sentences.
///
/// A sentence boundary is `.`, `!` or `?` followed by whitespace or end of
/// input. This is a best-effort heuristic: abbreviations like "Mr." and
/// decimal numbers are mis-split. Chunk boundaries, and therefore chunk ids,
/// are only stable across corpus versions as long as this heuristic is
/// unchanged.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;

    for (i, c) in text.char_indices() {
        if c == '.' || c == '!' || c == '?' {
            let next_char = text[i + c.len_utf8()..].chars().next();
            if next_char.map_or(true, char::is_whitespace) {
                let end = i + c.len_utf8();
                let sentence = text[start..end].trim();
                if !sentence.is_empty() {
                    sentences.push(sentence);
                }
                start = end;
            }
        }
    }

    let remaining = text[start..].trim();
    if !remaining.is_empty() {
        sentences.push(remaining);
    }

    sentences
}

/// Sentence-window chunker with word-budget windows and word-budget overlap.
///
/// Sentences accumulate into a window until adding the next one would exceed
/// `max_words`; the window is then emitted and the next window is seeded with
/// the trailing sentences of the previous one, as many as fit within
/// `overlap_words`. A single sentence longer than `max_words` is emitted as
/// its own oversized chunk rather than split mid-sentence.
#[derive(Debug, Clone)]
pub struct SentenceWindowChunker {
    max_words: usize,
    overlap_words: usize,
}

impl SentenceWindowChunker {
    /// Create a chunker. Fails if `overlap_words >= max_words`, which could
    /// never make forward progress.
    pub fn new(max_words: usize, overlap_words: usize) -> Result<Self> {
        if overlap_words >= max_words {
            return Err(Error::InvalidChunking {
                max_words,
                overlap_words,
            });
        }
        Ok(Self {
            max_words,
            overlap_words,
        })
    }

    /// Chunker with the production defaults (500-word windows, 100-word
    /// overlap).
    pub fn with_defaults() -> Self {
        Self {
            max_words: crate::DEFAULT_MAX_WORDS,
            overlap_words: crate::DEFAULT_OVERLAP_WORDS,
        }
    }

    /// Configured window budget in words.
    pub fn max_words(&self) -> usize {
        self.max_words
    }

    /// Configured overlap budget in words.
    pub fn overlap_words(&self) -> usize {
        self.overlap_words
    }

    /// Split raw text into overlapping sentence windows.
    ///
    /// Empty or whitespace-only input yields no chunks. The final partial
    /// window is always emitted.
    pub fn chunk(&self, text: &str) -> Vec<String> {
        let sentences = split_sentences(text);
        let mut chunks = Vec::new();
        let mut window: Vec<&str> = Vec::new();
        let mut window_words = 0usize;

        for sentence in sentences {
            let words = sentence.split_whitespace().count();

            if !window.is_empty() && window_words + words > self.max_words {
                chunks.push(window.join(" "));
                let (suffix, suffix_words) = self.overlap_suffix(&window);
                window = suffix;
                window_words = suffix_words;
            }

            window.push(sentence);
            window_words += words;
        }

        if !window.is_empty() {
            chunks.push(window.join(" "));
        }

        chunks
    }

    /// Trailing sentences of `window` whose combined word count fits within
    /// the overlap budget, oldest first.
    fn overlap_suffix<'a>(&self, window: &[&'a str]) -> (Vec<&'a str>, usize) {
        let mut suffix = Vec::new();
        let mut total = 0usize;

        for sentence in window.iter().rev() {
            let words = sentence.split_whitespace().count();
            if total + words > self.overlap_words {
                break;
            }
            suffix.push(*sentence);
            total += words;
        }

        suffix.reverse();
        (suffix, total)
    }

    /// Chunk every document and stamp each window with its provenance.
    ///
    /// Chunk ids are deterministic (`{document_id}-chunk-{index}`), so the
    /// same corpus always produces the same ids.
    pub fn create_chunks_with_metadata(&self, documents: &[Document]) -> Vec<Chunk> {
        let mut chunks = Vec::new();

        for document in documents {
            for (chunk_index, chunk_text) in self.chunk(&document.content).into_iter().enumerate() {
                chunks.push(Chunk {
                    chunk_id: format!("{}-chunk-{}", document.id, chunk_index),
                    document_id: document.id.clone(),
                    chunk_index,
                    chunk_text,
                    document_title: document.title.clone(),
                    category: document.category.clone(),
                    published_date: document.published_date,
                    source_url: document.source_url.clone(),
                    metadata: document.metadata.clone(),
                });
            }
        }

        chunks
    }
}

impl Default for SentenceWindowChunker {
    fn default() -> Self {
        Self::with_defaults()
    }
}
