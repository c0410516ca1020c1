//! FinComply-RAG: Retrieval Core for SEBI Compliance Documents
//!
//! This crate retrieves topically relevant passages from a corpus of
//! regulatory documents and assembles them into a grounded, citation-carrying
//! prompt plus an extractive answer. It covers the retrieval core only:
//! sentence-window chunking, vector indexing with exact L2 nearest-neighbor
//! search, threshold filtering, and deterministic prompt/answer assembly.
//! HTTP framing and document ingestion live outside this crate.
//!
//! # Quick Start
//!
//! ```rust
//! use fincomply_rag::{
//!     chunk::SentenceWindowChunker,
//!     embed::MockEmbedder,
//!     index::VectorStore,
//!     rag::RagEngine,
//!     Document,
//! };
//!
//! let doc = Document::synthetic_example();
//! let chunker = SentenceWindowChunker::new(500, 100).unwrap();
//! let chunks = chunker.create_chunks_with_metadata(&[doc]);
//!
//! let embedder = MockEmbedder::new(64);
//! let mut store = VectorStore::new();
//! store.build(chunks, &embedder).unwrap();
//!
//! let engine = RagEngine::new(store, embedder);
//! let result = engine.query("disclosure requirements", 5).unwrap();
//! assert_eq!(result.sources_found, result.contexts.len());
//! ```
//!
//! # Design constraints
//!
//! - One scoring function: `similarity_score(d) = 1 / (1 + d)` over squared
//!   L2 distance. No re-ranking, no hybrid lexical scoring.
//! - The index is rebuilt wholesale; there is no incremental add/remove.
//! - Build and search must use the same embedding model; the store records
//!   the model id and rejects a mismatched embedder.
//! - An empty retrieval result is a first-class outcome, not an error.

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::must_use_candidate)]

pub mod chunk;
pub mod embed;
pub mod error;
pub mod index;
pub mod prompt;
pub mod rag;
pub mod service;

pub use chunk::{Chunk, SentenceWindowChunker};
pub use embed::{Embedder, MockEmbedder, TfIdfEmbedder};
#[cfg(feature = "embeddings")]
pub use embed::{EmbeddingModelType, FastEmbedder};
pub use error::{Error, Result};
pub use index::{similarity_score, VectorStore};
pub use rag::{AnswerSynthesizer, ExtractiveSynthesizer, RagEngine, RagResult, SearchResult};
pub use service::{ComplianceService, ContextSummary, QuestionAnswer};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Default number of search results requested per query.
pub const DEFAULT_TOP_K: usize = 5;
/// Default minimum similarity a result must clear to count as context.
///
/// Inherited from the production deployment without a documented sweep;
/// treat it as a tunable, not an optimum.
pub const DEFAULT_MIN_SIMILARITY: f32 = 0.3;
/// Default chunk size budget in words.
pub const DEFAULT_MAX_WORDS: usize = 500;
/// Default chunk overlap budget in words.
pub const DEFAULT_OVERLAP_WORDS: usize = 100;

/// Free-form document metadata carried through to every chunk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    /// Regulator's reference number, e.g. `SEBI/HO/IMD/12/2024`
    pub regulation_number: String,
    /// Keyword list for the document
    pub keywords: Vec<String>,
    /// Word count of the raw content
    pub word_count: usize,
}

/// A regulatory document to be chunked and indexed.
///
/// Produced by an external ingestion pipeline or the fixture generator;
/// immutable once handed to this crate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Stable unique identifier, e.g. `SEBI-042`
    pub id: String,
    /// Document title
    pub title: String,
    /// Category label (Circular, Notification, ...)
    pub category: String,
    /// Regulatory topic
    pub topic: String,
    /// Publication date
    pub published_date: NaiveDate,
    /// Canonical source URL
    pub source_url: String,
    /// Raw text body
    pub content: String,
    /// Source format, e.g. `PDF` or `HTML`
    pub document_type: String,
    /// Keyword list, regulation number, word count
    pub metadata: DocumentMetadata,
}

impl Document {
    /// A small fixed document, handy for doctests and smoke tests.
    pub fn synthetic_example() -> Self {
        let content = "All listed entities must disclose material events within 24 hours. \
                       Compliance officers shall file quarterly reports through the online portal. \
                       Non-compliance attracts monetary penalties under the SEBI Act."
            .to_string();
        let word_count = content.split_whitespace().count();
        Self {
            id: "SEBI-001".to_string(),
            title: "Circular on Disclosure Requirements".to_string(),
            category: "Circular".to_string(),
            topic: "Disclosure Requirements".to_string(),
            published_date: NaiveDate::from_ymd_opt(2024, 3, 15).expect("valid date"),
            source_url: "https://www.sebi.gov.in/legal/circulars/1.html".to_string(),
            content,
            document_type: "HTML".to_string(),
            metadata: DocumentMetadata {
                regulation_number: "SEBI/HO/IMD/1/2024".to_string(),
                keywords: vec![
                    "Disclosure Requirements".to_string(),
                    "Circular".to_string(),
                    "compliance".to_string(),
                ],
                word_count,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_serialization_round_trip() {
        let doc = Document::synthetic_example();
        let json = serde_json::to_string(&doc).unwrap();
        let restored: Document = serde_json::from_str(&json).unwrap();

        assert_eq!(doc.id, restored.id);
        assert_eq!(doc.published_date, restored.published_date);
        assert_eq!(doc.metadata, restored.metadata);
    }

    #[test]
    fn test_synthetic_example_word_count() {
        let doc = Document::synthetic_example();
        assert_eq!(
            doc.metadata.word_count,
            doc.content.split_whitespace().count()
        );
    }

    #[test]
    fn test_defaults_are_sane() {
        assert!(DEFAULT_MIN_SIMILARITY > 0.0 && DEFAULT_MIN_SIMILARITY < 1.0);
        assert!(DEFAULT_OVERLAP_WORDS < DEFAULT_MAX_WORDS);
        assert!(DEFAULT_TOP_K > 0);
    }
}
