//! Error types for the FinComply retrieval core

use thiserror::Error;

/// Result type for FinComply RAG operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the retrieval pipeline
///
/// Finding nothing above the similarity threshold is *not* an error: it is
/// an ordinary empty result that downstream code renders as a "not found"
/// message. Everything here is fatal for the operation that raised it.
#[derive(Error, Debug)]
pub enum Error {
    /// Chunking parameters that cannot make progress
    #[error("invalid chunking: overlap ({overlap_words} words) must be smaller than chunk size ({max_words} words)")]
    InvalidChunking {
        /// Configured chunk size in words
        max_words: usize,
        /// Configured overlap in words
        overlap_words: usize,
    },

    /// Empty chunk batch passed to an index build
    #[error("cannot build index from an empty chunk set")]
    EmptyCorpus,

    /// Embedding dimension mismatch
    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension
        expected: usize,
        /// Actual dimension
        actual: usize,
    },

    /// Query embedded with a different model than the index was built with
    #[error("embedding model mismatch: index built with '{built_with}', queried with '{queried_with}'")]
    ModelMismatch {
        /// Model id recorded at build time
        built_with: String,
        /// Model id of the embedder passed to search
        queried_with: String,
    },

    /// Search attempted before the index was built or loaded
    #[error("index not built: call build() or load() first")]
    NotBuilt,

    /// Persisted index unreadable or inconsistent with its chunk table
    #[error("corrupt index: {0}")]
    CorruptIndex(String),

    /// Embedding computation failure
    #[error("embedding error: {0}")]
    Embedding(String),

    /// Serialization error (serde_json)
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Chunk table error (csv)
    #[error("chunk table error: {0}")]
    ChunkTable(#[from] csv::Error),

    /// Binary index codec error (bincode)
    #[error("index codec error: {0}")]
    IndexCodec(#[from] bincode::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_invalid_chunking() {
        let err = Error::InvalidChunking {
            max_words: 100,
            overlap_words: 100,
        };
        assert_eq!(
            err.to_string(),
            "invalid chunking: overlap (100 words) must be smaller than chunk size (100 words)"
        );
    }

    #[test]
    fn test_error_display_dimension_mismatch() {
        let err = Error::DimensionMismatch {
            expected: 384,
            actual: 768,
        };
        assert_eq!(
            err.to_string(),
            "embedding dimension mismatch: expected 384, got 768"
        );
    }

    #[test]
    fn test_error_display_not_built() {
        assert_eq!(
            Error::NotBuilt.to_string(),
            "index not built: call build() or load() first"
        );
    }

    #[test]
    fn test_error_display_model_mismatch() {
        let err = Error::ModelMismatch {
            built_with: "tfidf".to_string(),
            queried_with: "mock-embedder".to_string(),
        };
        assert!(err.to_string().contains("tfidf"));
        assert!(err.to_string().contains("mock-embedder"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = Error::from(io_err);
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_result_type() {
        fn may_fail(succeed: bool) -> Result<i32> {
            if succeed {
                Ok(42)
            } else {
                Err(Error::EmptyCorpus)
            }
        }

        assert_eq!(may_fail(true).unwrap(), 42);
        assert!(may_fail(false).is_err());
    }
}
