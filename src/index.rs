//! Flat vector index with exact L2 nearest-neighbor search
//!
//! The index is a brute-force scan over every stored vector. Exact search
//! keeps retrieval deterministic and is comfortably fast at regulatory-corpus
//! scale (hundreds of documents, thousands of chunks).

use crate::chunk::Chunk;
use crate::embed::Embedder;
use crate::{DocumentMetadata, Error, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Batch size for corpus embedding. Affects throughput only; the resulting
/// vectors are identical for any batch size.
const EMBED_BATCH_SIZE: usize = 32;

/// Map a squared-L2 distance to a similarity score in `(0, 1]`.
///
/// `1.0` means an exact vector match; the score decays monotonically as
/// distance grows. This is the one and only scoring transform in the system,
/// and the retrieval threshold is calibrated against it.
pub fn similarity_score(distance: f32) -> f32 {
    1.0 / (1.0 + distance)
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// Built index state: vectors and chunks are parallel arrays keyed by
/// ordinal, plus the embedding model that produced the vectors.
#[derive(Debug)]
struct FlatIndex {
    dimension: usize,
    model_id: String,
    vectors: Vec<Vec<f32>>,
    chunks: Vec<Chunk>,
}

/// Vector file payload. The chunk table travels separately as CSV.
#[derive(Serialize, Deserialize)]
struct PersistedVectors {
    model_id: String,
    dimension: usize,
    data: Vec<f32>,
}

/// Flat CSV row form of a [`Chunk`]; `metadata` is JSON-encoded into a
/// single column because CSV cannot nest.
#[derive(Serialize, Deserialize)]
struct ChunkRow {
    chunk_id: String,
    document_id: String,
    chunk_index: usize,
    chunk_text: String,
    document_title: String,
    category: String,
    published_date: NaiveDate,
    source_url: String,
    metadata: String,
}

impl ChunkRow {
    fn from_chunk(chunk: &Chunk) -> Result<Self> {
        Ok(Self {
            chunk_id: chunk.chunk_id.clone(),
            document_id: chunk.document_id.clone(),
            chunk_index: chunk.chunk_index,
            chunk_text: chunk.chunk_text.clone(),
            document_title: chunk.document_title.clone(),
            category: chunk.category.clone(),
            published_date: chunk.published_date,
            source_url: chunk.source_url.clone(),
            metadata: serde_json::to_string(&chunk.metadata)?,
        })
    }

    fn into_chunk(self) -> Result<Chunk> {
        let metadata: DocumentMetadata = serde_json::from_str(&self.metadata)?;
        Ok(Chunk {
            chunk_id: self.chunk_id,
            document_id: self.document_id,
            chunk_index: self.chunk_index,
            chunk_text: self.chunk_text,
            document_title: self.document_title,
            category: self.category,
            published_date: self.published_date,
            source_url: self.source_url,
            metadata,
        })
    }
}

/// Embedding index over a chunked corpus.
///
/// Starts empty; [`VectorStore::build`] or [`VectorStore::load`] must run
/// before [`VectorStore::search`]. Search takes `&self` so concurrent
/// readers are safe; build takes `&mut self` so a rebuild excludes readers
/// for its duration, and the replacement index is fully constructed before
/// it is swapped in.
#[derive(Debug, Default)]
pub struct VectorStore {
    index: Option<FlatIndex>,
}

impl VectorStore {
    /// Create an empty, unbuilt store.
    pub fn new() -> Self {
        Self { index: None }
    }

    /// Whether the store has been built or loaded.
    pub fn is_built(&self) -> bool {
        self.index.is_some()
    }

    /// Number of indexed chunks (0 before build).
    pub fn len(&self) -> usize {
        self.index.as_ref().map_or(0, |idx| idx.chunks.len())
    }

    /// Whether the store holds no vectors.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Embedding dimension, once built.
    pub fn dimension(&self) -> Option<usize> {
        self.index.as_ref().map(|idx| idx.dimension)
    }

    /// Model id recorded at build time, once built.
    pub fn model_id(&self) -> Option<&str> {
        self.index.as_ref().map(|idx| idx.model_id.as_str())
    }

    /// Chunk at the given search ordinal.
    pub fn chunk(&self, ordinal: usize) -> Option<&Chunk> {
        self.index.as_ref().and_then(|idx| idx.chunks.get(ordinal))
    }

    /// Embed every chunk and (re)build the index wholesale.
    ///
    /// The previous index, if any, stays in place until the replacement is
    /// fully constructed. Fails on an empty chunk set, on a declared
    /// dimension of zero, and on any embedding that does not match the
    /// embedder's declared dimension.
    pub fn build<E: Embedder>(&mut self, chunks: Vec<Chunk>, embedder: &E) -> Result<()> {
        if chunks.is_empty() {
            return Err(Error::EmptyCorpus);
        }

        let dimension = embedder.dimension();
        // A dim-0 store would persist fine but be rejected on load.
        if dimension == 0 {
            return Err(Error::Embedding(format!(
                "embedder '{}' declares dimension 0",
                embedder.model_id()
            )));
        }
        let mut vectors = Vec::with_capacity(chunks.len());

        for batch in chunks.chunks(EMBED_BATCH_SIZE) {
            let texts: Vec<&str> = batch.iter().map(|c| c.chunk_text.as_str()).collect();
            for vector in embedder.embed_batch(&texts)? {
                if vector.len() != dimension {
                    return Err(Error::DimensionMismatch {
                        expected: dimension,
                        actual: vector.len(),
                    });
                }
                vectors.push(vector);
            }
        }

        if vectors.len() != chunks.len() {
            return Err(Error::Embedding(format!(
                "embedder returned {} vectors for {} chunks",
                vectors.len(),
                chunks.len()
            )));
        }

        tracing::info!(
            chunks = chunks.len(),
            dimension,
            model = embedder.model_id(),
            "vector index built"
        );

        self.index = Some(FlatIndex {
            dimension,
            model_id: embedder.model_id().to_string(),
            vectors,
            chunks,
        });

        Ok(())
    }

    /// Exact nearest-neighbor search for a text query.
    ///
    /// Returns at most `top_k` `(ordinal, squared_l2_distance)` pairs in
    /// ascending distance order, ties broken by ordinal so equal-distance
    /// results always come back in indexing order. Requires the same
    /// embedding model the index was built with.
    pub fn search<E: Embedder>(
        &self,
        query: &str,
        top_k: usize,
        embedder: &E,
    ) -> Result<Vec<(usize, f32)>> {
        let index = self.index.as_ref().ok_or(Error::NotBuilt)?;

        if embedder.model_id() != index.model_id {
            return Err(Error::ModelMismatch {
                built_with: index.model_id.clone(),
                queried_with: embedder.model_id().to_string(),
            });
        }

        let query_vector = embedder.embed(query)?;
        if query_vector.len() != index.dimension {
            return Err(Error::DimensionMismatch {
                expected: index.dimension,
                actual: query_vector.len(),
            });
        }

        let mut hits: Vec<(usize, f32)> = index
            .vectors
            .iter()
            .enumerate()
            .map(|(ordinal, vector)| (ordinal, squared_l2(&query_vector, vector)))
            .collect();

        hits.sort_by(|a, b| {
            a.1.partial_cmp(&b.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        hits.truncate(top_k);

        tracing::debug!(top_k, returned = hits.len(), "index searched");

        Ok(hits)
    }

    /// Persist the index: vectors to a bincode file, chunks to a CSV table.
    pub fn save(&self, index_path: &Path, chunks_path: &Path) -> Result<()> {
        let index = self.index.as_ref().ok_or(Error::NotBuilt)?;

        let persisted = PersistedVectors {
            model_id: index.model_id.clone(),
            dimension: index.dimension,
            data: index.vectors.iter().flatten().copied().collect(),
        };
        std::fs::write(index_path, bincode::serialize(&persisted)?)?;

        let mut writer = csv::Writer::from_path(chunks_path)?;
        for chunk in &index.chunks {
            writer.serialize(ChunkRow::from_chunk(chunk)?)?;
        }
        writer.flush()?;

        tracing::info!(
            chunks = index.chunks.len(),
            index_path = %index_path.display(),
            chunks_path = %chunks_path.display(),
            "vector index persisted"
        );

        Ok(())
    }

    /// Load a persisted index.
    ///
    /// Validates that the flat vector buffer divides evenly by its recorded
    /// dimension and that vector count matches the chunk row count; either
    /// mismatch means the two files are out of step and the load is refused.
    pub fn load(index_path: &Path, chunks_path: &Path) -> Result<Self> {
        let persisted: PersistedVectors = bincode::deserialize(&std::fs::read(index_path)?)?;

        if persisted.dimension == 0 {
            return Err(Error::CorruptIndex(
                "persisted dimension is zero".to_string(),
            ));
        }
        if persisted.data.len() % persisted.dimension != 0 {
            return Err(Error::CorruptIndex(format!(
                "vector buffer of {} floats does not divide by dimension {}",
                persisted.data.len(),
                persisted.dimension
            )));
        }

        let vectors: Vec<Vec<f32>> = persisted
            .data
            .chunks(persisted.dimension)
            .map(<[f32]>::to_vec)
            .collect();

        let mut chunks = Vec::new();
        let mut reader = csv::Reader::from_path(chunks_path)?;
        for row in reader.deserialize::<ChunkRow>() {
            chunks.push(row?.into_chunk()?);
        }

        if vectors.len() != chunks.len() {
            return Err(Error::CorruptIndex(format!(
                "{} vectors but {} chunk rows",
                vectors.len(),
                chunks.len()
            )));
        }
        if chunks.is_empty() {
            return Err(Error::CorruptIndex("persisted index is empty".to_string()));
        }

        tracing::info!(
            chunks = chunks.len(),
            dimension = persisted.dimension,
            model = %persisted.model_id,
            "vector index loaded"
        );

        Ok(Self {
            index: Some(FlatIndex {
                dimension: persisted.dimension,
                model_id: persisted.model_id,
                vectors,
                chunks,
            }),
        })
    }
}
