//! Embedding backends for the retrieval core
//!
//! The index and the engine are generic over [`Embedder`]; the same model
//! must embed both the corpus and the queries, and the store enforces that
//! through [`Embedder::model_id`].

use crate::{Error, Result};

/// Trait for text embedding backends.
pub trait Embedder: Send + Sync {
    /// Embed a single text.
    fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Batch embed multiple texts.
    ///
    /// Batching is a throughput knob only; results are identical to calling
    /// [`Embedder::embed`] per text.
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.embed(t)).collect()
    }

    /// Embedding dimension.
    fn dimension(&self) -> usize;

    /// Stable model identifier, recorded by the index at build time.
    fn model_id(&self) -> &str;
}

/// Deterministic hash-based embedder for tests and offline smoke runs.
///
/// Vectors carry no semantics; identical texts map to identical vectors,
/// which is all the retrieval invariants need.
#[derive(Debug, Clone)]
pub struct MockEmbedder {
    dimension: usize,
    model_id: String,
}

impl MockEmbedder {
    /// Create a mock embedder producing unit vectors of the given dimension.
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            model_id: "mock-embedder".to_string(),
        }
    }

    /// Override the reported model id.
    #[must_use]
    pub fn with_model_id(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = model_id.into();
        self
    }

    fn hash_to_vector(&self, text: &str) -> Vec<f32> {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut vector = Vec::with_capacity(self.dimension);
        let mut hasher = DefaultHasher::new();

        for i in 0..self.dimension {
            text.hash(&mut hasher);
            i.hash(&mut hasher);
            let hash = hasher.finish();
            let value = (hash as f32 / u64::MAX as f32) * 2.0 - 1.0;
            vector.push(value);
        }

        normalize_vector(&mut vector);
        vector
    }
}

impl Embedder for MockEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.hash_to_vector(text))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

fn normalize_vector(vector: &mut [f32]) {
    let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in vector.iter_mut() {
            *x /= norm;
        }
    }
}

/// TF-IDF embedder: trainable on the corpus, no model downloads.
///
/// Vocabulary is the top `dimension` terms by document frequency, ties
/// broken alphabetically so that refitting on the same corpus reproduces
/// the same embedding space.
#[derive(Debug, Clone)]
pub struct TfIdfEmbedder {
    dimension: usize,
    vocabulary: std::collections::HashMap<String, usize>,
    idf: Vec<f32>,
}

impl TfIdfEmbedder {
    /// Create an untrained TF-IDF embedder. Call [`TfIdfEmbedder::fit`]
    /// before embedding.
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            vocabulary: std::collections::HashMap::new(),
            idf: Vec::new(),
        }
    }

    /// Whether `fit` has been called.
    pub fn is_fitted(&self) -> bool {
        !self.vocabulary.is_empty()
    }

    /// Train the embedder on a corpus.
    pub fn fit(&mut self, documents: &[&str]) {
        use std::collections::{HashMap, HashSet};

        let mut doc_freq: HashMap<String, usize> = HashMap::new();

        for doc in documents {
            let terms: HashSet<String> = doc.split_whitespace().map(str::to_lowercase).collect();
            for term in terms {
                *doc_freq.entry(term).or_insert(0) += 1;
            }
        }

        let mut terms: Vec<String> = doc_freq.keys().cloned().collect();
        terms.sort_by(|a, b| doc_freq[b].cmp(&doc_freq[a]).then_with(|| a.cmp(b)));
        terms.truncate(self.dimension);

        let n = documents.len() as f32;
        self.idf = terms
            .iter()
            .map(|t| {
                let df = doc_freq.get(t).copied().unwrap_or(1) as f32;
                (n / df).ln() + 1.0
            })
            .collect();

        self.vocabulary = terms
            .into_iter()
            .enumerate()
            .map(|(i, t)| (t, i))
            .collect();
    }

    fn compute_tf(&self, text: &str) -> Vec<f32> {
        let mut tf = vec![0.0f32; self.dimension];
        let terms: Vec<String> = text.split_whitespace().map(str::to_lowercase).collect();
        let total = terms.len() as f32;

        for term in terms {
            if let Some(&idx) = self.vocabulary.get(&term) {
                tf[idx] += 1.0 / total;
            }
        }

        tf
    }
}

impl Embedder for TfIdfEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if self.vocabulary.is_empty() {
            return Err(Error::Embedding(
                "tf-idf embedder not fitted: call fit() on the corpus first".to_string(),
            ));
        }

        let tf = self.compute_tf(text);
        let mut tfidf: Vec<f32> = tf.iter().zip(self.idf.iter()).map(|(t, i)| t * i).collect();
        tfidf.resize(self.dimension, 0.0);
        normalize_vector(&mut tfidf);
        Ok(tfidf)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_id(&self) -> &str {
        "tfidf"
    }
}

/// Boxed embedders work wherever the concrete type does, so callers can
/// pick a backend at runtime.
impl<E: Embedder + ?Sized> Embedder for Box<E> {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        (**self).embed(text)
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        (**self).embed_batch(texts)
    }

    fn dimension(&self) -> usize {
        (**self).dimension()
    }

    fn model_id(&self) -> &str {
        (**self).model_id()
    }
}

/// Blanket impl so engines can borrow an embedder.
impl<E: Embedder + ?Sized> Embedder for &E {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        (**self).embed(text)
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        (**self).embed_batch(texts)
    }

    fn dimension(&self) -> usize {
        (**self).dimension()
    }

    fn model_id(&self) -> &str {
        (**self).model_id()
    }
}

// ============================================================================
// FastEmbed-based Embedder (production semantic embeddings)
// ============================================================================

/// Available embedding models when the `embeddings` feature is enabled
#[cfg(feature = "embeddings")]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingModelType {
    /// all-MiniLM-L6-v2: fast, good quality (384 dims). The production
    /// default.
    AllMiniLmL6V2,
    /// all-MiniLM-L12-v2: better quality, slightly slower (384 dims)
    AllMiniLmL12V2,
    /// BGE-small-en-v1.5: balanced performance (384 dims)
    BgeSmallEnV15,
}

#[cfg(feature = "embeddings")]
impl Default for EmbeddingModelType {
    fn default() -> Self {
        Self::AllMiniLmL6V2
    }
}

#[cfg(feature = "embeddings")]
impl EmbeddingModelType {
    fn to_fastembed_model(self) -> fastembed::EmbeddingModel {
        match self {
            Self::AllMiniLmL6V2 => fastembed::EmbeddingModel::AllMiniLML6V2,
            Self::AllMiniLmL12V2 => fastembed::EmbeddingModel::AllMiniLML12V2,
            Self::BgeSmallEnV15 => fastembed::EmbeddingModel::BGESmallENV15,
        }
    }

    /// Embedding dimension for this model
    pub const fn dimension(self) -> usize {
        match self {
            Self::AllMiniLmL6V2 | Self::AllMiniLmL12V2 | Self::BgeSmallEnV15 => 384,
        }
    }

    /// Human-readable model name, also the index's recorded `model_id`
    pub const fn model_name(self) -> &'static str {
        match self {
            Self::AllMiniLmL6V2 => "sentence-transformers/all-MiniLM-L6-v2",
            Self::AllMiniLmL12V2 => "sentence-transformers/all-MiniLM-L12-v2",
            Self::BgeSmallEnV15 => "BAAI/bge-small-en-v1.5",
        }
    }
}

/// Semantic embedder backed by fastembed (ONNX Runtime).
///
/// Requires the `embeddings` feature. Downloads the model on first use if
/// not cached.
#[cfg(feature = "embeddings")]
pub struct FastEmbedder {
    model: fastembed::TextEmbedding,
    model_type: EmbeddingModelType,
}

#[cfg(feature = "embeddings")]
impl std::fmt::Debug for FastEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FastEmbedder")
            .field("model_type", &self.model_type)
            .field("dimension", &self.model_type.dimension())
            .finish_non_exhaustive()
    }
}

#[cfg(feature = "embeddings")]
impl FastEmbedder {
    /// Create a new embedder with the specified model.
    pub fn new(model_type: EmbeddingModelType) -> Result<Self> {
        let options = fastembed::InitOptions::new(model_type.to_fastembed_model())
            .with_show_download_progress(true);

        let model = fastembed::TextEmbedding::try_new(options)
            .map_err(|e| Error::Embedding(format!("failed to initialize model: {e}")))?;

        Ok(Self { model, model_type })
    }

    /// Create with the default model (all-MiniLM-L6-v2).
    pub fn default_model() -> Result<Self> {
        Self::new(EmbeddingModelType::default())
    }

    /// The configured model type.
    pub fn model_type(&self) -> EmbeddingModelType {
        self.model_type
    }
}

#[cfg(feature = "embeddings")]
impl Embedder for FastEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let embeddings = self
            .model
            .embed(vec![text], None)
            .map_err(|e| Error::Embedding(format!("embedding failed: {e}")))?;

        embeddings
            .into_iter()
            .next()
            .ok_or_else(|| Error::Embedding("no embedding returned".to_string()))
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        self.model
            .embed(texts.to_vec(), None)
            .map_err(|e| Error::Embedding(format!("batch embedding failed: {e}")))
    }

    fn dimension(&self) -> usize {
        self.model_type.dimension()
    }

    fn model_id(&self) -> &str {
        self.model_type.model_name()
    }
}
