//! Retrieval orchestration and answer synthesis
//!
//! [`RagEngine`] ties the pieces together: embed the query, search the
//! store, transform distances into similarity scores, drop weak matches,
//! build the grounded prompt, and synthesize an extractive answer.

use crate::chunk::split_sentences;
use crate::embed::Embedder;
use crate::index::{similarity_score, VectorStore};
use crate::prompt::build_prompt;
use crate::{Result, DEFAULT_MIN_SIMILARITY};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Answer text used when nothing clears the similarity threshold.
pub const NO_ANSWER_TEXT: &str = "No relevant SEBI regulation found in the indexed data.";

/// One retrieved context: a chunk plus its provenance and scores.
///
/// Ephemeral per-query data, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// Retrieved chunk text
    pub chunk_text: String,
    /// Source document title
    pub document_title: String,
    /// Source document category
    pub category: String,
    /// Source document publication date
    pub published_date: NaiveDate,
    /// Source document URL
    pub source_url: String,
    /// Similarity in `(0, 1]`, `1 / (1 + distance)`
    pub similarity_score: f32,
    /// Raw squared-L2 distance, kept for diagnostics
    pub distance: f32,
}

/// Complete outcome of one RAG query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagResult {
    /// The user query, echoed verbatim
    pub query: String,
    /// Synthesized extractive answer
    pub answer: String,
    /// Contexts that cleared the similarity threshold, strongest first
    pub contexts: Vec<SearchResult>,
    /// The full grounded prompt that was assembled
    pub prompt: String,
    /// Number of contexts retained after filtering
    pub sources_found: usize,
}

/// Strategy for turning retrieved contexts into an answer.
///
/// The shipped implementation is extractive; a generative backend can be
/// slotted in without touching retrieval.
pub trait AnswerSynthesizer: Send + Sync {
    /// Produce an answer from the filtered contexts, strongest first.
    fn synthesize(&self, contexts: &[SearchResult]) -> String;
}

/// Extractive synthesizer: quotes the leading sentences of the strongest
/// contexts and tags each snippet with its `[Source N]` citation.
#[derive(Debug, Clone)]
pub struct ExtractiveSynthesizer {
    max_contexts: usize,
    max_sentences: usize,
}

impl ExtractiveSynthesizer {
    /// Synthesizer with the deployed defaults: first 2 sentences of each of
    /// the first 3 contexts.
    pub fn new() -> Self {
        Self {
            max_contexts: 3,
            max_sentences: 2,
        }
    }

    fn first_sentences(&self, text: &str) -> String {
        split_sentences(text)
            .into_iter()
            .take(self.max_sentences)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl Default for ExtractiveSynthesizer {
    fn default() -> Self {
        Self::new()
    }
}

impl AnswerSynthesizer for ExtractiveSynthesizer {
    fn synthesize(&self, contexts: &[SearchResult]) -> String {
        if contexts.is_empty() {
            return NO_ANSWER_TEXT.to_string();
        }

        let mut snippets = Vec::new();
        for (idx, ctx) in contexts.iter().take(self.max_contexts).enumerate() {
            let snippet = self.first_sentences(&ctx.chunk_text);
            if !snippet.is_empty() {
                snippets.push(format!("{snippet} [Source {}]", idx + 1));
            }
        }

        if snippets.is_empty() {
            return NO_ANSWER_TEXT.to_string();
        }

        snippets.join(" ")
    }
}

/// Retrieval engine over a built [`VectorStore`].
///
/// Owns the store and the embedder; the embedder must be the one the store
/// was built with, which the store itself enforces on every search.
pub struct RagEngine<E: Embedder> {
    store: VectorStore,
    embedder: E,
    min_similarity: f32,
    synthesizer: Box<dyn AnswerSynthesizer>,
}

impl<E: Embedder> RagEngine<E> {
    /// Create an engine with the default similarity threshold and the
    /// extractive synthesizer.
    pub fn new(store: VectorStore, embedder: E) -> Self {
        Self {
            store,
            embedder,
            min_similarity: DEFAULT_MIN_SIMILARITY,
            synthesizer: Box::new(ExtractiveSynthesizer::new()),
        }
    }

    /// Override the similarity threshold.
    #[must_use]
    pub fn with_min_similarity(mut self, min_similarity: f32) -> Self {
        self.min_similarity = min_similarity;
        self
    }

    /// Swap in a different answer synthesizer.
    #[must_use]
    pub fn with_synthesizer(mut self, synthesizer: Box<dyn AnswerSynthesizer>) -> Self {
        self.synthesizer = synthesizer;
        self
    }

    /// Configured similarity threshold.
    pub fn min_similarity(&self) -> f32 {
        self.min_similarity
    }

    /// The underlying vector store.
    pub fn store(&self) -> &VectorStore {
        &self.store
    }

    /// Search the store and keep only contexts whose similarity clears the
    /// threshold, preserving the store's strongest-first ordering.
    ///
    /// An empty result is a normal outcome, not an error.
    pub fn retrieve_context(&self, query: &str, top_k: usize) -> Result<Vec<SearchResult>> {
        let hits = self.store.search(query, top_k, &self.embedder)?;

        let mut contexts = Vec::new();
        for (ordinal, distance) in hits {
            let score = similarity_score(distance);
            if score < self.min_similarity {
                continue;
            }
            // Ordinals from search are always in range.
            if let Some(chunk) = self.store.chunk(ordinal) {
                contexts.push(SearchResult {
                    chunk_text: chunk.chunk_text.clone(),
                    document_title: chunk.document_title.clone(),
                    category: chunk.category.clone(),
                    published_date: chunk.published_date,
                    source_url: chunk.source_url.clone(),
                    similarity_score: score,
                    distance,
                });
            }
        }

        tracing::debug!(
            top_k,
            retained = contexts.len(),
            threshold = self.min_similarity,
            "contexts retrieved"
        );

        Ok(contexts)
    }

    /// Run the full pipeline for one query: retrieve, filter, assemble the
    /// prompt, synthesize the answer.
    pub fn query(&self, user_query: &str, top_k: usize) -> Result<RagResult> {
        let contexts = self.retrieve_context(user_query, top_k)?;
        let prompt = build_prompt(user_query, &contexts);
        let answer = self.synthesizer.synthesize(&contexts);

        Ok(RagResult {
            query: user_query.to_string(),
            answer,
            sources_found: contexts.len(),
            contexts,
            prompt,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::Chunk;
    use crate::DocumentMetadata;

    /// Embedder with planted keyword axes, so distances (and therefore
    /// similarity scores) are known exactly. Keyword texts sit on the unit
    /// axes, the administrative chunk at the origin, and keyword-free
    /// queries at the centroid, so nothing accidentally scores 1.0.
    struct PlantedEmbedder;

    impl Embedder for PlantedEmbedder {
        fn embed(&self, text: &str) -> Result<Vec<f32>> {
            let v = if text.contains("disclosure") {
                vec![1.0, 0.0]
            } else if text.contains("insider") {
                vec![0.0, 1.0]
            } else if text.contains("administrative") {
                vec![0.0, 0.0]
            } else {
                vec![0.5, 0.5]
            };
            Ok(v)
        }

        fn dimension(&self) -> usize {
            2
        }

        fn model_id(&self) -> &str {
            "planted"
        }
    }

    fn chunk(id: &str, text: &str) -> Chunk {
        Chunk {
            chunk_id: format!("{id}-chunk-0"),
            document_id: id.to_string(),
            chunk_index: 0,
            chunk_text: text.to_string(),
            document_title: format!("Title {id}"),
            category: "Circular".to_string(),
            published_date: NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
            source_url: format!("https://www.sebi.gov.in/{id}.html"),
            metadata: DocumentMetadata::default(),
        }
    }

    fn planted_engine() -> RagEngine<PlantedEmbedder> {
        let chunks = vec![
            chunk("SEBI-001", "Rules on disclosure of material events. File within a day."),
            chunk("SEBI-002", "Prohibition of insider trading in securities. Heavy penalties."),
            chunk("SEBI-003", "General circular on unrelated administrative matters."),
        ];
        let mut store = VectorStore::new();
        store.build(chunks, &PlantedEmbedder).unwrap();
        RagEngine::new(store, PlantedEmbedder)
    }

    // ============ Threshold Filtering Tests ============

    #[test]
    fn test_default_min_similarity() {
        let engine = planted_engine();
        assert!((engine.min_similarity() - DEFAULT_MIN_SIMILARITY).abs() < f32::EPSILON);
    }

    #[test]
    fn test_retrieve_filters_below_threshold() {
        // "disclosure" query: distance 0 to doc 1 (score 1.0), distance 1 to
        // doc 3 (score 0.5), distance 2 to doc 2 (score 1/3).
        let engine = planted_engine().with_min_similarity(0.4);
        let contexts = engine.retrieve_context("disclosure timelines", 10).unwrap();
        assert_eq!(contexts.len(), 2);
        assert_eq!(contexts[0].document_title, "Title SEBI-001");
        assert!((contexts[0].similarity_score - 1.0).abs() < 1e-6);
        assert!((contexts[1].similarity_score - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_retrieve_keeps_scores_at_threshold() {
        // Score exactly 0.5 must survive a 0.5 threshold (drop only strictly
        // below).
        let engine = planted_engine().with_min_similarity(0.5);
        let contexts = engine.retrieve_context("disclosure timelines", 10).unwrap();
        assert_eq!(contexts.len(), 2);
    }

    #[test]
    fn test_retrieve_empty_result_is_ok() {
        let engine = planted_engine().with_min_similarity(0.99);
        let contexts = engine.retrieve_context("insider dealings", 10).unwrap();
        // Only the exact-keyword match scores 1.0; threshold 0.99 keeps it.
        assert_eq!(contexts.len(), 1);

        let engine = planted_engine().with_min_similarity(0.99);
        let contexts = engine.retrieve_context("completely unrelated", 10).unwrap();
        assert!(contexts.is_empty());
    }

    #[test]
    fn test_retrieve_preserves_strongest_first_order() {
        let engine = planted_engine().with_min_similarity(0.0);
        let contexts = engine.retrieve_context("insider trading query", 10).unwrap();
        for pair in contexts.windows(2) {
            assert!(pair[0].similarity_score >= pair[1].similarity_score);
        }
    }

    #[test]
    fn test_retrieve_respects_top_k() {
        let engine = planted_engine().with_min_similarity(0.0);
        let contexts = engine.retrieve_context("disclosure", 1).unwrap();
        assert_eq!(contexts.len(), 1);
    }

    #[test]
    fn test_retrieve_unbuilt_store_errors() {
        let engine = RagEngine::new(VectorStore::new(), PlantedEmbedder);
        assert!(engine.retrieve_context("anything", 5).is_err());
    }

    // ============ ExtractiveSynthesizer Tests ============

    fn result_with_text(text: &str) -> SearchResult {
        SearchResult {
            chunk_text: text.to_string(),
            document_title: "T".to_string(),
            category: "Circular".to_string(),
            published_date: NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
            source_url: "https://example.test".to_string(),
            similarity_score: 0.8,
            distance: 0.25,
        }
    }

    #[test]
    fn test_synthesizer_empty_contexts() {
        let synth = ExtractiveSynthesizer::new();
        assert_eq!(synth.synthesize(&[]), NO_ANSWER_TEXT);
    }

    #[test]
    fn test_synthesizer_takes_first_two_sentences() {
        let synth = ExtractiveSynthesizer::new();
        let contexts = vec![result_with_text(
            "First sentence here. Second sentence here. Third must not appear.",
        )];
        assert_eq!(
            synth.synthesize(&contexts),
            "First sentence here. Second sentence here. [Source 1]"
        );
    }

    #[test]
    fn test_synthesizer_caps_at_three_contexts() {
        let synth = ExtractiveSynthesizer::new();
        let contexts: Vec<SearchResult> = (1..=5)
            .map(|i| result_with_text(&format!("Snippet number {i}.")))
            .collect();
        let answer = synth.synthesize(&contexts);
        assert!(answer.contains("[Source 1]"));
        assert!(answer.contains("[Source 3]"));
        assert!(!answer.contains("[Source 4]"));
        assert!(!answer.contains("Snippet number 4"));
    }

    #[test]
    fn test_synthesizer_joins_snippets_with_spaces() {
        let synth = ExtractiveSynthesizer::new();
        let contexts = vec![result_with_text("Alpha one."), result_with_text("Beta two.")];
        assert_eq!(
            synth.synthesize(&contexts),
            "Alpha one. [Source 1] Beta two. [Source 2]"
        );
    }

    #[test]
    fn test_synthesizer_all_blank_texts() {
        let synth = ExtractiveSynthesizer::new();
        let contexts = vec![result_with_text("   "), result_with_text("")];
        assert_eq!(synth.synthesize(&contexts), NO_ANSWER_TEXT);
    }

    // ============ Engine Query Tests ============

    #[test]
    fn test_query_assembles_full_result() {
        let engine = planted_engine().with_min_similarity(0.4);
        let result = engine.query("disclosure timelines", 5).unwrap();

        assert_eq!(result.query, "disclosure timelines");
        assert_eq!(result.sources_found, result.contexts.len());
        assert_eq!(result.sources_found, 2);
        assert!(result.prompt.contains("[Source 1]"));
        assert!(result.prompt.contains("USER QUERY: disclosure timelines"));
        assert!(result.answer.contains("[Source 1]"));
        assert!(result.answer.contains("disclosure of material events"));
    }

    #[test]
    fn test_query_no_matches_uses_fallback_texts() {
        let engine = planted_engine().with_min_similarity(0.99);
        let result = engine.query("completely unrelated topic", 5).unwrap();

        assert_eq!(result.sources_found, 0);
        assert!(result.contexts.is_empty());
        assert_eq!(result.answer, NO_ANSWER_TEXT);
        assert!(result
            .prompt
            .contains("I don't have specific SEBI regulations on this topic"));
        assert!(result.prompt.contains("Please try rephrasing your query"));
    }

    #[test]
    fn test_query_deterministic() {
        let engine = planted_engine();
        let a = engine.query("insider trading", 5).unwrap();
        let b = engine.query("insider trading", 5).unwrap();
        assert_eq!(a.answer, b.answer);
        assert_eq!(a.prompt, b.prompt);
        assert_eq!(a.sources_found, b.sources_found);
    }

    #[test]
    fn test_custom_synthesizer_plugs_in() {
        struct Canned;
        impl AnswerSynthesizer for Canned {
            fn synthesize(&self, _contexts: &[SearchResult]) -> String {
                "canned answer".to_string()
            }
        }

        let engine = planted_engine().with_synthesizer(Box::new(Canned));
        let result = engine.query("disclosure", 5).unwrap();
        assert_eq!(result.answer, "canned answer");
    }

    #[test]
    fn test_rag_result_serializes() {
        let engine = planted_engine();
        let result = engine.query("disclosure", 5).unwrap();
        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("\"sources_found\""));
        assert!(json.contains("\"prompt\""));
    }
}
