//! Service boundary: the three request-level operations
//!
//! [`ComplianceService`] is a plain dependency-injected object over a
//! [`RagEngine`], with no transport framing. An HTTP layer (or anything
//! else) can wrap these operations and serialize the returned records
//! directly; every payload type here is `Serialize`.

use crate::embed::Embedder;
use crate::rag::{RagEngine, RagResult, SearchResult};
use crate::Result;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Summary text used when no context clears the threshold.
pub const NO_CONTEXT_TEXT: &str = "No relevant SEBI update found for the provided context.";

/// Response payload of [`ComplianceService::context`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextSummary {
    /// Title of the strongest matching document, if any
    pub sebi_title: Option<String>,
    /// Synthesized summary, or the fixed "not found" text
    pub sebi_summary: String,
    /// Publication date of the strongest match, if any
    pub date: Option<NaiveDate>,
}

/// Response payload of [`ComplianceService::question`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionAnswer {
    /// Regulatory update title, echoed from the request
    pub sebi_title: String,
    /// Regulatory update summary, echoed from the request
    pub sebi_summary: String,
    /// The user's question, echoed from the request
    pub user_question: String,
    /// Synthesized answer grounded in the retrieved sources
    pub user_answer: String,
    /// Contexts the answer was grounded in
    pub sources: Vec<SearchResult>,
}

/// Request-boundary facade over a built retrieval engine.
///
/// Intended usage is one long-lived service behind shared ownership
/// (`Arc<ComplianceService<E>>`); all operations take `&self`.
pub struct ComplianceService<E: Embedder> {
    engine: RagEngine<E>,
}

impl<E: Embedder> ComplianceService<E> {
    /// Wrap an engine whose store has already been built or loaded.
    pub fn new(engine: RagEngine<E>) -> Self {
        Self { engine }
    }

    /// The underlying engine.
    pub fn engine(&self) -> &RagEngine<E> {
        &self.engine
    }

    /// Free-text compliance query; returns the full RAG outcome.
    pub fn query(&self, text: &str, top_k: usize) -> Result<RagResult> {
        tracing::info!(top_k, "query operation");
        self.engine.query(text, top_k)
    }

    /// Summarize the most relevant regulatory update for a piece of text.
    ///
    /// When nothing clears the threshold the summary is the fixed "not
    /// found" text and title/date are absent rather than fabricated.
    pub fn context(&self, text: &str, top_k: usize) -> Result<ContextSummary> {
        tracing::info!(top_k, "context operation");
        let result = self.engine.query(text, top_k)?;

        match result.contexts.first() {
            None => Ok(ContextSummary {
                sebi_title: None,
                sebi_summary: NO_CONTEXT_TEXT.to_string(),
                date: None,
            }),
            Some(top) => Ok(ContextSummary {
                sebi_title: Some(top.document_title.clone()),
                sebi_summary: result.answer,
                date: Some(top.published_date),
            }),
        }
    }

    /// Answer a follow-up question about a regulatory update.
    ///
    /// Retrieval runs over the title, summary, and question joined by
    /// newlines so all three contribute to the embedding.
    pub fn question(
        &self,
        sebi_title: &str,
        sebi_summary: &str,
        user_question: &str,
        top_k: usize,
    ) -> Result<QuestionAnswer> {
        tracing::info!(top_k, "question operation");
        let combined_query = format!("{sebi_title}\n{sebi_summary}\n{user_question}");
        let result = self.engine.query(&combined_query, top_k)?;

        Ok(QuestionAnswer {
            sebi_title: sebi_title.to_string(),
            sebi_summary: sebi_summary.to_string(),
            user_question: user_question.to_string(),
            user_answer: result.answer,
            sources: result.contexts,
        })
    }
}
