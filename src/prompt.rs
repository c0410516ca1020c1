//! Grounded prompt assembly
//!
//! Pure string construction with no retrieval or model state, so the exact
//! prompt text is unit-testable against literal expectations. The wording
//! below is the deployed template; downstream answer parsers key on the
//! `[Source N]` notation and the section headers, so changes here are
//! breaking changes.

use crate::rag::SearchResult;
use std::fmt::Write;

/// Render retrieved contexts as a numbered citation block.
///
/// Sources are numbered from 1 in the order given. Each entry carries the
/// provenance fields a compliance answer must cite, the relevance as a
/// two-decimal percentage, and a `---` rule after the content.
pub fn build_context_block(contexts: &[SearchResult]) -> String {
    let mut blocks = Vec::with_capacity(contexts.len());

    for (idx, ctx) in contexts.iter().enumerate() {
        let mut block = String::new();
        let _ = writeln!(block, "[Source {}]", idx + 1);
        let _ = writeln!(block, "Title: {}", ctx.document_title);
        let _ = writeln!(block, "Category: {}", ctx.category);
        let _ = writeln!(block, "Date: {}", ctx.published_date);
        let _ = writeln!(block, "URL: {}", ctx.source_url);
        let _ = writeln!(block, "Relevance: {:.2}%", ctx.similarity_score * 100.0);
        let _ = writeln!(block, "Content:");
        let _ = writeln!(block, "{}", ctx.chunk_text);
        block.push_str("---");
        blocks.push(block);
    }

    blocks.join("\n\n")
}

/// Assemble the full grounded prompt for a query and its retrieved contexts.
///
/// With at least one context, the prompt carries the FinComply AI preamble,
/// the five grounding rules, the context block, the echoed user query, and
/// the `RESPONSE (with citations):` cue. With no contexts, a short variant
/// states that the database has nothing on the topic and asks the caller to
/// rephrase instead of inviting an ungrounded answer.
pub fn build_prompt(query: &str, contexts: &[SearchResult]) -> String {
    if contexts.is_empty() {
        return format!(
            "You are FinComply AI, a SEBI compliance expert.\n\
             \n\
             USER QUERY: {query}\n\
             \n\
             RESPONSE: I don't have specific SEBI regulations on this topic in my current \
             database. Please try rephrasing your query or contact SEBI directly at www.sebi.gov.in"
        );
    }

    let context_text = build_context_block(contexts);

    format!(
        "You are FinComply AI, a SEBI compliance expert. Use ONLY the provided context to answer.\n\
         \n\
         CRITICAL RULES:\n\
         1. Answer ONLY using information from the context below\n\
         2. If the context doesn't contain the answer, say so clearly\n\
         3. ALWAYS cite sources using [Source N] notation\n\
         4. Never make up regulations\n\
         5. Be precise and factual\n\
         \n\
         CONTEXT:\n{context_text}\n\
         \n\
         USER QUERY: {query}\n\
         \n\
         RESPONSE (with citations):"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample_context(title: &str, score: f32) -> SearchResult {
        SearchResult {
            chunk_text: "All listed entities must disclose material events within 24 hours."
                .to_string(),
            document_title: title.to_string(),
            category: "Circular".to_string(),
            published_date: NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
            source_url: "https://www.sebi.gov.in/legal/circulars/1.html".to_string(),
            similarity_score: score,
            distance: 1.0 / score - 1.0,
        }
    }

    #[test]
    fn test_context_block_single_source_exact() {
        let contexts = vec![sample_context("Circular on Disclosure Requirements", 0.35)];
        let block = build_context_block(&contexts);
        assert_eq!(
            block,
            "[Source 1]\n\
             Title: Circular on Disclosure Requirements\n\
             Category: Circular\n\
             Date: 2024-03-15\n\
             URL: https://www.sebi.gov.in/legal/circulars/1.html\n\
             Relevance: 35.00%\n\
             Content:\n\
             All listed entities must disclose material events within 24 hours.\n\
             ---"
        );
    }

    #[test]
    fn test_context_block_numbers_sources_in_order() {
        let contexts = vec![
            sample_context("First Circular", 0.9),
            sample_context("Second Circular", 0.5),
            sample_context("Third Circular", 0.4),
        ];
        let block = build_context_block(&contexts);
        assert!(block.contains("[Source 1]\nTitle: First Circular"));
        assert!(block.contains("[Source 2]\nTitle: Second Circular"));
        assert!(block.contains("[Source 3]\nTitle: Third Circular"));

        let pos1 = block.find("[Source 1]").unwrap();
        let pos2 = block.find("[Source 2]").unwrap();
        let pos3 = block.find("[Source 3]").unwrap();
        assert!(pos1 < pos2 && pos2 < pos3);
    }

    #[test]
    fn test_context_block_entries_separated_by_blank_line() {
        let contexts = vec![sample_context("A", 0.5), sample_context("B", 0.4)];
        let block = build_context_block(&contexts);
        assert!(block.contains("---\n\n[Source 2]"));
    }

    #[test]
    fn test_context_block_empty() {
        assert_eq!(build_context_block(&[]), "");
    }

    #[test]
    fn test_relevance_percent_formatting() {
        let block = build_context_block(&[sample_context("A", 1.0)]);
        assert!(block.contains("Relevance: 100.00%"));

        let block = build_context_block(&[sample_context("A", 0.301)]);
        assert!(block.contains("Relevance: 30.10%"));
    }

    #[test]
    fn test_prompt_with_contexts_structure() {
        let contexts = vec![sample_context("Circular on Disclosure Requirements", 0.6)];
        let prompt = build_prompt("What are the disclosure timelines?", &contexts);

        assert!(prompt.starts_with(
            "You are FinComply AI, a SEBI compliance expert. Use ONLY the provided context to answer."
        ));
        assert!(prompt.contains("CRITICAL RULES:\n1. Answer ONLY using information from the context below"));
        assert!(prompt.contains("3. ALWAYS cite sources using [Source N] notation"));
        assert!(prompt.contains("5. Be precise and factual"));
        assert!(prompt.contains("CONTEXT:\n[Source 1]"));
        assert!(prompt.contains("USER QUERY: What are the disclosure timelines?"));
        assert!(prompt.ends_with("RESPONSE (with citations):"));
    }

    #[test]
    fn test_prompt_no_contexts_exact() {
        let prompt = build_prompt("Tell me about crypto rules", &[]);
        assert_eq!(
            prompt,
            "You are FinComply AI, a SEBI compliance expert.\n\
             \n\
             USER QUERY: Tell me about crypto rules\n\
             \n\
             RESPONSE: I don't have specific SEBI regulations on this topic in my current \
             database. Please try rephrasing your query or contact SEBI directly at www.sebi.gov.in"
        );
    }

    #[test]
    fn test_prompt_no_contexts_instructs_rephrasing() {
        let prompt = build_prompt("crypto rules", &[]);
        assert!(prompt.contains("Please try rephrasing your query"));
        assert!(prompt.contains("contact SEBI directly at www.sebi.gov.in"));
    }

    #[test]
    fn test_prompt_echoes_query_verbatim() {
        let query = "penalty for late filing?  (section 15A)";
        let with = build_prompt(query, &[sample_context("A", 0.5)]);
        let without = build_prompt(query, &[]);
        assert!(with.contains(query));
        assert!(without.contains(query));
    }

    #[test]
    fn test_prompt_deterministic() {
        let contexts = vec![sample_context("A", 0.5), sample_context("B", 0.4)];
        assert_eq!(
            build_prompt("same query", &contexts),
            build_prompt("same query", &contexts)
        );
    }
}
