//! FinComply CLI
//!
//! Command-line interface for the FinComply retrieval core: generate a
//! synthetic SEBI corpus, build a persistent vector index over it, and run
//! grounded compliance queries against the index.
//!
//! ## Features
//!
//! - `embeddings` - Enable production semantic embeddings via fastembed
//!   (ONNX Runtime)
//!
//! ## Usage
//!
//! ```bash
//! fincomply generate --count 100 --seed 42 --output sebi_documents.json
//! fincomply index --input sebi_documents.json --output index/
//! fincomply query "disclosure timelines for material events" --index index/
//! ```

mod generate;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use fincomply_rag::{
    chunk::SentenceWindowChunker,
    embed::{Embedder, TfIdfEmbedder},
    index::VectorStore,
    rag::{RagEngine, RagResult},
    Document, DEFAULT_MAX_WORDS, DEFAULT_MIN_SIMILARITY, DEFAULT_OVERLAP_WORDS, DEFAULT_TOP_K,
};
use std::fs;
use std::path::{Path, PathBuf};

#[cfg(feature = "embeddings")]
use fincomply_rag::{EmbeddingModelType, FastEmbedder};

use generate::SebiCorpusGenerator;

/// Embedder type selection
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum EmbedderType {
    /// TF-IDF statistical embeddings (default, no downloads)
    #[default]
    Tfidf,
    /// Semantic embeddings via fastembed (requires `embeddings` feature)
    Semantic,
}

/// Model selection for semantic embeddings
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum SemanticModel {
    /// all-MiniLM-L6-v2: fast, good quality (384 dims)
    #[default]
    MiniLm,
    /// all-MiniLM-L12-v2: better quality, slower (384 dims)
    MiniLmL12,
    /// BGE-small-en-v1.5: balanced performance (384 dims)
    BgeSmall,
}

/// Output format selection
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// Pretty-printed JSON
    Json,
}

#[derive(Parser)]
#[command(name = "fincomply")]
#[command(version)]
#[command(about = "SEBI compliance retrieval CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a synthetic SEBI document corpus
    Generate {
        /// Number of documents to generate
        #[arg(short, long, default_value = "50")]
        count: usize,

        /// RNG seed for reproducible corpora
        #[arg(short, long)]
        seed: Option<u64>,

        /// Output JSON file
        #[arg(short, long, default_value = "sebi_documents.json")]
        output: PathBuf,
    },

    /// Chunk, embed, and persist an index over a document corpus
    Index {
        /// Input JSON file (array of documents, as produced by `generate`)
        #[arg(short, long)]
        input: PathBuf,

        /// Output directory for the index files
        #[arg(short, long)]
        output: PathBuf,

        /// Chunk size budget in words
        #[arg(long, default_value_t = DEFAULT_MAX_WORDS)]
        max_words: usize,

        /// Chunk overlap budget in words
        #[arg(long, default_value_t = DEFAULT_OVERLAP_WORDS)]
        overlap_words: usize,

        /// Embedding dimension (tfidf embedder only)
        #[arg(long, default_value = "256")]
        dimension: usize,

        /// Embedder type
        #[arg(short, long, value_enum, default_value = "tfidf")]
        embedder: EmbedderType,

        /// Model for semantic embeddings
        #[arg(short, long, value_enum, default_value = "mini-lm")]
        model: SemanticModel,
    },

    /// Run a compliance query against a persisted index
    Query {
        /// Query string
        query: String,

        /// Path to the index directory
        #[arg(short, long)]
        index: PathBuf,

        /// Number of results to retrieve before filtering
        #[arg(short, long, default_value_t = DEFAULT_TOP_K)]
        top_k: usize,

        /// Minimum similarity a result must clear
        #[arg(long, default_value_t = DEFAULT_MIN_SIMILARITY)]
        min_similarity: f32,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show retrieval stack info
    Info,
}

const VECTORS_FILE: &str = "vectors.bin";
const CHUNKS_FILE: &str = "chunks.csv";

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Generate {
            count,
            seed,
            output,
        } => run_generate(count, seed, &output)?,
        Commands::Index {
            input,
            output,
            max_words,
            overlap_words,
            dimension,
            embedder,
            model,
        } => run_index(
            &input,
            &output,
            max_words,
            overlap_words,
            dimension,
            embedder,
            model,
        )?,
        Commands::Query {
            query,
            index,
            top_k,
            min_similarity,
            format,
        } => run_query(&query, &index, top_k, min_similarity, format)?,
        Commands::Info => run_info(),
    }

    Ok(())
}

fn run_info() {
    println!("FinComply Retrieval Core");
    println!("========================");
    println!("Version: {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Components:");
    println!("  - Chunker: sentence windows (500 words, 100-word overlap by default)");
    println!("  - Index: flat exact squared-L2 nearest neighbor");
    println!("  - Scoring: similarity = 1 / (1 + distance), threshold 0.3");
    println!("  - Synthesis: extractive with [Source N] citations");
    #[cfg(feature = "embeddings")]
    println!("  - Embedders: TF-IDF (trainable), FastEmbed (semantic)");
    #[cfg(not(feature = "embeddings"))]
    println!("  - Embedders: TF-IDF (trainable)");
    println!();
    #[cfg(feature = "embeddings")]
    {
        println!("Semantic embedding models:");
        println!("  - mini-lm: sentence-transformers/all-MiniLM-L6-v2 (384 dims, default)");
        println!("  - mini-lm-l12: sentence-transformers/all-MiniLM-L12-v2 (384 dims)");
        println!("  - bge-small: BAAI/bge-small-en-v1.5 (384 dims)");
    }
    #[cfg(not(feature = "embeddings"))]
    println!("Note: build with --features embeddings for semantic search");
}

fn run_generate(count: usize, seed: Option<u64>, output: &Path) -> Result<()> {
    let mut generator = SebiCorpusGenerator::new(seed);
    let documents = generator.generate(count);

    let json = serde_json::to_string_pretty(&documents)?;
    fs::write(output, json)
        .with_context(|| format!("failed to write corpus to {}", output.display()))?;

    println!("Generated {} SEBI documents", documents.len());
    println!("Corpus saved to: {}", output.display());
    if let Some(first) = documents.first() {
        println!();
        println!("Sample document:");
        println!("  Title: {}", first.title);
        println!("  Words: {}", first.metadata.word_count);
    }

    Ok(())
}

fn run_index(
    input: &Path,
    output: &Path,
    max_words: usize,
    overlap_words: usize,
    dimension: usize,
    embedder_type: EmbedderType,
    #[allow(unused_variables)] model: SemanticModel,
) -> Result<()> {
    let json = fs::read_to_string(input)
        .with_context(|| format!("failed to read corpus file: {}", input.display()))?;
    let documents: Vec<Document> =
        serde_json::from_str(&json).context("corpus file is not a JSON array of documents")?;

    if documents.is_empty() {
        anyhow::bail!("corpus file contains no documents: {}", input.display());
    }

    println!("Loaded {} documents", documents.len());

    let chunker = SentenceWindowChunker::new(max_words, overlap_words)
        .context("invalid chunking parameters")?;
    let chunks = chunker.create_chunks_with_metadata(&documents);
    println!(
        "Chunked into {} windows ({} words max, {} overlap)",
        chunks.len(),
        max_words,
        overlap_words
    );

    let embedder: Box<dyn Embedder> = match embedder_type {
        EmbedderType::Tfidf => {
            let mut embedder = TfIdfEmbedder::new(dimension);
            let texts: Vec<&str> = chunks.iter().map(|c| c.chunk_text.as_str()).collect();
            embedder.fit(&texts);
            println!("Using TF-IDF embedder (dimension: {dimension})");
            Box::new(embedder)
        }
        EmbedderType::Semantic => {
            #[cfg(feature = "embeddings")]
            {
                let model_type = semantic_model_type(model);
                println!(
                    "Loading semantic model: {} (dimension: {})",
                    model_type.model_name(),
                    model_type.dimension()
                );
                Box::new(
                    FastEmbedder::new(model_type)
                        .context("failed to initialize semantic embedder")?,
                )
            }
            #[cfg(not(feature = "embeddings"))]
            {
                anyhow::bail!(
                    "semantic embeddings require the 'embeddings' feature.\n\
                     Build with: cargo build --features embeddings"
                );
            }
        }
    };

    let mut store = VectorStore::new();
    store
        .build(chunks, &embedder)
        .context("failed to build vector index")?;

    fs::create_dir_all(output)?;
    let vectors_path = output.join(VECTORS_FILE);
    let chunks_path = output.join(CHUNKS_FILE);
    store
        .save(&vectors_path, &chunks_path)
        .context("failed to persist index")?;

    println!("Indexed {} chunks", store.len());
    println!("Index saved to: {}", output.display());

    Ok(())
}

fn run_query(
    query: &str,
    index_dir: &Path,
    top_k: usize,
    min_similarity: f32,
    format: OutputFormat,
) -> Result<()> {
    let vectors_path = index_dir.join(VECTORS_FILE);
    let chunks_path = index_dir.join(CHUNKS_FILE);

    if !vectors_path.exists() {
        anyhow::bail!(
            "index not found at {} (run `fincomply index` first)",
            index_dir.display()
        );
    }

    let store = VectorStore::load(&vectors_path, &chunks_path)
        .with_context(|| format!("failed to load index from {}", index_dir.display()))?;

    let embedder = embedder_for_index(&store)?;
    let engine = RagEngine::new(store, embedder).with_min_similarity(min_similarity);

    let result = engine.query(query, top_k)?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        OutputFormat::Text => print_text_result(&result),
    }

    Ok(())
}

/// Reconstruct the embedder the index was built with, from its recorded
/// model id. TF-IDF carries no model file; it is refit on the persisted
/// chunk texts, which reproduces the identical embedding space.
fn embedder_for_index(store: &VectorStore) -> Result<Box<dyn Embedder>> {
    let model_id = store
        .model_id()
        .context("loaded index has no recorded model id")?;

    if model_id == "tfidf" {
        let dimension = store.dimension().context("loaded index has no dimension")?;
        let mut embedder = TfIdfEmbedder::new(dimension);
        let texts: Vec<&str> = (0..store.len())
            .filter_map(|i| store.chunk(i))
            .map(|c| c.chunk_text.as_str())
            .collect();
        embedder.fit(&texts);
        return Ok(Box::new(embedder));
    }

    #[cfg(feature = "embeddings")]
    {
        for model_type in [
            EmbeddingModelType::AllMiniLmL6V2,
            EmbeddingModelType::AllMiniLmL12V2,
            EmbeddingModelType::BgeSmallEnV15,
        ] {
            if model_type.model_name() == model_id {
                let embedder = FastEmbedder::new(model_type)
                    .context("failed to initialize semantic embedder for query")?;
                return Ok(Box::new(embedder));
            }
        }
    }

    anyhow::bail!(
        "index was built with unsupported embedding model '{model_id}' \
         (semantic models require the 'embeddings' feature)"
    )
}

fn print_text_result(result: &RagResult) {
    println!("Query: \"{}\"\n", result.query);
    println!("Answer:");
    println!("{}\n", result.answer);

    println!("Sources ({}):", result.sources_found);
    println!("{}", "-".repeat(50));
    for (i, ctx) in result.contexts.iter().enumerate() {
        println!(
            "{}. [Relevance: {:.2}%] {} ({}, {})",
            i + 1,
            ctx.similarity_score * 100.0,
            ctx.document_title,
            ctx.category,
            ctx.published_date
        );
        println!("   {}", ctx.source_url);
        let preview: String = ctx.chunk_text.chars().take(80).collect();
        println!("   {preview}...\n");
    }
}

#[cfg(feature = "embeddings")]
fn semantic_model_type(model: SemanticModel) -> EmbeddingModelType {
    match model {
        SemanticModel::MiniLm => EmbeddingModelType::AllMiniLmL6V2,
        SemanticModel::MiniLmL12 => EmbeddingModelType::AllMiniLmL12V2,
        SemanticModel::BgeSmall => EmbeddingModelType::BgeSmallEnV15,
    }
}
