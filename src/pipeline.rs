//! Retrieval pipeline orchestrator.
//!
//! [`RagPipeline`] coordinates the full workflow: ingestion (load → chunk
//! → embed → store) and query execution (embed → search → threshold filter
//! → prompt → generate). It owns one embedding provider and one vector
//! store for its lifetime; both live only in process memory.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::chunking::Chunker;
use crate::config::RagConfig;
use crate::document::SearchResult;
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::generation::GenerationProvider;
use crate::loader::DocumentLoader;
use crate::vectorstore::VectorStore;

/// The literal answer returned when no retrieved chunk clears the score
/// threshold. Generation is never invoked in that case.
pub const NO_RELEVANT_INFORMATION: &str =
    "No relevant information found in the uploaded documents.";

/// Maximum characters of chunk text included in chunk detail output.
const CHUNK_PREVIEW_CHARS: usize = 200;

/// Lines of context echoed by the local degraded answer when generation
/// credentials are rejected.
const FALLBACK_CONTEXT_LINES: usize = 10;

/// Summary of one ingestion call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestReport {
    /// Source identifiers that were successfully loaded.
    pub sources: Vec<String>,
    /// Number of chunks embedded and stored.
    pub chunk_count: usize,
}

/// One retrieved chunk as shown to the user when chunk detail is
/// requested.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkDetail {
    /// 1-based rank of the chunk in the retrieved context.
    pub index: usize,
    /// Display name of the originating document (basename, either path
    /// separator convention).
    pub source: String,
    /// Chunk text, truncated to 200 characters with a trailing `...`.
    pub text: String,
}

/// The answer to one query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryAnswer {
    /// Generated (or degraded) answer text.
    pub answer: String,
    /// Number of retrieved chunks that informed the answer.
    pub sources_used: usize,
    /// Per-chunk detail; empty unless requested.
    pub chunks: Vec<ChunkDetail>,
}

/// The retrieval pipeline orchestrator.
///
/// Construct one via [`RagPipeline::builder()`]. A pipeline instance
/// assumes a single logical session: calls run to completion and the
/// in-memory store is not meant for concurrent mutation by multiple
/// callers.
pub struct RagPipeline {
    config: RagConfig,
    embedding_provider: Arc<dyn EmbeddingProvider>,
    vector_store: Arc<dyn VectorStore>,
    chunker: Arc<dyn Chunker>,
    generation_provider: Arc<dyn GenerationProvider>,
}

impl RagPipeline {
    /// Create a new [`RagPipelineBuilder`].
    pub fn builder() -> RagPipelineBuilder {
        RagPipelineBuilder::default()
    }

    /// Return a reference to the pipeline configuration.
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Return a reference to the vector store.
    pub fn vector_store(&self) -> &Arc<dyn VectorStore> {
        &self.vector_store
    }

    /// Ingest every document the loader resolves: chunk, embed, store.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::EmptyCorpus`] if chunking produced nothing —
    /// the pipeline stays usable for a retry with different input.
    /// Embedding and store failures propagate as their own variants.
    pub async fn ingest(&self, loader: &dyn DocumentLoader) -> Result<IngestReport> {
        let corpus = loader.load()?;
        let chunks = self.chunker.chunk_all(&corpus.documents);
        if chunks.is_empty() {
            return Err(RagError::EmptyCorpus);
        }

        let chunk_count = chunks.len();
        info!(chunk_count, documents = corpus.documents.len(), "starting ingestion");

        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        let embeddings = self.embedding_provider.embed_batch(&texts).await.map_err(|e| {
            error!(error = %e, "embedding failed during ingestion");
            e
        })?;

        for (chunk, embedding) in chunks.into_iter().zip(embeddings) {
            self.vector_store.add(embedding, chunk.text, chunk.metadata).await?;
        }

        info!(chunk_count, sources = corpus.sources.len(), "ingestion complete");
        Ok(IngestReport { sources: corpus.sources, chunk_count })
    }

    /// Answer a question from the ingested documents.
    ///
    /// Retrieves the configured `top_k` chunks, discards everything below
    /// the score threshold (a hard cutoff applied after top-K selection),
    /// and asks the generation collaborator to answer strictly from the
    /// surviving context. When nothing survives, returns the literal
    /// no-relevant-information answer without invoking generation.
    ///
    /// Generation failures degrade instead of propagating: a credentials
    /// rejection yields a local answer echoing the context, and any other
    /// failure is reported inside the answer text.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::EmptyStore`] if nothing has been ingested yet.
    pub async fn query(&self, question: &str, include_chunk_detail: bool) -> Result<QueryAnswer> {
        if self.vector_store.is_empty().await {
            return Err(RagError::EmptyStore);
        }

        let query_embedding = self.embedding_provider.embed(question).await.map_err(|e| {
            error!(error = %e, "embedding failed during query");
            e
        })?;

        let results = self.vector_store.search(&query_embedding, self.config.top_k).await?;

        let retained: Vec<SearchResult> =
            results.into_iter().filter(|r| r.score >= self.config.min_score).collect();

        if retained.is_empty() {
            info!(threshold = self.config.min_score, "no retrieved chunk cleared the threshold");
            return Ok(QueryAnswer {
                answer: NO_RELEVANT_INFORMATION.to_string(),
                sources_used: 0,
                chunks: Vec::new(),
            });
        }

        let context =
            retained.iter().map(|r| r.text.as_str()).collect::<Vec<_>>().join("\n\n");
        let prompt = build_prompt(&context, question);

        let answer = match self.generation_provider.generate(&prompt).await {
            Ok(answer) => answer,
            Err(RagError::GenerationAuth(message)) => {
                warn!(%message, "generation credentials rejected, answering from context");
                context_fallback_answer(&context)
            }
            Err(e) => format!("Error generating answer: {e}"),
        };

        let chunks = if include_chunk_detail {
            retained
                .iter()
                .enumerate()
                .map(|(i, result)| ChunkDetail {
                    index: i + 1,
                    source: display_source(
                        result.metadata.get("source").map(String::as_str).unwrap_or("Unknown"),
                    ),
                    text: preview(&result.text),
                })
                .collect()
        } else {
            Vec::new()
        };

        info!(sources_used = retained.len(), "query complete");
        Ok(QueryAnswer { answer, sources_used: retained.len(), chunks })
    }
}

/// Build the generation prompt constraining the model to answer strictly
/// from the retrieved context.
fn build_prompt(context: &str, question: &str) -> String {
    format!(
        "You are a precise information extraction assistant analyzing document content.\n\
         \n\
         Your task: Extract ONLY factual information from the context below to answer the question.\n\
         \n\
         STRICT RULES:\n\
         1. Answer MUST come directly from the context - never add external knowledge\n\
         2. If information is in the context, provide it clearly and completely\n\
         3. Use exact numbers, names, dates, and facts from the context\n\
         4. If context has partial information, provide what exists and note what's missing\n\
         5. ONLY respond \"I cannot find this information in the provided documents\" if truly absent\n\
         6. Do not make assumptions or inferences beyond what's stated\n\
         7. If question asks multiple things, address each point separately\n\
         \n\
         CONTEXT FROM DOCUMENTS:\n\
         {context}\n\
         \n\
         QUESTION: {question}\n\
         \n\
         ANSWER (based strictly on context above):"
    )
}

/// Local degraded answer used when generation credentials are rejected:
/// the first few non-empty context lines under an explanatory header.
fn context_fallback_answer(context: &str) -> String {
    let lines: Vec<&str> = context
        .lines()
        .filter(|line| !line.trim().is_empty())
        .take(FALLBACK_CONTEXT_LINES)
        .collect();
    format!("Based on the documents:\n\n{}", lines.join("\n"))
}

/// Strip any directory prefix from a source path, on either separator
/// convention.
fn display_source(source: &str) -> String {
    source.rsplit(['/', '\\']).next().unwrap_or(source).to_string()
}

/// Truncate chunk text for display, marking the cut with an ellipsis.
fn preview(text: &str) -> String {
    if text.chars().count() <= CHUNK_PREVIEW_CHARS {
        text.to_string()
    } else {
        let truncated: String = text.chars().take(CHUNK_PREVIEW_CHARS).collect();
        format!("{truncated}...")
    }
}

/// Builder for constructing a [`RagPipeline`].
///
/// All components are required. Call
/// [`build()`](RagPipelineBuilder::build) to validate and produce the
/// pipeline.
#[derive(Default)]
pub struct RagPipelineBuilder {
    config: Option<RagConfig>,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
    vector_store: Option<Arc<dyn VectorStore>>,
    chunker: Option<Arc<dyn Chunker>>,
    generation_provider: Option<Arc<dyn GenerationProvider>>,
}

impl RagPipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the embedding provider.
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    /// Set the vector store.
    pub fn vector_store(mut self, store: Arc<dyn VectorStore>) -> Self {
        self.vector_store = Some(store);
        self
    }

    /// Set the document chunker.
    pub fn chunker(mut self, chunker: Arc<dyn Chunker>) -> Self {
        self.chunker = Some(chunker);
        self
    }

    /// Set the generation provider.
    pub fn generation_provider(mut self, provider: Arc<dyn GenerationProvider>) -> Self {
        self.generation_provider = Some(provider);
        self
    }

    /// Build the [`RagPipeline`], validating that all components are set.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if any required component is missing.
    pub fn build(self) -> Result<RagPipeline> {
        let config =
            self.config.ok_or_else(|| RagError::Config("config is required".to_string()))?;
        let embedding_provider = self
            .embedding_provider
            .ok_or_else(|| RagError::Config("embedding_provider is required".to_string()))?;
        let vector_store = self
            .vector_store
            .ok_or_else(|| RagError::Config("vector_store is required".to_string()))?;
        let chunker =
            self.chunker.ok_or_else(|| RagError::Config("chunker is required".to_string()))?;
        let generation_provider = self
            .generation_provider
            .ok_or_else(|| RagError::Config("generation_provider is required".to_string()))?;

        Ok(RagPipeline { config, embedding_provider, vector_store, chunker, generation_provider })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_source_strips_either_separator() {
        assert_eq!(display_source(r"C:\docs\a.pdf"), "a.pdf");
        assert_eq!(display_source("/tmp/b.txt"), "b.txt");
        assert_eq!(display_source("bare.md"), "bare.md");
    }

    #[test]
    fn preview_truncates_long_text_with_ellipsis() {
        let long = "x".repeat(300);
        let short = "short text";
        assert_eq!(preview(short), short);
        let truncated = preview(&long);
        assert_eq!(truncated.chars().count(), 203);
        assert!(truncated.ends_with("..."));
    }

    #[test]
    fn fallback_answer_echoes_first_context_lines() {
        let context =
            (0..15).map(|i| format!("line {i}")).collect::<Vec<_>>().join("\n\n");
        let answer = context_fallback_answer(&context);
        assert!(answer.starts_with("Based on the documents:"));
        assert!(answer.contains("line 0"));
        assert!(answer.contains("line 9"));
        assert!(!answer.contains("line 10"));
    }

    #[test]
    fn prompt_embeds_context_and_question() {
        let prompt = build_prompt("the context body", "the question?");
        assert!(prompt.contains("CONTEXT FROM DOCUMENTS:\nthe context body"));
        assert!(prompt.contains("QUESTION: the question?"));
    }
}
