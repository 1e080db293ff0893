//! # docrag
//!
//! Retrieval-augmented question answering over local document
//! collections.
//!
//! Documents are split into overlapping chunks, embedded into
//! fixed-dimension vectors, and stored in an append-only in-memory vector
//! store. Questions are embedded the same way; the most similar chunks
//! (by brute-force cosine similarity, filtered by a hard score threshold)
//! form the context for a hosted chat-completion call that answers
//! strictly from that context.
//!
//! Embeddings come from a remote sentence-embedding endpoint when one is
//! configured and reachable, and otherwise from a deterministic TF-IDF
//! fallback — callers never observe the difference. Nothing persists
//! across process restarts, and search is intentionally brute force:
//! this crate targets small, single-session corpora.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use docrag::{
//!     provider_from_env, FsLoader, InMemoryVectorStore, OpenAIChatProvider, RagConfig,
//!     RagPipeline, RecursiveChunker,
//! };
//!
//! let config = RagConfig::default();
//! let pipeline = RagPipeline::builder()
//!     .embedding_provider(provider_from_env().await)
//!     .vector_store(Arc::new(InMemoryVectorStore::new()))
//!     .chunker(Arc::new(RecursiveChunker::new(config.chunk_size, config.chunk_overlap)))
//!     .generation_provider(Arc::new(OpenAIChatProvider::from_env()?))
//!     .config(config)
//!     .build()?;
//!
//! pipeline.ingest(&FsLoader::new("data")).await?;
//! let result = pipeline.query("What do the documents say?", false).await?;
//! println!("{}", result.answer);
//! ```

pub mod chunking;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod generation;
pub mod inmemory;
pub mod loader;
pub mod pipeline;
pub mod semantic;
pub mod statistical;
pub mod vectorstore;

pub use chunking::{Chunker, RecursiveChunker};
pub use config::{RagConfig, RagConfigBuilder};
pub use document::{Chunk, Document, SearchResult};
pub use embedding::{provider_from_env, EmbeddingProvider, DEFAULT_DIMENSIONS};
pub use error::{RagError, Result};
pub use generation::{GenerationProvider, OpenAIChatProvider};
pub use inmemory::InMemoryVectorStore;
pub use loader::{DocumentLoader, FsLoader, LoadedCorpus};
pub use pipeline::{
    ChunkDetail, IngestReport, QueryAnswer, RagPipeline, RagPipelineBuilder,
    NO_RELEVANT_INFORMATION,
};
pub use semantic::SemanticEmbeddingProvider;
pub use statistical::TfIdfEmbeddingProvider;
pub use vectorstore::VectorStore;
