//! Error types for the `docrag` crate.

use thiserror::Error;

/// Errors that can occur during ingestion, retrieval, or generation.
#[derive(Debug, Error)]
pub enum RagError {
    /// Ingestion produced zero usable chunks (no documents found, or all
    /// documents were empty). The pipeline remains usable for a retry.
    #[error("no usable documents found in the corpus")]
    EmptyCorpus,

    /// A query was issued before any successful ingestion.
    #[error("the vector store is empty; ingest documents first")]
    EmptyStore,

    /// An error occurred during embedding generation.
    #[error("embedding error ({provider}): {message}")]
    Embedding {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred in the vector store.
    #[error("vector store error: {0}")]
    Store(String),

    /// An error occurred while loading documents.
    #[error("document loading error: {0}")]
    Loader(String),

    /// The generation endpoint rejected the request's credentials.
    ///
    /// Recovered inside the pipeline by substituting a local
    /// context-extraction answer; never surfaced to callers.
    #[error("generation authorization failed: {0}")]
    GenerationAuth(String),

    /// Any other generation failure. The pipeline degrades this into a
    /// descriptive answer string rather than propagating it.
    #[error("generation failed: {0}")]
    Generation(String),

    /// A configuration validation error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// A convenience result type for `docrag` operations.
pub type Result<T> = std::result::Result<T, RagError>;
