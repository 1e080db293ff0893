//! Data types for documents, chunks, and search results.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A source document containing raw text and provenance metadata.
///
/// Produced by a [`DocumentLoader`](crate::loader::DocumentLoader). The
/// loader always sets a `source` metadata key carrying an addressable
/// identifier (the file path).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// The raw text content of the document.
    pub text: String,
    /// Key-value metadata; always carries a `source` key.
    pub metadata: HashMap<String, String>,
}

impl Document {
    /// Create a document with a single `source` metadata entry.
    pub fn with_source(text: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            metadata: HashMap::from([("source".to_string(), source.into())]),
        }
    }
}

/// A bounded-length slice of a [`Document`]'s text.
///
/// Chunks inherit the parent document's metadata and are immutable once
/// created. They live only for the duration of ingestion; after embedding,
/// their text and metadata move into the vector store's records.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// The text content of the chunk. Never empty.
    pub text: String,
    /// Metadata inherited from the parent document.
    pub metadata: HashMap<String, String>,
}

/// A stored record projected back out of the vector store with its
/// similarity score for the current query.
///
/// Constructed fresh per search call; has no identity of its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// The stored chunk text.
    pub text: String,
    /// The stored chunk metadata.
    pub metadata: HashMap<String, String>,
    /// Cosine similarity against the query vector (higher is more relevant).
    pub score: f32,
}
