//! Vector store trait for storing and searching embeddings.

use std::collections::BTreeSet;

use async_trait::async_trait;

use crate::document::SearchResult;
use crate::error::Result;

/// An append-only collection of (embedding, text, metadata) records with
/// brute-force similarity search.
///
/// Records are never mutated or deleted; insertion order is a record's
/// implicit identity and the deterministic tie-break for equal scores.
///
/// # Example
///
/// ```rust,ignore
/// use docrag::{InMemoryVectorStore, VectorStore};
///
/// let store = InMemoryVectorStore::new();
/// store.add(embedding, text, metadata).await?;
/// let results = store.search(&query_embedding, 5).await?;
/// ```
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Append one record. Never rejects input; an empty metadata map is a
    /// valid value.
    async fn add(
        &self,
        embedding: Vec<f32>,
        text: String,
        metadata: std::collections::HashMap<String, String>,
    ) -> Result<()>;

    /// The number of stored records.
    async fn len(&self) -> usize;

    /// Whether the store holds zero records.
    async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Return the `top_k` records most similar to `embedding`, ordered by
    /// descending cosine similarity. Returns fewer when fewer records
    /// exist, and an empty `Vec` (not an error) on an empty store.
    async fn search(&self, embedding: &[f32], top_k: usize) -> Result<Vec<SearchResult>>;

    /// The deduplicated set of source identifiers across all records,
    /// checking metadata keys in priority order `source`, `file_path`,
    /// `filename`.
    async fn sources(&self) -> BTreeSet<String>;
}
