//! In-memory vector store using cosine similarity.
//!
//! [`InMemoryVectorStore`] keeps records in parallel arrays behind a
//! `tokio::sync::RwLock`. Search is brute force, O(n·D) per query; this is
//! a documented scaling limit of the design, acceptable for the small
//! corpora the pipeline targets.

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::document::SearchResult;
use crate::error::Result;
use crate::vectorstore::VectorStore;

/// Denominator floor for cosine similarity; keeps zero-norm vectors from
/// producing a division by zero.
const NORM_EPSILON: f32 = 1e-10;

/// Metadata keys checked, in order, when enumerating record sources.
const SOURCE_KEYS: [&str; 3] = ["source", "file_path", "filename"];

/// Parallel record storage. The three arrays always have equal length.
#[derive(Debug, Default)]
struct Records {
    embeddings: Vec<Vec<f32>>,
    texts: Vec<String>,
    metadatas: Vec<HashMap<String, String>>,
}

/// An in-memory append-only vector store.
///
/// # Example
///
/// ```rust,ignore
/// use docrag::{InMemoryVectorStore, VectorStore};
///
/// let store = InMemoryVectorStore::new();
/// store.add(vec![0.1, 0.9], "text".into(), Default::default()).await?;
/// ```
#[derive(Debug, Default)]
pub struct InMemoryVectorStore {
    records: RwLock<Records>,
}

impl InMemoryVectorStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

/// Compute cosine similarity between two vectors.
///
/// A denominator that would be zero is replaced by a small positive
/// epsilon, and any non-finite result is coerced to `0.0`.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    let score = dot / (norm_a * norm_b).max(NORM_EPSILON);
    if score.is_finite() { score } else { 0.0 }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn add(
        &self,
        embedding: Vec<f32>,
        text: String,
        metadata: HashMap<String, String>,
    ) -> Result<()> {
        let mut records = self.records.write().await;
        records.embeddings.push(embedding);
        records.texts.push(text);
        records.metadatas.push(metadata);
        Ok(())
    }

    async fn len(&self) -> usize {
        self.records.read().await.embeddings.len()
    }

    async fn search(&self, embedding: &[f32], top_k: usize) -> Result<Vec<SearchResult>> {
        let records = self.records.read().await;
        if records.embeddings.is_empty() {
            return Ok(Vec::new());
        }

        let mut scored: Vec<(usize, f32)> = records
            .embeddings
            .iter()
            .enumerate()
            .map(|(i, stored)| (i, cosine_similarity(stored, embedding)))
            .collect();

        // Stable sort keeps insertion order as the tie-break.
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k);

        debug!(candidates = records.embeddings.len(), returned = scored.len(), "search complete");

        Ok(scored
            .into_iter()
            .map(|(i, score)| SearchResult {
                text: records.texts[i].clone(),
                metadata: records.metadatas[i].clone(),
                score,
            })
            .collect())
    }

    async fn sources(&self) -> BTreeSet<String> {
        let records = self.records.read().await;
        records
            .metadatas
            .iter()
            .filter_map(|metadata| {
                SOURCE_KEYS.iter().find_map(|key| metadata.get(*key)).cloned()
            })
            .collect()
    }
}
