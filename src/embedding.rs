//! Embedding provider trait and strategy selection.
//!
//! Two providers implement the trait: [`SemanticEmbeddingProvider`]
//! (remote sentence-embedding model) and [`TfIdfEmbeddingProvider`]
//! (deterministic statistical fallback). [`provider_from_env`] picks one
//! at startup with an explicit availability probe; the rest of the system
//! is strategy-agnostic.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::error::{RagError, Result};
use crate::semantic::SemanticEmbeddingProvider;
use crate::statistical::TfIdfEmbeddingProvider;

/// Default embedding dimension, matching common small sentence-embedding
/// models.
pub const DEFAULT_DIMENSIONS: usize = 384;

/// A provider that maps text to fixed-dimension embedding vectors.
///
/// Every vector returned by one provider instance has exactly
/// [`dimensions()`](EmbeddingProvider::dimensions) components, regardless
/// of input length or which strategy produced it.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate embedding vectors for a batch of texts, one vector per
    /// input, preserving order.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>>;

    /// Generate an embedding vector for a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text]).await?.into_iter().next().ok_or_else(|| {
            RagError::Embedding {
                provider: "embedding".to_string(),
                message: "provider returned no vector for a single-text batch".to_string(),
            }
        })
    }

    /// The dimensionality of vectors produced by this provider.
    fn dimensions(&self) -> usize;
}

/// Pad with zeros or truncate so `vector` has exactly `dimensions`
/// components.
pub(crate) fn fit_dimension(mut vector: Vec<f32>, dimensions: usize) -> Vec<f32> {
    vector.resize(dimensions, 0.0);
    vector
}

/// Select an embedding provider once, at startup.
///
/// Attempts to configure the remote semantic provider from the
/// environment and probes it with a one-shot embedding call. If the
/// endpoint is unconfigured or unreachable, falls back to the
/// deterministic TF-IDF provider. The choice is fixed for the returned
/// provider's lifetime; no per-call re-check occurs.
pub async fn provider_from_env() -> Arc<dyn EmbeddingProvider> {
    match SemanticEmbeddingProvider::from_env() {
        Ok(provider) => {
            if provider.probe().await {
                info!(dimensions = provider.dimensions(), "using remote sentence embeddings");
                Arc::new(provider)
            } else {
                warn!("embedding endpoint unreachable, falling back to TF-IDF embeddings");
                Arc::new(TfIdfEmbeddingProvider::new(DEFAULT_DIMENSIONS))
            }
        }
        Err(e) => {
            warn!(error = %e, "no embedding endpoint configured, falling back to TF-IDF embeddings");
            Arc::new(TfIdfEmbeddingProvider::new(DEFAULT_DIMENSIONS))
        }
    }
}
