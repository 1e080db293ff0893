//! Remote sentence-embedding provider.
//!
//! Calls an OpenAI-compatible `/embeddings` endpoint over HTTP. Used as
//! the primary embedding strategy when an endpoint is configured and
//! reachable; see [`provider_from_env`](crate::embedding::provider_from_env).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::embedding::{fit_dimension, EmbeddingProvider, DEFAULT_DIMENSIONS};
use crate::error::{RagError, Result};

/// The default embedding model requested from the endpoint.
const DEFAULT_MODEL: &str = "all-MiniLM-L6-v2";

/// An [`EmbeddingProvider`] backed by a hosted sentence-embedding model.
///
/// Uses `reqwest` to call an OpenAI-compatible `/embeddings` endpoint
/// directly.
///
/// # Configuration
///
/// - `base_url` — endpoint root, e.g. `https://host/serving-endpoints`.
/// - `model` — defaults to `all-MiniLM-L6-v2`.
/// - `api_key` — from the constructor or `EMBEDDINGS_API_KEY`.
/// - `dimensions` — defaults to 384; responses are padded or truncated to
///   this length so all vectors in the store agree.
///
/// # Example
///
/// ```rust,ignore
/// use docrag::SemanticEmbeddingProvider;
///
/// let provider = SemanticEmbeddingProvider::new("https://host/v1", "sk-...")?;
/// let embedding = provider.embed("hello world").await?;
/// ```
pub struct SemanticEmbeddingProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    dimensions: usize,
}

impl SemanticEmbeddingProvider {
    /// Create a new provider with the given endpoint root and API key.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        let base_url = base_url.into();
        if api_key.is_empty() {
            return Err(RagError::Embedding {
                provider: "semantic".into(),
                message: "API key must not be empty".into(),
            });
        }
        if base_url.is_empty() {
            return Err(RagError::Embedding {
                provider: "semantic".into(),
                message: "base URL must not be empty".into(),
            });
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: DEFAULT_MODEL.into(),
            dimensions: DEFAULT_DIMENSIONS,
        })
    }

    /// Create a new provider from `EMBEDDINGS_BASE_URL`,
    /// `EMBEDDINGS_API_KEY`, and optionally `EMBEDDINGS_MODEL` and
    /// `EMBEDDINGS_DIMENSIONS`.
    pub fn from_env() -> Result<Self> {
        let base_url =
            std::env::var("EMBEDDINGS_BASE_URL").map_err(|_| RagError::Embedding {
                provider: "semantic".into(),
                message: "EMBEDDINGS_BASE_URL environment variable not set".into(),
            })?;
        let api_key = std::env::var("EMBEDDINGS_API_KEY").map_err(|_| RagError::Embedding {
            provider: "semantic".into(),
            message: "EMBEDDINGS_API_KEY environment variable not set".into(),
        })?;

        let mut provider = Self::new(base_url, api_key)?;
        if let Ok(model) = std::env::var("EMBEDDINGS_MODEL") {
            provider = provider.with_model(model);
        }
        if let Some(dims) =
            std::env::var("EMBEDDINGS_DIMENSIONS").ok().and_then(|v| v.parse::<usize>().ok())
        {
            provider = provider.with_dimensions(dims);
        }
        Ok(provider)
    }

    /// Set the model name requested from the endpoint.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the output dimensionality vectors are normalized to.
    pub fn with_dimensions(mut self, dims: usize) -> Self {
        self.dimensions = dims;
        self
    }

    /// Check whether the endpoint can actually serve embeddings.
    ///
    /// Issues a one-shot embedding call; `false` means the caller should
    /// select the statistical fallback instead.
    pub async fn probe(&self) -> bool {
        match self.embed_batch(&["availability probe"]).await {
            Ok(_) => true,
            Err(e) => {
                debug!(error = %e, "embedding endpoint probe failed");
                false
            }
        }
    }
}

// ── API request/response types ─────────────────────────────────────

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: Vec<&'a str>,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

// ── EmbeddingProvider implementation ───────────────────────────────

#[async_trait]
impl EmbeddingProvider for SemanticEmbeddingProvider {
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!(batch_size = texts.len(), model = %self.model, "embedding batch");

        let request_body = EmbeddingRequest { model: &self.model, input: texts.to_vec() };

        let response = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "embedding request failed");
                RagError::Embedding {
                    provider: "semantic".into(),
                    message: format!("request failed: {e}"),
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);

            error!(%status, "embedding endpoint returned an error");
            return Err(RagError::Embedding {
                provider: "semantic".into(),
                message: format!("endpoint returned {status}: {detail}"),
            });
        }

        let embedding_response: EmbeddingResponse = response.json().await.map_err(|e| {
            error!(error = %e, "failed to parse embedding response");
            RagError::Embedding {
                provider: "semantic".into(),
                message: format!("failed to parse response: {e}"),
            }
        })?;

        if embedding_response.data.len() != texts.len() {
            return Err(RagError::Embedding {
                provider: "semantic".into(),
                message: format!(
                    "endpoint returned {} vectors for {} inputs",
                    embedding_response.data.len(),
                    texts.len()
                ),
            });
        }

        Ok(embedding_response
            .data
            .into_iter()
            .map(|d| fit_dimension(d.embedding, self.dimensions))
            .collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
