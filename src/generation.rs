//! Answer generation against a hosted chat-completion endpoint.
//!
//! The [`GenerationProvider`] trait is the narrow seam the pipeline calls
//! through: prompt in, answer text out. [`OpenAIChatProvider`] implements
//! it for any OpenAI-compatible serving endpoint.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, error};

use crate::error::{RagError, Result};

/// Instructions sent as the system message with every generation request.
const SYSTEM_PROMPT: &str = "You are an expert information extraction assistant. Extract and \
    provide answers from the given context. Never refuse to answer if the information exists in \
    the context, regardless of how the question is phrased. Only say you don't know when the \
    information is genuinely absent.";

/// A collaborator that turns a fully assembled prompt into answer text.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Generate an answer for the given prompt.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::GenerationAuth`] when the endpoint rejects the
    /// request's credentials, and [`RagError::Generation`] for any other
    /// failure. The pipeline degrades both instead of propagating them.
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// A [`GenerationProvider`] backed by an OpenAI-compatible
/// `/chat/completions` endpoint.
///
/// # Configuration
///
/// - `base_url` — endpoint root, e.g. `https://host/serving-endpoints`.
/// - `model` — the served model name.
/// - `api_key` — from the constructor or `LLM_API_KEY`.
///
/// # Example
///
/// ```rust,ignore
/// use docrag::OpenAIChatProvider;
///
/// let provider = OpenAIChatProvider::new("https://host/v1", "sk-...", "my-model")?;
/// let answer = provider.generate("...").await?;
/// ```
pub struct OpenAIChatProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAIChatProvider {
    /// Create a new provider for an OpenAI-compatible endpoint.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self> {
        let base_url = base_url.into();
        if base_url.is_empty() {
            return Err(RagError::Generation("base URL must not be empty".into()));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.into(),
        })
    }

    /// Create a new provider from `LLM_BASE_URL`, `LLM_API_KEY`, and
    /// `LLM_MODEL`.
    pub fn from_env() -> Result<Self> {
        let base_url = std::env::var("LLM_BASE_URL")
            .map_err(|_| RagError::Generation("LLM_BASE_URL environment variable not set".into()))?;
        let api_key = std::env::var("LLM_API_KEY").unwrap_or_default();
        let model = std::env::var("LLM_MODEL")
            .map_err(|_| RagError::Generation("LLM_MODEL environment variable not set".into()))?;
        Self::new(base_url, api_key, model)
    }
}

// ── API response types ─────────────────────────────────────────────

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: String,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

// ── GenerationProvider implementation ──────────────────────────────

#[async_trait]
impl GenerationProvider for OpenAIChatProvider {
    async fn generate(&self, prompt: &str) -> Result<String> {
        debug!(model = %self.model, prompt_len = prompt.len(), "requesting generation");

        let request_body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": prompt },
            ],
            "max_tokens": 1024,
            "temperature": 0.1,
        });

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "generation request failed");
                RagError::Generation(format!("request failed: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);

            error!(%status, "generation endpoint returned an error");
            if status == reqwest::StatusCode::UNAUTHORIZED
                || status == reqwest::StatusCode::FORBIDDEN
            {
                return Err(RagError::GenerationAuth(format!("endpoint returned {status}: {detail}")));
            }
            return Err(RagError::Generation(format!("endpoint returned {status}: {detail}")));
        }

        let chat_response: ChatResponse = response.json().await.map_err(|e| {
            error!(error = %e, "failed to parse generation response");
            RagError::Generation(format!("failed to parse response: {e}"))
        })?;

        chat_response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| RagError::Generation("endpoint returned no choices".into()))
    }
}
