//! End-to-end pipeline behavior with mock collaborators.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use docrag::{
    Document, DocumentLoader, EmbeddingProvider, GenerationProvider, InMemoryVectorStore,
    LoadedCorpus, RagConfig, RagError, RagPipeline, RecursiveChunker, VectorStore,
    NO_RELEVANT_INFORMATION,
};

// ---------------------------------------------------------------------------
// Mock collaborators
// ---------------------------------------------------------------------------

/// Deterministic hash-based embeddings; identical texts embed identically.
struct HashEmbeddingProvider {
    dimensions: usize,
}

#[async_trait]
impl EmbeddingProvider for HashEmbeddingProvider {
    async fn embed_batch(&self, texts: &[&str]) -> docrag::Result<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .map(|text| {
                let hash = text
                    .bytes()
                    .fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64));
                let mut embedding = vec![0.0f32; self.dimensions];
                for (i, value) in embedding.iter_mut().enumerate() {
                    *value = ((hash.wrapping_add(i as u64)) as f32).sin();
                }
                let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
                if norm > 0.0 {
                    embedding.iter_mut().for_each(|x| *x /= norm);
                }
                embedding
            })
            .collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

/// Embeds every text as the same 2-d unit vector, so stored vectors of the
/// form `[cos, sin]` score exactly `cos` against any query.
struct FixedQueryEmbedding;

#[async_trait]
impl EmbeddingProvider for FixedQueryEmbedding {
    async fn embed_batch(&self, texts: &[&str]) -> docrag::Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect())
    }

    fn dimensions(&self) -> usize {
        2
    }
}

/// Counts generation calls and records the last prompt.
#[derive(Default)]
struct CapturingGeneration {
    calls: AtomicUsize,
    last_prompt: Mutex<String>,
}

#[async_trait]
impl GenerationProvider for CapturingGeneration {
    async fn generate(&self, prompt: &str) -> docrag::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_prompt.lock().unwrap() = prompt.to_string();
        Ok("generated answer".to_string())
    }
}

/// Always fails with a credentials rejection.
struct AuthFailingGeneration;

#[async_trait]
impl GenerationProvider for AuthFailingGeneration {
    async fn generate(&self, _prompt: &str) -> docrag::Result<String> {
        Err(RagError::GenerationAuth("endpoint returned 403 Forbidden".into()))
    }
}

/// Always fails with a transient error.
struct TransientFailingGeneration;

#[async_trait]
impl GenerationProvider for TransientFailingGeneration {
    async fn generate(&self, _prompt: &str) -> docrag::Result<String> {
        Err(RagError::Generation("endpoint returned 500: upstream timeout".into()))
    }
}

/// Serves a fixed set of documents.
struct StaticLoader {
    documents: Vec<Document>,
}

impl DocumentLoader for StaticLoader {
    fn load(&self) -> docrag::Result<LoadedCorpus> {
        let sources = self
            .documents
            .iter()
            .filter_map(|d| d.metadata.get("source").cloned())
            .collect();
        Ok(LoadedCorpus { documents: self.documents.clone(), sources })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn unit(cos: f32) -> Vec<f32> {
    vec![cos, (1.0 - cos * cos).sqrt()]
}

fn source_meta(source: &str) -> HashMap<String, String> {
    HashMap::from([("source".to_string(), source.to_string())])
}

fn pipeline_with(
    store: Arc<InMemoryVectorStore>,
    embedder: Arc<dyn EmbeddingProvider>,
    generator: Arc<dyn GenerationProvider>,
) -> RagPipeline {
    let config = RagConfig::default();
    RagPipeline::builder()
        .embedding_provider(embedder)
        .vector_store(store)
        .chunker(Arc::new(RecursiveChunker::new(config.chunk_size, config.chunk_overlap)))
        .generation_provider(generator)
        .config(config)
        .build()
        .unwrap()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn threshold_filter_drops_low_scores_after_top_k_selection() {
    let store = Arc::new(InMemoryVectorStore::new());
    store.add(unit(0.9), "high relevance".into(), source_meta("a.txt")).await.unwrap();
    store.add(unit(0.05), "noise record".into(), source_meta("b.txt")).await.unwrap();
    store.add(unit(0.3), "medium relevance".into(), source_meta("c.txt")).await.unwrap();

    let generation = Arc::new(CapturingGeneration::default());
    let pipeline = pipeline_with(store, Arc::new(FixedQueryEmbedding), generation.clone());

    let result = pipeline.query("anything", true).await.unwrap();

    assert_eq!(result.sources_used, 2);
    assert_eq!(result.chunks.len(), 2);
    assert_eq!(result.chunks[0].text, "high relevance");
    assert_eq!(result.chunks[1].text, "medium relevance");
    assert_eq!(generation.calls.load(Ordering::SeqCst), 1);

    let prompt = generation.last_prompt.lock().unwrap().clone();
    let high = prompt.find("high relevance").unwrap();
    let medium = prompt.find("medium relevance").unwrap();
    assert!(high < medium, "context must be in descending score order");
    assert!(!prompt.contains("noise record"));
}

#[tokio::test]
async fn below_threshold_results_short_circuit_generation() {
    let store = Arc::new(InMemoryVectorStore::new());
    store.add(unit(0.02), "barely related".into(), source_meta("a.txt")).await.unwrap();

    let generation = Arc::new(CapturingGeneration::default());
    let pipeline = pipeline_with(store, Arc::new(FixedQueryEmbedding), generation.clone());

    let result = pipeline.query("anything", true).await.unwrap();

    assert_eq!(result.answer, NO_RELEVANT_INFORMATION);
    assert_eq!(result.sources_used, 0);
    assert!(result.chunks.is_empty());
    assert_eq!(generation.calls.load(Ordering::SeqCst), 0, "generation must not be invoked");
}

#[tokio::test]
async fn query_before_ingestion_is_an_error() {
    let pipeline = pipeline_with(
        Arc::new(InMemoryVectorStore::new()),
        Arc::new(FixedQueryEmbedding),
        Arc::new(CapturingGeneration::default()),
    );

    let err = pipeline.query("anything", false).await.unwrap_err();
    assert!(matches!(err, RagError::EmptyStore));
}

#[tokio::test]
async fn empty_corpus_fails_ingestion_but_pipeline_stays_usable() {
    let store = Arc::new(InMemoryVectorStore::new());
    let pipeline = pipeline_with(
        store.clone(),
        Arc::new(HashEmbeddingProvider { dimensions: 16 }),
        Arc::new(CapturingGeneration::default()),
    );

    let err = pipeline.ingest(&StaticLoader { documents: Vec::new() }).await.unwrap_err();
    assert!(matches!(err, RagError::EmptyCorpus));
    assert_eq!(store.len().await, 0);

    let loader = StaticLoader {
        documents: vec![Document::with_source("some real content here", "doc.txt")],
    };
    let report = pipeline.ingest(&loader).await.unwrap();
    assert_eq!(report.chunk_count, 1);
    assert_eq!(report.sources, vec!["doc.txt"]);
    assert_eq!(store.len().await, 1);
}

#[tokio::test]
async fn ingest_then_query_round_trip() {
    let store = Arc::new(InMemoryVectorStore::new());
    let generation = Arc::new(CapturingGeneration::default());
    let pipeline = pipeline_with(
        store,
        Arc::new(HashEmbeddingProvider { dimensions: 16 }),
        generation.clone(),
    );

    let text = "the capital of france is paris";
    let loader = StaticLoader { documents: vec![Document::with_source(text, "facts.txt")] };
    pipeline.ingest(&loader).await.unwrap();

    // The question embeds identically to the stored chunk, so it retrieves
    // it with similarity 1.0.
    let result = pipeline.query(text, false).await.unwrap();
    assert_eq!(result.answer, "generated answer");
    assert_eq!(result.sources_used, 1);
    assert_eq!(generation.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn auth_failure_degrades_to_a_context_answer() {
    let store = Arc::new(InMemoryVectorStore::new());
    store.add(unit(0.9), "the yearly revenue was 42 million".into(), source_meta("r.txt"))
        .await
        .unwrap();

    let pipeline =
        pipeline_with(store, Arc::new(FixedQueryEmbedding), Arc::new(AuthFailingGeneration));

    let result = pipeline.query("revenue?", false).await.unwrap();
    assert!(result.answer.starts_with("Based on the documents:"));
    assert!(result.answer.contains("the yearly revenue was 42 million"));
    assert_eq!(result.sources_used, 1);
}

#[tokio::test]
async fn transient_failure_is_reported_inside_the_answer() {
    let store = Arc::new(InMemoryVectorStore::new());
    store.add(unit(0.9), "some content".into(), source_meta("a.txt")).await.unwrap();

    let pipeline =
        pipeline_with(store, Arc::new(FixedQueryEmbedding), Arc::new(TransientFailingGeneration));

    let result = pipeline.query("anything", false).await.unwrap();
    assert!(result.answer.starts_with("Error generating answer:"));
    assert!(result.answer.contains("upstream timeout"));
}

#[tokio::test]
async fn chunk_detail_normalizes_sources_and_truncates_text() {
    let store = Arc::new(InMemoryVectorStore::new());
    let long_text = "long chunk body ".repeat(30);
    store
        .add(unit(0.9), long_text.clone(), source_meta(r"C:\docs\a.pdf"))
        .await
        .unwrap();
    store.add(unit(0.8), "short body".into(), source_meta("/tmp/b.txt")).await.unwrap();

    let pipeline = pipeline_with(
        store,
        Arc::new(FixedQueryEmbedding),
        Arc::new(CapturingGeneration::default()),
    );

    let result = pipeline.query("anything", true).await.unwrap();

    assert_eq!(result.chunks.len(), 2);
    assert_eq!(result.chunks[0].index, 1);
    assert_eq!(result.chunks[0].source, "a.pdf");
    assert!(result.chunks[0].text.ends_with("..."));
    assert_eq!(result.chunks[0].text.chars().count(), 203);
    assert_eq!(result.chunks[1].index, 2);
    assert_eq!(result.chunks[1].source, "b.txt");
    assert_eq!(result.chunks[1].text, "short body");
}
