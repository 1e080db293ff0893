//! Deterministic TF-IDF fallback embedder.
//!
//! Used when no remote embedding endpoint is available. A frequency-based
//! model needs a vocabulary built from observed data, so the provider
//! accumulates every text it has ever embedded and refits on the full
//! corpus before transforming each batch. Refitting is O(corpus size) per
//! call, which is acceptable only for small corpora; the brute-force
//! store shares the same limit.
//!
//! Because the vocabulary grows with the corpus, embedding the same text
//! at two different points in time can yield different vectors (see
//! `refit_shifts_vectors_as_corpus_grows` below). Queries and documents
//! embedded through one instance still share a single vector space at any
//! given moment.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use crate::embedding::{fit_dimension, EmbeddingProvider};
use crate::error::Result;

/// An [`EmbeddingProvider`] backed by term-frequency statistics.
///
/// Features are lowercase unigrams and bigrams of words with at least two
/// characters; the vocabulary is capped at `dimensions` terms ordered by
/// corpus frequency (ties broken alphabetically). Rows are weighted by
/// smoothed inverse document frequency and L2-normalized, then padded or
/// truncated to exactly `dimensions` components. Fully deterministic.
pub struct TfIdfEmbeddingProvider {
    dimensions: usize,
    state: Mutex<FitState>,
}

/// Accumulated corpus; instance-scoped so separate pipelines never share
/// vocabulary.
#[derive(Default)]
struct FitState {
    corpus: Vec<String>,
}

impl TfIdfEmbeddingProvider {
    /// Create a new provider producing vectors of the given dimension.
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions, state: Mutex::new(FitState::default()) }
    }
}

#[async_trait]
impl EmbeddingProvider for TfIdfEmbeddingProvider {
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut state = self.state.lock().await;
        state.corpus.extend(texts.iter().map(|t| t.to_string()));

        debug!(batch_size = texts.len(), corpus_size = state.corpus.len(), "refitting TF-IDF");
        let model = TfIdfModel::fit(&state.corpus, self.dimensions);

        Ok(texts
            .iter()
            .map(|text| fit_dimension(model.transform(text), self.dimensions))
            .collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

/// A fitted vocabulary: terms in alphabetical order, each with its
/// smoothed IDF weight.
struct TfIdfModel {
    vocabulary: Vec<(String, f32)>,
}

impl TfIdfModel {
    fn fit(corpus: &[String], max_features: usize) -> Self {
        let mut total_counts: HashMap<String, usize> = HashMap::new();
        let mut document_frequencies: HashMap<String, usize> = HashMap::new();

        for document in corpus {
            let counts = term_counts(document);
            for (term, count) in counts {
                *total_counts.entry(term.clone()).or_insert(0) += count;
                *document_frequencies.entry(term).or_insert(0) += 1;
            }
        }

        // Keep the most frequent terms; ties resolve alphabetically so the
        // vocabulary is stable across runs.
        let mut terms: Vec<(String, usize)> = total_counts.into_iter().collect();
        terms.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        terms.truncate(max_features);

        let mut selected: Vec<String> = terms.into_iter().map(|(term, _)| term).collect();
        selected.sort();

        let document_count = corpus.len() as f32;
        let vocabulary = selected
            .into_iter()
            .map(|term| {
                let df = document_frequencies[&term] as f32;
                let idf = ((1.0 + document_count) / (1.0 + df)).ln() + 1.0;
                (term, idf)
            })
            .collect();

        Self { vocabulary }
    }

    fn transform(&self, text: &str) -> Vec<f32> {
        let counts = term_counts(text);
        let mut vector: Vec<f32> = self
            .vocabulary
            .iter()
            .map(|(term, idf)| counts.get(term).copied().unwrap_or(0) as f32 * idf)
            .collect();

        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for value in &mut vector {
                *value /= norm;
            }
        }
        vector
    }
}

/// Count unigram and bigram occurrences in a text.
fn term_counts(text: &str) -> HashMap<String, usize> {
    let words: Vec<String> = text
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() >= 2)
        .map(|w| w.to_string())
        .collect();

    let mut counts = HashMap::new();
    for word in &words {
        *counts.entry(word.clone()).or_insert(0) += 1;
    }
    for pair in words.windows(2) {
        *counts.entry(format!("{} {}", pair[0], pair[1])).or_insert(0) += 1;
    }
    counts
}
