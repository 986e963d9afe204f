use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::oracle::{EmbeddingModel, OracleError};

#[derive(Error, Debug)]
pub enum RetrievalError {
    #[error("Embedding generation failed: {0}")]
    Embedding(#[from] OracleError),

    #[error("Vector store error: {0}")]
    Store(String),

    #[error("Query embedding dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },
}

/// A retrieved chunk with its cosine similarity to the query.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredChunk {
    pub content: String,
    pub similarity: f32,
    pub source: String,
}

/// Read half of the vector store contract: thresholded nearest-neighbor
/// search. Results are similarity-descending and every similarity is at
/// or above the supplied threshold.
pub trait VectorSearch {
    fn search(
        &self,
        query_embedding: &[f32],
        threshold: f32,
        top_k: usize,
    ) -> Result<Vec<ScoredChunk>, RetrievalError>;
}

/// Embed a query with the same model as ingestion and run a thresholded
/// nearest-neighbor search. An empty result is Ok, not an error.
pub fn retrieve(
    query: &str,
    embedder: &dyn EmbeddingModel,
    store: &dyn VectorSearch,
    threshold: f32,
    top_k: usize,
) -> Result<Vec<ScoredChunk>, RetrievalError> {
    let query_embedding = embedder.embed(query)?;
    store.search(&query_embedding, threshold, top_k)
}

pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::MockEmbedder;
    use crate::pipeline::ingest::store::InMemoryVectorStore;
    use crate::pipeline::ingest::types::{TextChunk, VectorStore};

    fn make_chunk(content: &str) -> TextChunk {
        TextChunk {
            content: content.into(),
            chunk_index: 0,
            char_offset: 0,
        }
    }

    #[test]
    fn cosine_similarity_identical_vectors() {
        let a = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &a) - 1.0).abs() < 0.01);
    }

    #[test]
    fn cosine_similarity_orthogonal_vectors() {
        let a = vec![1.0, 0.0];
        let b = vec![0.0, 1.0];
        assert!(cosine_similarity(&a, &b).abs() < 0.01);
    }

    #[test]
    fn cosine_similarity_mismatched_dims_is_zero() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[1.0, 0.0, 0.0]), 0.0);
    }

    #[test]
    fn retrieve_returns_descending_above_threshold() {
        let embedder = MockEmbedder::with_dimension(16);
        let store = InMemoryVectorStore::new(16);

        for text in ["sales automation tips", "invoice workflow notes", "zzz"] {
            let embedding = embedder.embed(text).unwrap();
            store
                .store_chunks(&[make_chunk(text)], &[embedding], "kb")
                .unwrap();
        }

        let results = retrieve("sales automation tips", &embedder, &store, 0.5, 10).unwrap();
        assert!(!results.is_empty());
        assert_eq!(results[0].content, "sales automation tips");
        for pair in results.windows(2) {
            assert!(pair[0].similarity >= pair[1].similarity);
        }
        for r in &results {
            assert!(r.similarity >= 0.5);
        }
    }

    #[test]
    fn retrieve_with_impossible_threshold_is_empty_not_error() {
        let embedder = MockEmbedder::with_dimension(16);
        let store = InMemoryVectorStore::new(16);
        let embedding = embedder.embed("some knowledge").unwrap();
        store
            .store_chunks(&[make_chunk("some knowledge")], &[embedding], "kb")
            .unwrap();

        let results = retrieve("unrelated", &embedder, &store, 1.01, 10).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn retrieve_respects_top_k() {
        let embedder = MockEmbedder::with_dimension(16);
        let store = InMemoryVectorStore::new(16);
        for i in 0..10 {
            let text = format!("chunk number {i}");
            let embedding = embedder.embed(&text).unwrap();
            store
                .store_chunks(&[make_chunk(&text)], &[embedding], "kb")
                .unwrap();
        }

        let results = retrieve("chunk number 1", &embedder, &store, 0.0, 3).unwrap();
        assert_eq!(results.len(), 3);
    }
}
