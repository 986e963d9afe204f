use serde::{Deserialize, Serialize};

use super::IngestError;

/// A bounded text segment produced by splitting a longer document.
#[derive(Debug, Clone)]
pub struct TextChunk {
    pub content: String,
    pub chunk_index: usize,
    pub char_offset: usize,
}

/// Chunking strategy trait
pub trait Chunker {
    fn chunk(&self, text: &str) -> Vec<TextChunk>;
}

/// Write half of the vector store contract: persist chunks with their
/// embeddings under a source reference. Implementations enforce the
/// deployment embedding dimension.
pub trait VectorStore {
    fn store_chunks(
        &self,
        chunks: &[TextChunk],
        embeddings: &[Vec<f32>],
        source: &str,
    ) -> Result<usize, IngestError>;

    fn count(&self) -> Result<usize, IngestError>;
}

/// Outcome of one ingestion call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestReport {
    pub chunks_ingested: usize,
}
