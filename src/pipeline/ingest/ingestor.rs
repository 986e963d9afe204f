use tracing::{debug, info};

use super::types::{Chunker, IngestReport, VectorStore};
use super::IngestError;
use crate::oracle::embedding::EmbeddingModel;

/// Split a document into chunks, embed each one, and persist the pairs
/// under `source`. Chunks are embedded and stored one at a time so a
/// mid-run failure reports exactly how far ingestion got.
pub fn ingest(
    text: &str,
    source: &str,
    chunker: &dyn Chunker,
    embedder: &dyn EmbeddingModel,
    store: &dyn VectorStore,
) -> Result<IngestReport, IngestError> {
    if text.trim().is_empty() {
        return Err(IngestError::Validation("Document text is empty".into()));
    }
    if source.trim().is_empty() {
        return Err(IngestError::Validation(
            "Source reference is required".into(),
        ));
    }

    let chunks = chunker.chunk(text);
    debug!(source, chunk_count = chunks.len(), "Chunked document");

    let mut ingested = 0usize;
    for chunk in &chunks {
        let embedding = embedder
            .embed(&chunk.content)
            .map_err(|e| IngestError::Upstream {
                ingested,
                reason: e.to_string(),
            })?;
        store
            .store_chunks(std::slice::from_ref(chunk), &[embedding], source)
            .map_err(|e| match e {
                IngestError::Upstream { reason, .. } => IngestError::Upstream { ingested, reason },
                other => other,
            })?;
        ingested += 1;
    }

    info!(source, chunks = ingested, "Document ingested");
    Ok(IngestReport {
        chunks_ingested: ingested,
    })
}
