use std::path::Path;
use std::sync::Mutex;

use rusqlite::{params, Connection};
use uuid::Uuid;

use super::types::{TextChunk, VectorStore};
use super::IngestError;
use crate::pipeline::retrieval::{cosine_similarity, RetrievalError, ScoredChunk, VectorSearch};

/// SQLite-backed vector store. Embeddings are stored as little-endian
/// f32 blobs; similarity search scans the table and scores in process,
/// which is plenty for catalog-scale knowledge bases.
pub struct SqliteVectorStore {
    conn: Mutex<Connection>,
    dimension: usize,
}

impl SqliteVectorStore {
    pub fn open(path: &Path, dimension: usize) -> Result<Self, IngestError> {
        let conn = Connection::open(path).map_err(|e| IngestError::Upstream {
            ingested: 0,
            reason: e.to_string(),
        })?;
        Self::with_connection(conn, dimension)
    }

    pub fn open_memory(dimension: usize) -> Result<Self, IngestError> {
        let conn = Connection::open_in_memory().map_err(|e| IngestError::Upstream {
            ingested: 0,
            reason: e.to_string(),
        })?;
        Self::with_connection(conn, dimension)
    }

    fn with_connection(conn: Connection, dimension: usize) -> Result<Self, IngestError> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS chunks (
                id          TEXT PRIMARY KEY,
                source      TEXT NOT NULL,
                content     TEXT NOT NULL,
                chunk_index INTEGER NOT NULL,
                embedding   BLOB NOT NULL
            );",
        )
        .map_err(|e| IngestError::Upstream {
            ingested: 0,
            reason: e.to_string(),
        })?;
        Ok(Self {
            conn: Mutex::new(conn),
            dimension,
        })
    }

    fn check_dimension(&self, embedding: &[f32]) -> Result<(), IngestError> {
        if embedding.len() != self.dimension {
            return Err(IngestError::Upstream {
                ingested: 0,
                reason: format!(
                    "embedding dimension mismatch: expected {}, got {}",
                    self.dimension,
                    embedding.len()
                ),
            });
        }
        Ok(())
    }
}

fn encode_embedding(embedding: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(embedding.len() * 4);
    for value in embedding {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

fn decode_embedding(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect()
}

impl VectorStore for SqliteVectorStore {
    fn store_chunks(
        &self,
        chunks: &[TextChunk],
        embeddings: &[Vec<f32>],
        source: &str,
    ) -> Result<usize, IngestError> {
        if chunks.len() != embeddings.len() {
            return Err(IngestError::Upstream {
                ingested: 0,
                reason: "chunk count does not match embedding count".into(),
            });
        }
        for embedding in embeddings {
            self.check_dimension(embedding)?;
        }

        let conn = self.conn.lock().map_err(|_| IngestError::Upstream {
            ingested: 0,
            reason: "vector store lock poisoned".into(),
        })?;

        for (chunk, embedding) in chunks.iter().zip(embeddings.iter()) {
            conn.execute(
                "INSERT INTO chunks (id, source, content, chunk_index, embedding)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    Uuid::new_v4().to_string(),
                    source,
                    chunk.content,
                    chunk.chunk_index as i64,
                    encode_embedding(embedding),
                ],
            )
            .map_err(|e| IngestError::Upstream {
                ingested: 0,
                reason: e.to_string(),
            })?;
        }

        Ok(chunks.len())
    }

    fn count(&self) -> Result<usize, IngestError> {
        let conn = self.conn.lock().map_err(|_| IngestError::Upstream {
            ingested: 0,
            reason: "vector store lock poisoned".into(),
        })?;
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM chunks", [], |row| row.get(0))
            .map_err(|e| IngestError::Upstream {
                ingested: 0,
                reason: e.to_string(),
            })?;
        Ok(count as usize)
    }
}

impl VectorSearch for SqliteVectorStore {
    fn search(
        &self,
        query_embedding: &[f32],
        threshold: f32,
        top_k: usize,
    ) -> Result<Vec<ScoredChunk>, RetrievalError> {
        if query_embedding.len() != self.dimension {
            return Err(RetrievalError::DimensionMismatch {
                expected: self.dimension,
                got: query_embedding.len(),
            });
        }

        let conn = self
            .conn
            .lock()
            .map_err(|_| RetrievalError::Store("vector store lock poisoned".into()))?;

        let mut stmt = conn
            .prepare("SELECT content, source, embedding FROM chunks")
            .map_err(|e| RetrievalError::Store(e.to_string()))?;
        let rows = stmt
            .query_map([], |row| {
                let content: String = row.get(0)?;
                let source: String = row.get(1)?;
                let embedding: Vec<u8> = row.get(2)?;
                Ok((content, source, embedding))
            })
            .map_err(|e| RetrievalError::Store(e.to_string()))?;

        let mut scored: Vec<ScoredChunk> = Vec::new();
        for row in rows {
            let (content, source, embedding_bytes) =
                row.map_err(|e| RetrievalError::Store(e.to_string()))?;
            let embedding = decode_embedding(&embedding_bytes);
            let similarity = cosine_similarity(query_embedding, &embedding);
            if similarity >= threshold {
                scored.push(ScoredChunk {
                    content,
                    similarity,
                    source,
                });
            }
        }

        scored.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(top_k);
        Ok(scored)
    }
}

/// In-memory vector store for tests.
pub struct InMemoryVectorStore {
    entries: Mutex<Vec<StoredChunk>>,
    dimension: usize,
}

struct StoredChunk {
    content: String,
    source: String,
    embedding: Vec<f32>,
}

impl InMemoryVectorStore {
    pub fn new(dimension: usize) -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            dimension,
        }
    }
}

impl VectorStore for InMemoryVectorStore {
    fn store_chunks(
        &self,
        chunks: &[TextChunk],
        embeddings: &[Vec<f32>],
        source: &str,
    ) -> Result<usize, IngestError> {
        if chunks.len() != embeddings.len() {
            return Err(IngestError::Upstream {
                ingested: 0,
                reason: "chunk count does not match embedding count".into(),
            });
        }
        let mut entries = self.entries.lock().map_err(|_| IngestError::Upstream {
            ingested: 0,
            reason: "vector store lock poisoned".into(),
        })?;
        for (chunk, embedding) in chunks.iter().zip(embeddings.iter()) {
            if embedding.len() != self.dimension {
                return Err(IngestError::Upstream {
                    ingested: 0,
                    reason: format!(
                        "embedding dimension mismatch: expected {}, got {}",
                        self.dimension,
                        embedding.len()
                    ),
                });
            }
            entries.push(StoredChunk {
                content: chunk.content.clone(),
                source: source.to_string(),
                embedding: embedding.clone(),
            });
        }
        Ok(chunks.len())
    }

    fn count(&self) -> Result<usize, IngestError> {
        let entries = self.entries.lock().map_err(|_| IngestError::Upstream {
            ingested: 0,
            reason: "vector store lock poisoned".into(),
        })?;
        Ok(entries.len())
    }
}

impl VectorSearch for InMemoryVectorStore {
    fn search(
        &self,
        query_embedding: &[f32],
        threshold: f32,
        top_k: usize,
    ) -> Result<Vec<ScoredChunk>, RetrievalError> {
        if query_embedding.len() != self.dimension {
            return Err(RetrievalError::DimensionMismatch {
                expected: self.dimension,
                got: query_embedding.len(),
            });
        }

        let entries = self
            .entries
            .lock()
            .map_err(|_| RetrievalError::Store("vector store lock poisoned".into()))?;
        let mut scored: Vec<ScoredChunk> = entries
            .iter()
            .filter_map(|entry| {
                let similarity = cosine_similarity(query_embedding, &entry.embedding);
                (similarity >= threshold).then(|| ScoredChunk {
                    content: entry.content.clone(),
                    similarity,
                    source: entry.source.clone(),
                })
            })
            .collect();

        scored.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(top_k);
        Ok(scored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_chunks(n: usize) -> Vec<TextChunk> {
        (0..n)
            .map(|i| TextChunk {
                content: format!("Chunk {i} content"),
                chunk_index: i,
                char_offset: i * 100,
            })
            .collect()
    }

    fn make_embeddings(n: usize, dim: usize) -> Vec<Vec<f32>> {
        (0..n)
            .map(|i| {
                let mut v = vec![0.0; dim];
                v[i % dim] = 1.0;
                v
            })
            .collect()
    }

    #[test]
    fn sqlite_store_and_count() {
        let store = SqliteVectorStore::open_memory(8).unwrap();
        let stored = store
            .store_chunks(&make_chunks(5), &make_embeddings(5, 8), "handbook")
            .unwrap();
        assert_eq!(stored, 5);
        assert_eq!(store.count().unwrap(), 5);
    }

    #[test]
    fn sqlite_store_rejects_wrong_dimension() {
        let store = SqliteVectorStore::open_memory(8).unwrap();
        let result = store.store_chunks(&make_chunks(1), &make_embeddings(1, 4), "s");
        assert!(matches!(result, Err(IngestError::Upstream { .. })));
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn sqlite_store_rejects_mismatched_counts() {
        let store = SqliteVectorStore::open_memory(8).unwrap();
        let result = store.store_chunks(&make_chunks(3), &make_embeddings(2, 8), "s");
        assert!(result.is_err());
    }

    #[test]
    fn sqlite_search_filters_by_threshold_and_sorts() {
        let store = SqliteVectorStore::open_memory(4).unwrap();
        let chunks = make_chunks(3);
        let embeddings = vec![
            vec![1.0, 0.0, 0.0, 0.0],
            vec![0.8, 0.6, 0.0, 0.0],
            vec![0.0, 0.0, 1.0, 0.0],
        ];
        store.store_chunks(&chunks, &embeddings, "kb").unwrap();

        let results = store.search(&[1.0, 0.0, 0.0, 0.0], 0.5, 10).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].content, "Chunk 0 content");
        assert!(results[0].similarity > results[1].similarity);
        for r in &results {
            assert!(r.similarity >= 0.5);
        }
    }

    #[test]
    fn sqlite_search_rejects_wrong_query_dimension() {
        let store = SqliteVectorStore::open_memory(4).unwrap();
        let result = store.search(&[1.0, 0.0], 0.0, 5);
        assert!(matches!(
            result,
            Err(RetrievalError::DimensionMismatch { expected: 4, got: 2 })
        ));
    }

    #[test]
    fn sqlite_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vectors.db");
        {
            let store = SqliteVectorStore::open(&path, 4).unwrap();
            store
                .store_chunks(&make_chunks(2), &make_embeddings(2, 4), "kb")
                .unwrap();
        }
        let store = SqliteVectorStore::open(&path, 4).unwrap();
        assert_eq!(store.count().unwrap(), 2);
    }

    #[test]
    fn embedding_blob_roundtrip() {
        let original = vec![0.25f32, -1.5, 3.75, 0.0];
        assert_eq!(decode_embedding(&encode_embedding(&original)), original);
    }

    #[test]
    fn in_memory_store_matches_contract() {
        let store = InMemoryVectorStore::new(4);
        store
            .store_chunks(&make_chunks(2), &make_embeddings(2, 4), "kb")
            .unwrap();
        assert_eq!(store.count().unwrap(), 2);

        let results = store.search(&[1.0, 0.0, 0.0, 0.0], 0.9, 10).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].source, "kb");
    }
}
