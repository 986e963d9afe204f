use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "Solvematch";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Target chunk size for ingestion, in characters.
pub const CHUNK_SIZE_CHARS: usize = 1000;

/// Overlap between consecutive chunks, in characters.
/// Must stay below `CHUNK_SIZE_CHARS`; the chunker clamps it defensively.
pub const CHUNK_OVERLAP_CHARS: usize = 200;

/// Embedding dimension. Fixed per deployment — every stored chunk and every
/// query embedding must have exactly this many components.
pub const EMBEDDING_DIM: usize = 768;

/// Minimum cosine similarity for a chunk to count as relevant context.
pub const DEFAULT_MATCH_THRESHOLD: f32 = 0.5;

/// How many chunks the retrieval step feeds into the generation prompt.
pub const DEFAULT_TOP_K: usize = 5;

/// Upper bound on ranked matches returned by a single matching call.
pub const MAX_MATCHES: usize = 5;

/// Default row cap for structured candidate search.
pub const DEFAULT_SEARCH_LIMIT: usize = 20;

/// Oracle request timeout in seconds. Bounds the Extract stage — an
/// extraction call that runs past this is treated as an upstream failure.
pub const ORACLE_TIMEOUT_SECS: u64 = 300;

/// Default HTTP port for the API server.
pub const DEFAULT_PORT: u16 = 8787;

/// Get the application data directory (~/Solvematch/)
pub fn app_data_dir() -> PathBuf {
    let home = dirs::home_dir().expect("Cannot determine home directory");
    home.join(APP_NAME)
}

/// Catalog store database path
pub fn catalog_db_path() -> PathBuf {
    app_data_dir().join("catalog.db")
}

/// Vector store database path
pub fn vector_db_path() -> PathBuf {
    app_data_dir().join("vectors.db")
}

pub fn default_log_filter() -> String {
    "info,solvematch=debug".to_string()
}
