pub mod embedding;
pub mod llm;

pub use embedding::*;
pub use llm::*;

use thiserror::Error;

/// Failures talking to the generation or embedding oracle.
///
/// Every variant is an upstream condition from the pipeline's point of
/// view — the caller decides whether it is fatal for the current stage.
#[derive(Error, Debug)]
pub enum OracleError {
    #[error("Oracle is not reachable at {0}")]
    Connection(String),

    #[error("Oracle request timed out after {0}s")]
    Timeout(u64),

    #[error("Oracle returned error (status {status}): {body}")]
    Upstream { status: u16, body: String },

    #[error("Response parsing error: {0}")]
    ResponseParsing(String),

    #[error("Embedding dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },
}
