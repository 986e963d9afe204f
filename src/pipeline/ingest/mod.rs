pub mod chunker;
pub mod ingestor;
pub mod store;
pub mod types;

pub use chunker::*;
pub use ingestor::*;
pub use store::*;
pub use types::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("{0}")]
    Validation(String),

    /// Embedding oracle or vector store failed mid-run. Carries how many
    /// chunks made it in before the failure — partial ingestion is
    /// acceptable but never silent.
    #[error("Ingestion failed after {ingested} chunks: {reason}")]
    Upstream { ingested: usize, reason: String },
}
