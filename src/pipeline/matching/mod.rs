pub mod external;
pub mod rag;
pub mod structured;

pub use external::*;
pub use rag::*;
pub use structured::*;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db::DatabaseError;
use crate::models::MatchResult;
use crate::oracle::OracleError;
use crate::pipeline::retrieval::RetrievalError;

#[derive(Error, Debug)]
pub enum MatchError {
    #[error("Matching oracle error: {0}")]
    Oracle(#[from] OracleError),

    #[error("Catalog error during matching: {0}")]
    Database(#[from] DatabaseError),

    #[error("Retrieval error during matching: {0}")]
    Retrieval(#[from] RetrievalError),
}

/// Caller-selected matching strategy; the orchestrator dispatches on this
/// and is otherwise strategy-agnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchStrategy {
    #[serde(rename = "external-generative")]
    ExternalGenerative,
    #[serde(rename = "catalog-internal-structured")]
    CatalogStructured,
    #[serde(rename = "retrieval-augmented-generative")]
    RetrievalAugmented,
}

impl Default for MatchStrategy {
    fn default() -> Self {
        MatchStrategy::ExternalGenerative
    }
}

/// Normalized result shape shared by all three strategies.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchOutcome {
    pub matches: Vec<MatchResult>,
    pub total_matches: usize,
    pub data_source: String,
    /// Narrative suggestions, only produced by the retrieval-augmented
    /// strategy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<String>,
}

pub(crate) const SOURCE_EXTERNAL_CATALOG: &str = "external-catalog";
pub(crate) const SOURCE_INTERNAL_CATALOG: &str = "internal-catalog";
pub(crate) const SOURCE_KNOWLEDGE_BASE: &str = "knowledge-base";
