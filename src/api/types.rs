use std::sync::{Arc, Mutex};

use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::models::CandidateFilter;
use crate::oracle::embedding::EmbeddingModel;
use crate::oracle::llm::LlmClient;
use crate::pipeline::ingest::store::SqliteVectorStore;

/// Shared state for all API routes: the two stores plus the injected
/// oracle clients. Cheap to clone, everything is behind an Arc.
#[derive(Clone)]
pub struct ApiContext {
    pub catalog: Arc<Mutex<Connection>>,
    pub vectors: Arc<SqliteVectorStore>,
    pub llm: Arc<dyn LlmClient>,
    pub embedder: Arc<dyn EmbeddingModel>,
}

impl ApiContext {
    pub fn new(
        catalog: Connection,
        vectors: SqliteVectorStore,
        llm: Arc<dyn LlmClient>,
        embedder: Arc<dyn EmbeddingModel>,
    ) -> Self {
        Self {
            catalog: Arc::new(Mutex::new(catalog)),
            vectors: Arc::new(vectors),
            llm,
            embedder,
        }
    }
}

/// Accepts either a single string or a list; catalog clients send both.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            OneOrMany::One(s) => vec![s],
            OneOrMany::Many(v) => v,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestRequest {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub source: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestResponse {
    pub success: bool,
    pub message: String,
    pub chunks_ingested: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub business_tag: Option<String>,
    pub department: Option<String>,
    pub size_band: Option<String>,
    pub symptoms: Option<OneOrMany>,
    pub limit: Option<usize>,
}

impl SearchRequest {
    pub fn into_filter(self) -> (CandidateFilter, Option<usize>) {
        let filter = CandidateFilter {
            business_tag: self.business_tag,
            department: self.department,
            size_band: self.size_band,
            symptoms: self.symptoms.map(OneOrMany::into_vec).unwrap_or_default(),
        };
        (filter, self.limit)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCandidateRequest {
    pub name: String,
    #[serde(default)]
    pub business_tag: String,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub size_band: String,
    #[serde(default)]
    pub industry: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub challenges_solved: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct RunsQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub llm_available: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symptoms_accept_single_string_or_list() {
        let single: SearchRequest =
            serde_json::from_str(r#"{"symptoms": "churn"}"#).unwrap();
        let (filter, _) = single.into_filter();
        assert_eq!(filter.symptoms, vec!["churn"]);

        let many: SearchRequest =
            serde_json::from_str(r#"{"symptoms": ["churn", "slow sales"]}"#).unwrap();
        let (filter, _) = many.into_filter();
        assert_eq!(filter.symptoms, vec!["churn", "slow sales"]);
    }

    #[test]
    fn absent_filters_deserialize_as_none() {
        let request: SearchRequest = serde_json::from_str("{}").unwrap();
        let (filter, limit) = request.into_filter();
        assert!(filter.is_empty());
        assert!(limit.is_none());
    }
}
