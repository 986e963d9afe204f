use std::sync::Mutex;

use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use uuid::Uuid;

use crate::db::repository::insert_challenge;
use crate::db::sqlite::lock_connection;
use crate::models::{AnalysisOutcome, MatchResult, RunLogEntry};
use crate::oracle::embedding::EmbeddingModel;
use crate::oracle::llm::LlmClient;
use crate::pipeline::extraction::{extract_challenges, ExtractionError};
use crate::pipeline::matching::{
    match_catalog_structured, match_external_generative, match_retrieval_augmented, MatchError,
    MatchOutcome, MatchStrategy, RagArtifacts,
};
use crate::pipeline::retrieval::VectorSearch;
use crate::pipeline::run_log::RunLogger;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Success,
    Error,
}

/// One stage's outcome, accumulated across the run regardless of result.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepRecord {
    pub step: String,
    pub status: StepStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl StepRecord {
    fn success(step: &str, detail: Option<String>) -> Self {
        Self {
            step: step.to_string(),
            status: StepStatus::Success,
            detail,
        }
    }

    fn error(step: &str, detail: String) -> Self {
        Self {
            step: step.to_string(),
            status: StepStatus::Error,
            detail: Some(detail),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineRequest {
    #[serde(default)]
    pub company_name: String,
    #[serde(default)]
    pub conversation_data: String,
    #[serde(default)]
    pub source_url: String,
    #[serde(default)]
    pub matching_method: Option<MatchStrategy>,
}

#[derive(Error, Debug)]
pub enum PipelineError {
    /// Rejected before any stage ran: no steps, no side effects, no log.
    #[error("{0}")]
    Validation(String),

    /// A fatal stage failure. Carries the steps accumulated up to and
    /// including the failing one.
    #[error("{message}")]
    Upstream {
        message: String,
        steps: Vec<StepRecord>,
    },
}

/// Successful run envelope: the extraction result, the matching result,
/// and every step record. Degraded extraction and failed persistence are
/// warnings inside this shape, not failures.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineOutcome {
    pub success: bool,
    pub challenge_id: Uuid,
    pub extracted_challenges: Vec<String>,
    pub challenge_analysis: AnalysisOutcome,
    pub matches: Vec<MatchResult>,
    pub total_matches: usize,
    pub data_source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<String>,
    pub steps: Vec<StepRecord>,
}

fn apply_artifacts(entry: &mut RunLogEntry, artifacts: RagArtifacts) {
    entry.query = Some(artifacts.query);
    entry.retrieved_documents = serde_json::to_string(&artifacts.retrieved).ok();
    entry.assembled_prompt = artifacts.prompt;
}

/// Extract → Persist → Match → Aggregate, strategy-agnostic beyond the
/// match dispatch. Dependencies are injected so tests substitute fakes.
///
/// The catalog mutex is locked only around individual repository calls;
/// it is never held across an oracle round trip, so concurrent runs can
/// interleave their database work with each other's generation waits.
pub struct MatchPipeline<'a> {
    llm: &'a dyn LlmClient,
    embedder: &'a dyn EmbeddingModel,
    vectors: &'a dyn VectorSearch,
    catalog: &'a Mutex<Connection>,
}

impl<'a> MatchPipeline<'a> {
    pub fn new(
        llm: &'a dyn LlmClient,
        embedder: &'a dyn EmbeddingModel,
        vectors: &'a dyn VectorSearch,
        catalog: &'a Mutex<Connection>,
    ) -> Self {
        Self {
            llm,
            embedder,
            vectors,
            catalog,
        }
    }

    fn record_log(&self, entry: &RunLogEntry) {
        let conn = lock_connection(self.catalog);
        RunLogger::new(&conn).record(entry);
    }

    pub fn run(&self, request: &PipelineRequest) -> Result<PipelineOutcome, PipelineError> {
        if request.company_name.trim().is_empty() {
            return Err(PipelineError::Validation("companyName is required".into()));
        }
        if request.conversation_data.trim().is_empty() {
            return Err(PipelineError::Validation(
                "conversationData is required".into(),
            ));
        }

        let strategy = request.matching_method.unwrap_or_default();
        let payload =
            serde_json::to_string(request).unwrap_or_else(|_| "{}".to_string());
        let mut log_entry = RunLogEntry::new(payload);
        let mut steps: Vec<StepRecord> = Vec::new();

        let span = tracing::info_span!("pipeline_run", company = %request.company_name);
        let _guard = span.enter();
        info!(?strategy, "Pipeline run started");

        // Extract. Oracle unavailability is the only fatal condition here;
        // unparseable output already degraded inside the extractor.
        let challenge = match extract_challenges(
            self.llm,
            &request.company_name,
            &request.conversation_data,
            &request.source_url,
        ) {
            Ok(challenge) => {
                let detail = if challenge.analysis.is_degraded() {
                    "Output could not be parsed, carrying raw text".to_string()
                } else {
                    format!("Extracted {} challenges", challenge.extracted_challenges.len())
                };
                steps.push(StepRecord::success("extract", Some(detail)));
                challenge
            }
            Err(ExtractionError::Validation(msg)) => {
                return Err(PipelineError::Validation(msg));
            }
            Err(ExtractionError::Oracle(e)) => {
                let message = e.to_string();
                steps.push(StepRecord::error("extract", message.clone()));
                log_entry.error = Some(message.clone());
                self.record_log(&log_entry);
                return Err(PipelineError::Upstream { message, steps });
            }
        };

        // Persist. Non-critical: duplicates and write failures become a
        // warning step and the run continues on the in-memory record.
        if strategy != MatchStrategy::RetrievalAugmented {
            let persisted = {
                let conn = lock_connection(self.catalog);
                insert_challenge(&conn, &challenge)
            };
            match persisted {
                Ok(()) => steps.push(StepRecord::success("persist", None)),
                Err(e) => {
                    warn!(error = %e, "Challenge persistence failed, continuing");
                    steps.push(StepRecord::error("persist", e.to_string()));
                }
            }
        }

        // Match.
        let mut rag_artifacts: Option<RagArtifacts> = None;
        let match_result: Result<MatchOutcome, MatchError> = match strategy {
            MatchStrategy::ExternalGenerative => {
                match_external_generative(self.catalog, self.llm, &challenge)
            }
            MatchStrategy::CatalogStructured => {
                let conn = lock_connection(self.catalog);
                match_catalog_structured(&conn, &challenge)
            }
            MatchStrategy::RetrievalAugmented => {
                match match_retrieval_augmented(self.llm, self.embedder, self.vectors, &challenge)
                {
                    Ok((outcome, artifacts)) => {
                        rag_artifacts = Some(artifacts);
                        Ok(outcome)
                    }
                    Err((e, artifacts)) => {
                        rag_artifacts = artifacts;
                        Err(e)
                    }
                }
            }
        };
        let outcome = match match_result {
            Ok(outcome) => {
                steps.push(StepRecord::success(
                    "match",
                    Some(format!(
                        "{} matches via {}",
                        outcome.total_matches, outcome.data_source
                    )),
                ));
                outcome
            }
            Err(e) => {
                let message = e.to_string();
                steps.push(StepRecord::error("match", message.clone()));
                log_entry.error = Some(message.clone());
                // Whatever retrieval produced before the failure still
                // belongs in the log.
                if let Some(artifacts) = rag_artifacts.take() {
                    apply_artifacts(&mut log_entry, artifacts);
                }
                self.record_log(&log_entry);
                return Err(PipelineError::Upstream { message, steps });
            }
        };

        // Aggregate, then write the log exactly once.
        steps.push(StepRecord::success("aggregate", None));
        let result = PipelineOutcome {
            success: true,
            challenge_id: challenge.id,
            extracted_challenges: challenge.extracted_challenges,
            challenge_analysis: challenge.analysis,
            matches: outcome.matches,
            total_matches: outcome.total_matches,
            data_source: outcome.data_source,
            suggestions: outcome.suggestions,
            steps,
        };

        if let Some(artifacts) = rag_artifacts {
            apply_artifacts(&mut log_entry, artifacts);
        }
        log_entry.result = serde_json::to_string(&result).ok();
        self.record_log(&log_entry);

        info!(total_matches = result.total_matches, "Pipeline run finished");
        Ok(result)
    }
}
