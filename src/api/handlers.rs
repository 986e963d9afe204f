use axum::extract::{Query, State};
use axum::Json;
use uuid::Uuid;

use crate::config;
use crate::db::repository::{insert_candidate, recent_runs, search_candidates};
use crate::db::repository::candidate_search::CandidateSearchResult;
use crate::models::{CandidateRecord, RunLogEntry};
use crate::pipeline::ingest::chunker::OverlapChunker;
use crate::pipeline::ingest::ingest;
use crate::pipeline::orchestrator::{MatchPipeline, PipelineOutcome, PipelineRequest};

use super::error::ApiError;
use super::types::{
    ApiContext, HealthResponse, IngestRequest, IngestResponse, NewCandidateRequest, RunsQuery,
    SearchRequest,
};

/// The pipeline stack is synchronous (blocking SQLite and HTTP clients),
/// so every handler hops onto the blocking pool.
async fn run_blocking<T, F>(task: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| ApiError::Internal(format!("blocking task failed: {e}")))?
}

fn lock_catalog(
    ctx: &ApiContext,
) -> Result<std::sync::MutexGuard<'_, rusqlite::Connection>, ApiError> {
    ctx.catalog
        .lock()
        .map_err(|_| ApiError::Internal("catalog lock poisoned".into()))
}

/// `GET /api/health`
pub async fn health(State(ctx): State<ApiContext>) -> Json<HealthResponse> {
    let llm = ctx.llm.clone();
    let llm_available = tokio::task::spawn_blocking(move || llm.is_available())
        .await
        .unwrap_or(false);

    Json(HealthResponse {
        status: "ok",
        version: config::APP_VERSION,
        llm_available,
    })
}

/// `POST /api/ingest` — chunk, embed, and store a document.
pub async fn ingest_document(
    State(ctx): State<ApiContext>,
    Json(request): Json<IngestRequest>,
) -> Result<Json<IngestResponse>, ApiError> {
    run_blocking(move || {
        let chunker = OverlapChunker::new();
        let report = ingest(
            &request.text,
            &request.source,
            &chunker,
            ctx.embedder.as_ref(),
            ctx.vectors.as_ref(),
        )?;
        Ok(Json(IngestResponse {
            success: true,
            message: format!(
                "Ingested {} chunks from {}",
                report.chunks_ingested, request.source
            ),
            chunks_ingested: report.chunks_ingested,
        }))
    })
    .await
}

/// `POST /api/candidates/search` — structured filter search with
/// distribution statistics.
pub async fn search(
    State(ctx): State<ApiContext>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<CandidateSearchResult>, ApiError> {
    run_blocking(move || {
        let (filter, limit) = request.into_filter();
        let conn = lock_catalog(&ctx)?;
        let result = search_candidates(
            &conn,
            &filter,
            limit.unwrap_or(config::DEFAULT_SEARCH_LIMIT),
        )?;
        Ok(Json(result))
    })
    .await
}

/// `POST /api/candidates` — add a provider to the catalog.
pub async fn create_candidate(
    State(ctx): State<ApiContext>,
    Json(request): Json<NewCandidateRequest>,
) -> Result<Json<CandidateRecord>, ApiError> {
    run_blocking(move || {
        if request.name.trim().is_empty() {
            return Err(ApiError::BadRequest("name is required".into()));
        }
        let candidate = CandidateRecord {
            id: Uuid::new_v4(),
            name: request.name.trim().to_string(),
            business_tag: request.business_tag,
            department: request.department,
            size_band: request.size_band,
            industry: request.industry,
            region: request.region,
            description: request.description,
            challenges_solved: request.challenges_solved,
            tags: request.tags,
        };
        let conn = lock_catalog(&ctx)?;
        insert_candidate(&conn, &candidate)?;
        Ok(Json(candidate))
    })
    .await
}

/// `POST /api/pipeline` — run the full extract/persist/match pipeline.
pub async fn run_pipeline(
    State(ctx): State<ApiContext>,
    Json(request): Json<PipelineRequest>,
) -> Result<Json<PipelineOutcome>, ApiError> {
    run_blocking(move || {
        // The pipeline takes the mutex itself and locks per repository
        // call, keeping the catalog available while an oracle call waits.
        let pipeline = MatchPipeline::new(
            ctx.llm.as_ref(),
            ctx.embedder.as_ref(),
            ctx.vectors.as_ref(),
            ctx.catalog.as_ref(),
        );
        let outcome = pipeline.run(&request)?;
        Ok(Json(outcome))
    })
    .await
}

/// `GET /api/runs?limit=N` — recent execution-log entries, newest first.
pub async fn list_runs(
    State(ctx): State<ApiContext>,
    Query(query): Query<RunsQuery>,
) -> Result<Json<Vec<RunLogEntry>>, ApiError> {
    run_blocking(move || {
        let conn = lock_catalog(&ctx)?;
        let runs = recent_runs(&conn, query.limit.unwrap_or(config::DEFAULT_SEARCH_LIMIT))?;
        Ok(Json(runs))
    })
    .await
}
