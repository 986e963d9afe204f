use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use super::handlers;
use super::types::ApiContext;

/// Build the HTTP router. All routes are nested under `/api/`.
pub fn api_router(ctx: ApiContext) -> Router {
    let api = Router::new()
        .route("/health", get(handlers::health))
        .route("/ingest", post(handlers::ingest_document))
        .route("/candidates", post(handlers::create_candidate))
        .route("/candidates/search", post(handlers::search))
        .route("/pipeline", post(handlers::run_pipeline))
        .route("/runs", get(handlers::list_runs))
        .with_state(ctx);

    Router::new()
        .nest("/api", api)
        .layer(CorsLayer::permissive())
}
