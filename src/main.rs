use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use solvematch::api::{start_server, ApiContext};
use solvematch::config;
use solvematch::db::sqlite::open_database;
use solvematch::oracle::embedding::OllamaEmbedder;
use solvematch::oracle::llm::OllamaClient;
use solvematch::pipeline::ingest::store::SqliteVectorStore;

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    let data_dir = config::app_data_dir();
    std::fs::create_dir_all(&data_dir)?;
    tracing::info!(path = %data_dir.display(), "Using data directory");

    let catalog = open_database(&config::catalog_db_path())?;
    let vectors = SqliteVectorStore::open(&config::vector_db_path(), config::EMBEDDING_DIM)?;

    let ollama_url = env_or("SOLVEMATCH_OLLAMA_URL", "http://localhost:11434");
    let llm_model = env_or("SOLVEMATCH_LLM_MODEL", "llama3.1");
    let embed_model = env_or("SOLVEMATCH_EMBED_MODEL", "nomic-embed-text");

    let llm = OllamaClient::new(&ollama_url, &llm_model, config::ORACLE_TIMEOUT_SECS)?;
    let embedder = OllamaEmbedder::new(
        &ollama_url,
        &embed_model,
        config::EMBEDDING_DIM,
        config::ORACLE_TIMEOUT_SECS,
    )?;
    tracing::info!(url = %ollama_url, llm = %llm_model, embed = %embed_model, "Oracle clients configured");

    let ctx = ApiContext::new(catalog, vectors, Arc::new(llm), Arc::new(embedder));

    let port: u16 = env_or("SOLVEMATCH_PORT", &config::DEFAULT_PORT.to_string())
        .parse()
        .unwrap_or(config::DEFAULT_PORT);
    let mut server = start_server(ctx, port).await?;
    tracing::info!(addr = %server.addr, "Solvematch listening");

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down");
    server.shutdown();
    Ok(())
}
