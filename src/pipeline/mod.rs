pub mod extraction;
pub mod ingest;
pub mod matching;
pub mod orchestrator;
pub mod retrieval;
pub mod run_log;
