//! Solvematch matches extracted business challenges against a catalog of
//! solution providers.
//!
//! Documents are ingested into a vector store; conversations go through a
//! generation oracle to extract challenges, which are then matched via
//! one of three strategies (generative ranking, structured catalog
//! filtering, or retrieval-augmented suggestions). The HTTP surface in
//! [`api`] is the only outer boundary; the pipeline stages call each
//! other directly in process.

pub mod api;
pub mod config;
pub mod db;
pub mod models;
pub mod oracle;
pub mod pipeline;
