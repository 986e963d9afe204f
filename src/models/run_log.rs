use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One pipeline invocation's execution record, success or failure.
///
/// Append-only. The optional fields hold serialized JSON where a stage
/// produced them; a run that failed before retrieval simply leaves them
/// unset. Writing an entry is always best-effort — see
/// `pipeline::run_log::RunLogger`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunLogEntry {
    pub id: Uuid,
    /// The original request payload, serialized.
    pub request_payload: String,
    /// Retrieval query, when the run used the vector retriever.
    pub query: Option<String>,
    /// Retrieved context chunks, serialized.
    pub retrieved_documents: Option<String>,
    /// The assembled generation prompt, when one was built.
    pub assembled_prompt: Option<String>,
    /// Serialized final result on success.
    pub result: Option<String>,
    /// Error message on failure.
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl RunLogEntry {
    pub fn new(request_payload: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            request_payload,
            query: None,
            retrieved_documents: None,
            assembled_prompt: None,
            result: None,
            error: None,
            created_at: Utc::now(),
        }
    }
}
