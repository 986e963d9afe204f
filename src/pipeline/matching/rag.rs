use tracing::{debug, info};

use super::{MatchError, MatchOutcome, SOURCE_KNOWLEDGE_BASE};
use crate::config;
use crate::models::ChallengeRecord;
use crate::oracle::embedding::EmbeddingModel;
use crate::oracle::llm::LlmClient;
use crate::pipeline::retrieval::{retrieve, ScoredChunk, VectorSearch};

const RAG_SYSTEM_PROMPT: &str = "You are a business consultant. Using ONLY \
the provided knowledge-base context, suggest how the described challenges \
could be addressed. Answer as short narrative prose, no JSON.";

const NO_CONTEXT_SUGGESTION: &str = "No relevant knowledge-base content was \
found for these challenges. Consider ingesting more solution material or \
using a catalog-based matching method.";

/// What the retrieval-augmented run actually did, for the execution log.
#[derive(Debug, Clone)]
pub struct RagArtifacts {
    pub query: String,
    pub retrieved: Vec<ScoredChunk>,
    /// None when nothing cleared the threshold and the oracle was skipped.
    pub prompt: Option<String>,
}

/// Retrieval-augmented strategy: retrieve knowledge-base context for the
/// challenge text and ask the generation oracle for narrative suggestions.
/// Produces no candidate ranking; an empty retrieval short-circuits to a
/// canned suggestion without calling the oracle.
///
/// The error side carries whatever artifacts had been produced by the
/// time the failure happened, so the execution log can still capture the
/// query and retrieved context of a run whose generation call failed.
pub fn match_retrieval_augmented(
    llm: &dyn LlmClient,
    embedder: &dyn EmbeddingModel,
    store: &dyn VectorSearch,
    challenge: &ChallengeRecord,
) -> Result<(MatchOutcome, RagArtifacts), (MatchError, Option<RagArtifacts>)> {
    let query = challenge.joined_challenges();
    let retrieved = retrieve(
        &query,
        embedder,
        store,
        config::DEFAULT_MATCH_THRESHOLD,
        config::DEFAULT_TOP_K,
    )
    .map_err(|e| (MatchError::from(e), None))?;
    debug!(retrieved = retrieved.len(), "Knowledge-base retrieval done");

    let (suggestions, prompt) = if retrieved.is_empty() {
        info!("No context cleared the threshold, skipping generation");
        (NO_CONTEXT_SUGGESTION.to_string(), None)
    } else {
        let prompt = build_rag_prompt(challenge, &retrieved);
        match llm.generate(&prompt, RAG_SYSTEM_PROMPT) {
            Ok(text) => (text, Some(prompt)),
            Err(e) => {
                let artifacts = RagArtifacts {
                    query,
                    retrieved,
                    prompt: Some(prompt),
                };
                return Err((MatchError::from(e), Some(artifacts)));
            }
        }
    };

    let outcome = MatchOutcome {
        matches: Vec::new(),
        total_matches: 0,
        data_source: SOURCE_KNOWLEDGE_BASE.to_string(),
        suggestions: Some(suggestions),
    };
    let artifacts = RagArtifacts {
        query,
        retrieved,
        prompt,
    };
    Ok((outcome, artifacts))
}

fn build_rag_prompt(challenge: &ChallengeRecord, context: &[ScoredChunk]) -> String {
    let mut prompt = String::from("Knowledge-base context:\n");
    for chunk in context {
        prompt.push_str(&format!("[{}] {}\n", chunk.source, chunk.content));
    }
    prompt.push_str(&format!(
        "\nChallenges for {}:\n{}\n\nSuggest concrete next steps.",
        challenge.company_name,
        challenge.joined_challenges()
    ));
    prompt
}
