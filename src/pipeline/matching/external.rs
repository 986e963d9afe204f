use std::sync::Mutex;

use rusqlite::Connection;
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::{MatchError, MatchOutcome, SOURCE_EXTERNAL_CATALOG};
use crate::config;
use crate::db::repository::{insert_match, list_candidates};
use crate::db::sqlite::lock_connection;
use crate::models::{CandidateRecord, ChallengeRecord, MatchResult};
use crate::oracle::llm::LlmClient;
use crate::pipeline::extraction::parser::extract_json_block;

const MATCH_SYSTEM_PROMPT: &str = "You are a matching engine. Given business \
challenges and a catalog of solution providers, rank the providers that best \
address the challenges. Respond ONLY with a JSON array of at most five \
elements shaped {\"candidate_name\": string, \"score\": number between 0 and 1, \
\"reason\": string, \"solution_details\": string}. No commentary.";

#[derive(Debug, Deserialize)]
struct RawRankedMatch {
    #[serde(alias = "candidateName", alias = "name")]
    candidate_name: String,
    score: f32,
    #[serde(default)]
    reason: String,
    #[serde(default, alias = "solutionDetails")]
    solution_details: String,
}

/// External-generative strategy: the full catalog snapshot plus the
/// challenge text go to the generation oracle, which ranks and justifies
/// up to five matches. Each parsed match is persisted independently; a
/// failed write drops that match only.
///
/// Takes the catalog mutex rather than a guard: the snapshot and the
/// per-match writes each lock briefly, and the connection is free for
/// other requests while the oracle call is in flight.
pub fn match_external_generative(
    catalog_store: &Mutex<Connection>,
    llm: &dyn LlmClient,
    challenge: &ChallengeRecord,
) -> Result<MatchOutcome, MatchError> {
    let catalog = {
        let conn = lock_connection(catalog_store);
        list_candidates(&conn)?
    };
    if catalog.is_empty() {
        info!("Candidate catalog is empty, nothing to rank");
        return Ok(MatchOutcome {
            matches: Vec::new(),
            total_matches: 0,
            data_source: SOURCE_EXTERNAL_CATALOG.to_string(),
            suggestions: None,
        });
    }

    let prompt = build_ranking_prompt(challenge, &catalog);
    debug!(candidates = catalog.len(), "Requesting generative ranking");
    let raw = llm.generate(&prompt, MATCH_SYSTEM_PROMPT)?;

    let ranked = parse_ranked_list(&raw);
    let mut matches: Vec<MatchResult> = ranked
        .into_iter()
        .map(|item| {
            let candidate_id = catalog
                .iter()
                .find(|c| c.name.eq_ignore_ascii_case(item.candidate_name.trim()))
                .map(|c| c.id);
            if candidate_id.is_none() {
                warn!(name = %item.candidate_name, "Ranked candidate not found in catalog");
            }
            MatchResult::new(
                challenge.id,
                candidate_id,
                item.candidate_name.trim(),
                item.score,
                &item.reason,
                &item.solution_details,
            )
        })
        .collect();

    matches.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    matches.truncate(config::MAX_MATCHES);

    // Independent writes: one failure drops that match, not the others.
    let conn = lock_connection(catalog_store);
    let mut persisted = Vec::with_capacity(matches.len());
    for m in matches {
        match insert_match(&conn, &m) {
            Ok(()) => persisted.push(m),
            Err(e) => {
                warn!(candidate = %m.candidate_name, error = %e, "Dropping match that failed to persist");
            }
        }
    }

    let total_matches = persisted.len();
    info!(total_matches, "External-generative matching complete");
    Ok(MatchOutcome {
        matches: persisted,
        total_matches,
        data_source: SOURCE_EXTERNAL_CATALOG.to_string(),
        suggestions: None,
    })
}

fn build_ranking_prompt(challenge: &ChallengeRecord, catalog: &[CandidateRecord]) -> String {
    let mut prompt = format!(
        "Business challenges for {}:\n{}\n\nSolution provider catalog:\n",
        challenge.company_name,
        challenge.joined_challenges()
    );
    for candidate in catalog {
        prompt.push_str(&format!(
            "- {} | tag: {} | department: {} | solves: {} | {}\n",
            candidate.name,
            candidate.business_tag,
            candidate.department,
            candidate.challenges_solved,
            candidate.description,
        ));
    }
    prompt.push_str("\nRank the best matches as a JSON array.");
    prompt
}

/// Lenient parse of the oracle's ranked list. Malformed elements are
/// skipped; wholly unparseable output yields an empty list rather than an
/// error — an unranked run is a valid outcome.
fn parse_ranked_list(raw: &str) -> Vec<RawRankedMatch> {
    let candidate = extract_json_block(raw).unwrap_or_else(|| raw.trim());
    let items: Vec<serde_json::Value> = match serde_json::from_str(candidate) {
        Ok(serde_json::Value::Array(items)) => items,
        Ok(_) | Err(_) => {
            warn!("Ranking output is not a JSON array, returning no matches");
            return Vec::new();
        }
    };

    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<RawRankedMatch>(item) {
            Ok(parsed) if !parsed.candidate_name.trim().is_empty() => Some(parsed),
            Ok(_) => {
                warn!("Skipping ranked item with empty candidate name");
                None
            }
            Err(e) => {
                warn!(error = %e, "Skipping malformed ranked item");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::candidate::sample_candidate;
    use crate::db::repository::{insert_candidate, list_matches_for_challenge};
    use crate::db::sqlite::open_memory_database;
    use crate::models::AnalysisOutcome;
    use crate::oracle::llm::MockLlmClient;
    use chrono::Utc;
    use uuid::Uuid;

    fn sample_challenge() -> ChallengeRecord {
        ChallengeRecord {
            id: Uuid::new_v4(),
            company_name: "Acme".into(),
            source_url: "https://example.com/acme".into(),
            extracted_challenges: vec!["No CRM".into()],
            analysis: AnalysisOutcome::Structured { items: vec![] },
            created_at: Utc::now(),
        }
    }

    fn catalog_with(candidates: &[CandidateRecord]) -> Mutex<Connection> {
        let conn = open_memory_database().unwrap();
        for candidate in candidates {
            insert_candidate(&conn, candidate).unwrap();
        }
        Mutex::new(conn)
    }

    #[test]
    fn ranks_resolves_and_persists_matches() {
        let alpha = sample_candidate("Alpha Solutions", "IT");
        let beta = sample_candidate("Beta Consulting", "HR");
        let catalog = catalog_with(&[alpha.clone(), beta.clone()]);

        let llm = MockLlmClient::new(
            r#"[
                {"candidate_name": "beta consulting", "score": 0.6, "reason": "ok fit", "solution_details": "workshops"},
                {"candidate_name": "Alpha Solutions", "score": 0.9, "reason": "great fit", "solution_details": "CRM rollout"}
            ]"#,
        );
        let challenge = sample_challenge();
        let outcome = match_external_generative(&catalog, &llm, &challenge).unwrap();

        assert_eq!(outcome.total_matches, 2);
        assert_eq!(outcome.data_source, "external-catalog");
        assert_eq!(outcome.matches[0].candidate_name, "Alpha Solutions");
        assert_eq!(outcome.matches[0].candidate_id, Some(alpha.id));
        // Case-insensitive name resolution.
        assert_eq!(outcome.matches[1].candidate_id, Some(beta.id));

        let conn = catalog.lock().unwrap();
        let persisted = list_matches_for_challenge(&conn, &challenge.id).unwrap();
        assert_eq!(persisted.len(), 2);
    }

    #[test]
    fn unknown_candidate_name_keeps_match_without_id() {
        let catalog = catalog_with(&[sample_candidate("Alpha Solutions", "IT")]);

        let llm = MockLlmClient::new(
            r#"[{"candidate_name": "Ghost Corp", "score": 0.8, "reason": "r", "solution_details": "d"}]"#,
        );
        let outcome = match_external_generative(&catalog, &llm, &sample_challenge()).unwrap();

        assert_eq!(outcome.total_matches, 1);
        assert_eq!(outcome.matches[0].candidate_id, None);
    }

    #[test]
    fn scores_clamped_and_capped_at_five() {
        let catalog = catalog_with(&[sample_candidate("Alpha Solutions", "IT")]);

        let items: Vec<String> = (0..7)
            .map(|i| {
                format!(
                    r#"{{"candidate_name": "Candidate {i}", "score": {}, "reason": "r", "solution_details": "d"}}"#,
                    2.0 - i as f32 * 0.1
                )
            })
            .collect();
        let llm = MockLlmClient::new(&format!("[{}]", items.join(",")));

        let outcome = match_external_generative(&catalog, &llm, &sample_challenge()).unwrap();
        assert_eq!(outcome.matches.len(), 5);
        for m in &outcome.matches {
            assert!((0.0..=1.0).contains(&m.score));
        }
        for pair in outcome.matches.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[test]
    fn unparseable_ranking_yields_empty_matches_not_error() {
        let catalog = catalog_with(&[sample_candidate("Alpha Solutions", "IT")]);

        let llm = MockLlmClient::new("I would recommend Alpha Solutions for this.");
        let outcome = match_external_generative(&catalog, &llm, &sample_challenge()).unwrap();

        assert!(outcome.matches.is_empty());
        assert_eq!(outcome.total_matches, 0);
    }

    #[test]
    fn empty_catalog_short_circuits_without_oracle_call() {
        let catalog = catalog_with(&[]);
        // An unreachable oracle proves no generate call happens.
        let llm = MockLlmClient::unreachable();
        let outcome = match_external_generative(&catalog, &llm, &sample_challenge()).unwrap();
        assert!(outcome.matches.is_empty());
    }

    #[test]
    fn unreachable_oracle_is_fatal_with_nonempty_catalog() {
        let catalog = catalog_with(&[sample_candidate("Alpha Solutions", "IT")]);

        let llm = MockLlmClient::unreachable();
        let result = match_external_generative(&catalog, &llm, &sample_challenge());
        assert!(matches!(result, Err(MatchError::Oracle(_))));
    }

    #[test]
    fn fenced_ranking_output_is_accepted() {
        let catalog = catalog_with(&[sample_candidate("Alpha Solutions", "IT")]);

        let llm = MockLlmClient::new(
            "```json\n[{\"candidate_name\": \"Alpha Solutions\", \"score\": 0.7, \"reason\": \"r\", \"solution_details\": \"d\"}]\n```",
        );
        let outcome = match_external_generative(&catalog, &llm, &sample_challenge()).unwrap();
        assert_eq!(outcome.total_matches, 1);
    }
}
