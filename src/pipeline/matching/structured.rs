use rusqlite::Connection;
use tracing::{debug, info};

use super::{MatchError, MatchOutcome, SOURCE_INTERNAL_CATALOG};
use crate::config;
use crate::db::repository::search_candidates;
use crate::models::{AnalysisOutcome, CandidateFilter, CandidateRecord, ChallengeRecord, MatchResult};

/// Base score for any candidate the filter search returned; the rest of
/// the unit interval is earned by keyword coverage.
const BASE_SCORE: f32 = 0.4;
const COVERAGE_WEIGHT: f32 = 0.6;

/// Catalog-internal strategy: derive search terms from the structured
/// analysis, run the filter search, and score candidates with a
/// deterministic keyword-coverage rule. No oracle, no persistence — the
/// result is reproducible from the catalog alone.
pub fn match_catalog_structured(
    conn: &Connection,
    challenge: &ChallengeRecord,
) -> Result<MatchOutcome, MatchError> {
    let terms = derive_terms(challenge);
    debug!(term_count = terms.len(), "Derived structured search terms");

    let filter = CandidateFilter {
        symptoms: terms.clone(),
        ..Default::default()
    };
    // Score the whole filtered set; the row cap would otherwise cut the
    // set alphabetically before coverage scoring has seen it.
    let found = search_candidates(conn, &filter, usize::MAX)?;

    let mut matches: Vec<MatchResult> = found
        .data
        .iter()
        .map(|candidate| score_candidate(challenge, candidate, &terms))
        .collect();
    matches.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    matches.truncate(config::MAX_MATCHES);

    let total_matches = matches.len();
    info!(total_matches, "Catalog-structured matching complete");
    Ok(MatchOutcome {
        matches,
        total_matches,
        data_source: SOURCE_INTERNAL_CATALOG.to_string(),
        suggestions: None,
    })
}

/// Search terms from the analysis: keywords and categories when the
/// extraction is structured, a word-split heuristic over the challenge
/// texts when it degraded.
fn derive_terms(challenge: &ChallengeRecord) -> Vec<String> {
    let mut terms: Vec<String> = match &challenge.analysis {
        AnalysisOutcome::Structured { items } => items
            .iter()
            .flat_map(|item| item.keywords.iter().chain(item.categories.iter()))
            .map(|t| t.trim().to_lowercase())
            .collect(),
        AnalysisOutcome::Degraded { .. } => challenge
            .joined_challenges()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| w.len() > 3)
            .map(|w| w.to_lowercase())
            .collect(),
    };
    terms.retain(|t| !t.is_empty());
    terms.sort();
    terms.dedup();
    terms
}

fn score_candidate(
    challenge: &ChallengeRecord,
    candidate: &CandidateRecord,
    terms: &[String],
) -> MatchResult {
    let text = candidate.free_text().to_lowercase();
    let hits: Vec<&String> = terms.iter().filter(|t| text.contains(t.as_str())).collect();

    let score = if terms.is_empty() {
        0.5
    } else {
        BASE_SCORE + COVERAGE_WEIGHT * (hits.len() as f32 / terms.len() as f32)
    };

    let reason = if hits.is_empty() {
        format!("Matched catalog filters for {}", candidate.business_tag)
    } else {
        format!(
            "Covers {} of {} challenge keywords: {}",
            hits.len(),
            terms.len(),
            hits.iter()
                .map(|s| s.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        )
    };

    MatchResult::new(
        challenge.id,
        Some(candidate.id),
        &candidate.name,
        score,
        &reason,
        &candidate.challenges_solved,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::candidate::sample_candidate;
    use crate::db::repository::insert_candidate;
    use crate::db::sqlite::open_memory_database;
    use crate::models::{ChallengeAnalysis, Urgency};
    use chrono::Utc;
    use uuid::Uuid;

    fn structured_challenge(keywords: &[&str]) -> ChallengeRecord {
        ChallengeRecord {
            id: Uuid::new_v4(),
            company_name: "Acme".into(),
            source_url: "https://example.com/acme".into(),
            extracted_challenges: vec!["Lead tracking is chaotic".into()],
            analysis: AnalysisOutcome::Structured {
                items: vec![ChallengeAnalysis {
                    categories: vec![],
                    urgency: Urgency::High,
                    keywords: keywords.iter().map(|k| k.to_string()).collect(),
                }],
            },
            created_at: Utc::now(),
        }
    }

    #[test]
    fn keyword_hits_raise_the_score() {
        let conn = open_memory_database().unwrap();
        insert_candidate(&conn, &sample_candidate("Alpha Solutions", "IT")).unwrap();

        let challenge = structured_challenge(&["lead tracking"]);
        let outcome = match_catalog_structured(&conn, &challenge).unwrap();

        assert_eq!(outcome.total_matches, 1);
        assert_eq!(outcome.data_source, "internal-catalog");
        // Full coverage of one term.
        assert!((outcome.matches[0].score - 1.0).abs() < 1e-6);
        assert!(outcome.matches[0].reason.contains("lead tracking"));
    }

    #[test]
    fn degraded_analysis_falls_back_to_word_terms() {
        let conn = open_memory_database().unwrap();
        insert_candidate(&conn, &sample_candidate("Alpha Solutions", "IT")).unwrap();

        let challenge = ChallengeRecord {
            id: Uuid::new_v4(),
            company_name: "Acme".into(),
            source_url: "u".into(),
            extracted_challenges: vec!["they struggle with churn and sales process".into()],
            analysis: AnalysisOutcome::Degraded { raw: "raw".into() },
            created_at: Utc::now(),
        };

        let outcome = match_catalog_structured(&conn, &challenge).unwrap();
        // "churn", "sales" and "process" all appear in the sample candidate.
        assert_eq!(outcome.total_matches, 1);
        assert!(outcome.matches[0].score > BASE_SCORE);
    }

    #[test]
    fn no_terms_and_no_symptoms_returns_whole_catalog_scored_flat() {
        let conn = open_memory_database().unwrap();
        insert_candidate(&conn, &sample_candidate("Alpha Solutions", "IT")).unwrap();
        insert_candidate(&conn, &sample_candidate("Beta Consulting", "HR")).unwrap();

        let challenge = structured_challenge(&[]);
        let outcome = match_catalog_structured(&conn, &challenge).unwrap();

        assert_eq!(outcome.total_matches, 2);
        for m in &outcome.matches {
            assert!((m.score - 0.5).abs() < 1e-6);
        }
    }

    #[test]
    fn results_sorted_descending_and_capped() {
        let conn = open_memory_database().unwrap();
        for i in 0..8 {
            insert_candidate(&conn, &sample_candidate(&format!("Candidate {i}"), "IT")).unwrap();
        }

        let challenge = structured_challenge(&["lead tracking", "blockchain"]);
        let outcome = match_catalog_structured(&conn, &challenge).unwrap();

        assert!(outcome.matches.len() <= crate::config::MAX_MATCHES);
        for pair in outcome.matches.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
        for m in &outcome.matches {
            assert!((0.0..=1.0).contains(&m.score));
            assert!(m.candidate_id.is_some());
        }
    }

    #[test]
    fn scoring_sees_past_the_default_search_page() {
        let conn = open_memory_database().unwrap();
        // More filter hits than the default search page holds, all with
        // partial coverage and names that sort early.
        for i in 0..25 {
            insert_candidate(&conn, &sample_candidate(&format!("Candidate {i:02}"), "IT"))
                .unwrap();
        }
        // The only full-coverage candidate sorts after every page cut.
        let mut best = sample_candidate("Zulu Analytics", "IT");
        best.description = "Lead tracking dashboards with telemetry pipelines".into();
        insert_candidate(&conn, &best).unwrap();

        let challenge = structured_challenge(&["lead tracking", "telemetry"]);
        let outcome = match_catalog_structured(&conn, &challenge).unwrap();

        assert_eq!(outcome.matches[0].candidate_name, "Zulu Analytics");
        assert!((outcome.matches[0].score - 1.0).abs() < 1e-6);
    }

    #[test]
    fn no_catalog_rows_yields_empty_outcome() {
        let conn = open_memory_database().unwrap();
        let challenge = structured_challenge(&["quantum"]);
        let outcome = match_catalog_structured(&conn, &challenge).unwrap();
        assert!(outcome.matches.is_empty());
        assert_eq!(outcome.total_matches, 0);
    }
}
