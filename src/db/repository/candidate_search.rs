use std::collections::BTreeMap;

use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use super::candidate::row_to_candidate;
use crate::db::DatabaseError;
use crate::models::{CandidateFilter, CandidateRecord};

/// Grouped counts per categorical dimension, computed over the filtered
/// result set (not the full catalog) and before the row cap is applied.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchStatistics {
    pub total_matches: usize,
    pub business_tag_distribution: BTreeMap<String, usize>,
    pub department_distribution: BTreeMap<String, usize>,
    pub size_band_distribution: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateSearchResult {
    pub data: Vec<CandidateRecord>,
    pub statistics: SearchStatistics,
}

/// Structured filter search over the candidate catalog.
///
/// Set filters are conjunctive; `symptoms` matches disjunctively within
/// itself against the free-text columns, then conjoins with the rest.
/// Monotonic by construction: every added predicate only narrows the
/// WHERE clause.
pub fn search_candidates(
    conn: &Connection,
    filter: &CandidateFilter,
    limit: usize,
) -> Result<CandidateSearchResult, DatabaseError> {
    let mut sql = String::from(
        "SELECT id, name, business_tag, department, size_band, industry, region,
                description, challenges_solved, tags
         FROM candidates",
    );
    let mut clauses: Vec<String> = Vec::new();
    let mut params: Vec<String> = Vec::new();

    for (column, value) in [
        ("business_tag", &filter.business_tag),
        ("department", &filter.department),
        ("size_band", &filter.size_band),
    ] {
        if let Some(value) = value {
            params.push(value.clone());
            clauses.push(format!("{column} = ?{}", params.len()));
        }
    }

    if !filter.symptoms.is_empty() {
        let mut ors: Vec<String> = Vec::new();
        for symptom in &filter.symptoms {
            let pattern = format!("%{}%", symptom.trim());
            for column in ["description", "challenges_solved", "tags"] {
                params.push(pattern.clone());
                ors.push(format!("{column} LIKE ?{}", params.len()));
            }
        }
        clauses.push(format!("({})", ors.join(" OR ")));
    }

    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }
    sql.push_str(" ORDER BY name");

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(rusqlite::params_from_iter(params.iter()), row_to_candidate)?;
    let matched = rows
        .collect::<Result<Vec<_>, _>>()
        .map_err(DatabaseError::from)?;

    let statistics = compute_statistics(&matched);
    let mut data = matched;
    data.truncate(limit);

    Ok(CandidateSearchResult { data, statistics })
}

fn compute_statistics(matched: &[CandidateRecord]) -> SearchStatistics {
    let mut business_tag_distribution = BTreeMap::new();
    let mut department_distribution = BTreeMap::new();
    let mut size_band_distribution = BTreeMap::new();

    for candidate in matched {
        *business_tag_distribution
            .entry(candidate.business_tag.clone())
            .or_insert(0) += 1;
        *department_distribution
            .entry(candidate.department.clone())
            .or_insert(0) += 1;
        *size_band_distribution
            .entry(candidate.size_band.clone())
            .or_insert(0) += 1;
    }

    SearchStatistics {
        total_matches: matched.len(),
        business_tag_distribution,
        department_distribution,
        size_band_distribution,
    }
}
