use chrono::Utc;
use rusqlite::{params, Connection};
use uuid::Uuid;

use super::candidate::parse_uuid;
use crate::db::DatabaseError;
use crate::models::MatchResult;

pub fn insert_match(conn: &Connection, result: &MatchResult) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO match_results
            (id, challenge_id, candidate_id, candidate_name, score, reason,
             solution_details, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            result.id.to_string(),
            result.challenge_id.to_string(),
            result.candidate_id.map(|id| id.to_string()),
            result.candidate_name,
            result.score as f64,
            result.reason,
            result.solution_details,
            Utc::now().to_rfc3339(),
        ],
    )?;
    Ok(())
}

/// Matches persisted for one challenge, score-descending.
pub fn list_matches_for_challenge(
    conn: &Connection,
    challenge_id: &Uuid,
) -> Result<Vec<MatchResult>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, challenge_id, candidate_id, candidate_name, score, reason,
                solution_details
         FROM match_results WHERE challenge_id = ?1 ORDER BY score DESC",
    )?;
    let rows = stmt.query_map(params![challenge_id.to_string()], |row| {
        let id_str: String = row.get(0)?;
        let challenge_str: String = row.get(1)?;
        let candidate_str: Option<String> = row.get(2)?;
        let score: f64 = row.get(4)?;
        Ok(MatchResult {
            id: parse_uuid(&id_str, 0)?,
            challenge_id: parse_uuid(&challenge_str, 1)?,
            candidate_id: match candidate_str {
                Some(s) => Some(parse_uuid(&s, 2)?),
                None => None,
            },
            candidate_name: row.get(3)?,
            score: score as f32,
            reason: row.get(5)?,
            solution_details: row.get(6)?,
        })
    })?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}
