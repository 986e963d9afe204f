use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use uuid::Uuid;

use super::candidate::parse_uuid;
use crate::db::DatabaseError;
use crate::models::{AnalysisOutcome, ChallengeRecord};

/// Persist an extracted challenge record.
///
/// `(company_name, source_url)` is unique — re-running the pipeline for the
/// same source surfaces `DatabaseError::Duplicate`, which the orchestrator
/// treats as a non-critical persistence warning.
pub fn insert_challenge(
    conn: &Connection,
    challenge: &ChallengeRecord,
) -> Result<(), DatabaseError> {
    let extracted = serde_json::to_string(&challenge.extracted_challenges)
        .unwrap_or_else(|_| "[]".to_string());
    let analysis = serde_json::to_string(&challenge.analysis)
        .unwrap_or_else(|_| "{}".to_string());

    conn.execute(
        "INSERT INTO challenges
            (id, company_name, source_url, extracted_challenges, analysis, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            challenge.id.to_string(),
            challenge.company_name,
            challenge.source_url,
            extracted,
            analysis,
            challenge.created_at.to_rfc3339(),
        ],
    )
    .map_err(|e| match e {
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            DatabaseError::Duplicate {
                entity_type: "challenge".into(),
                key: format!("{} / {}", challenge.company_name, challenge.source_url),
            }
        }
        other => other.into(),
    })?;
    Ok(())
}

pub fn get_challenge(conn: &Connection, id: &Uuid) -> Result<ChallengeRecord, DatabaseError> {
    conn.query_row(
        "SELECT id, company_name, source_url, extracted_challenges, analysis, created_at
         FROM challenges WHERE id = ?1",
        params![id.to_string()],
        |row| {
            let id_str: String = row.get(0)?;
            let extracted_json: String = row.get(3)?;
            let analysis_json: String = row.get(4)?;
            let created_at_str: String = row.get(5)?;
            Ok(ChallengeRecord {
                id: parse_uuid(&id_str, 0)?,
                company_name: row.get(1)?,
                source_url: row.get(2)?,
                extracted_challenges: serde_json::from_str(&extracted_json)
                    .unwrap_or_default(),
                analysis: serde_json::from_str(&analysis_json).unwrap_or(
                    AnalysisOutcome::Degraded {
                        raw: analysis_json.clone(),
                    },
                ),
                created_at: parse_timestamp(&created_at_str),
            })
        },
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => DatabaseError::NotFound {
            entity_type: "challenge".into(),
            id: id.to_string(),
        },
        other => other.into(),
    })
}

pub(crate) fn parse_timestamp(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;
    use crate::models::{ChallengeAnalysis, Urgency};

    fn sample_challenge(company: &str, url: &str) -> ChallengeRecord {
        ChallengeRecord {
            id: Uuid::new_v4(),
            company_name: company.into(),
            source_url: url.into(),
            extracted_challenges: vec!["slow lead follow-up".into()],
            analysis: AnalysisOutcome::Structured {
                items: vec![ChallengeAnalysis {
                    categories: vec!["sales".into()],
                    urgency: Urgency::High,
                    keywords: vec!["crm".into(), "follow-up".into()],
                }],
            },
            created_at: Utc::now(),
        }
    }

    #[test]
    fn insert_and_get_roundtrip() {
        let conn = open_memory_database().unwrap();
        let challenge = sample_challenge("Acme", "https://example.com/a");
        insert_challenge(&conn, &challenge).unwrap();

        let loaded = get_challenge(&conn, &challenge.id).unwrap();
        assert_eq!(loaded.company_name, "Acme");
        assert_eq!(loaded.extracted_challenges.len(), 1);
        assert_eq!(loaded.analysis.items().len(), 1);
        assert_eq!(loaded.analysis.items()[0].urgency, Urgency::High);
    }

    #[test]
    fn duplicate_company_and_source_is_reported() {
        let conn = open_memory_database().unwrap();
        insert_challenge(&conn, &sample_challenge("Acme", "https://example.com/a"))
            .unwrap();
        let result =
            insert_challenge(&conn, &sample_challenge("Acme", "https://example.com/a"));
        assert!(matches!(result, Err(DatabaseError::Duplicate { .. })));
    }

    #[test]
    fn same_company_different_source_is_allowed() {
        let conn = open_memory_database().unwrap();
        insert_challenge(&conn, &sample_challenge("Acme", "https://example.com/a"))
            .unwrap();
        insert_challenge(&conn, &sample_challenge("Acme", "https://example.com/b"))
            .unwrap();
    }

    #[test]
    fn degraded_analysis_survives_roundtrip() {
        let conn = open_memory_database().unwrap();
        let mut challenge = sample_challenge("Beta", "https://example.com/b");
        challenge.analysis = AnalysisOutcome::Degraded {
            raw: "free-form oracle text".into(),
        };
        insert_challenge(&conn, &challenge).unwrap();

        let loaded = get_challenge(&conn, &challenge.id).unwrap();
        assert!(loaded.analysis.is_degraded());
    }
}
