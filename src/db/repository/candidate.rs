use rusqlite::{params, Connection, Row};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::CandidateRecord;

pub fn insert_candidate(
    conn: &Connection,
    candidate: &CandidateRecord,
) -> Result<(), DatabaseError> {
    let tags = serde_json::to_string(&candidate.tags)
        .unwrap_or_else(|_| "[]".to_string());
    conn.execute(
        "INSERT INTO candidates
            (id, name, business_tag, department, size_band, industry, region,
             description, challenges_solved, tags)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            candidate.id.to_string(),
            candidate.name,
            candidate.business_tag,
            candidate.department,
            candidate.size_band,
            candidate.industry,
            candidate.region,
            candidate.description,
            candidate.challenges_solved,
            tags,
        ],
    )?;
    Ok(())
}

pub fn get_candidate(conn: &Connection, id: &Uuid) -> Result<CandidateRecord, DatabaseError> {
    conn.query_row(
        "SELECT id, name, business_tag, department, size_band, industry, region,
                description, challenges_solved, tags
         FROM candidates WHERE id = ?1",
        params![id.to_string()],
        row_to_candidate,
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => DatabaseError::NotFound {
            entity_type: "candidate".into(),
            id: id.to_string(),
        },
        other => other.into(),
    })
}

/// Full catalog snapshot, name-ordered. Used by the external-generative
/// matching strategy, which hands the whole catalog to the oracle.
pub fn list_candidates(conn: &Connection) -> Result<Vec<CandidateRecord>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, name, business_tag, department, size_band, industry, region,
                description, challenges_solved, tags
         FROM candidates ORDER BY name",
    )?;
    let rows = stmt.query_map([], row_to_candidate)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

pub(crate) fn row_to_candidate(row: &Row) -> Result<CandidateRecord, rusqlite::Error> {
    let id_str: String = row.get(0)?;
    let tags_json: String = row.get(9)?;
    Ok(CandidateRecord {
        id: parse_uuid(&id_str, 0)?,
        name: row.get(1)?,
        business_tag: row.get(2)?,
        department: row.get(3)?,
        size_band: row.get(4)?,
        industry: row.get(5)?,
        region: row.get(6)?,
        description: row.get(7)?,
        challenges_solved: row.get(8)?,
        tags: serde_json::from_str(&tags_json).unwrap_or_default(),
    })
}

pub(crate) fn parse_uuid(value: &str, column: usize) -> Result<Uuid, rusqlite::Error> {
    Uuid::parse_str(value).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(
            column,
            rusqlite::types::Type::Text,
            Box::new(e),
        )
    })
}

/// Test fixture shared by repository and pipeline tests.
#[cfg(test)]
pub(crate) fn sample_candidate(name: &str, business_tag: &str) -> CandidateRecord {
    CandidateRecord {
        id: Uuid::new_v4(),
        name: name.into(),
        business_tag: business_tag.into(),
        department: "Sales".into(),
        size_band: "small".into(),
        industry: "software".into(),
        region: "Kanto".into(),
        description: format!("{name} solves sales process problems"),
        challenges_solved: "lead tracking, churn reduction".into(),
        tags: vec!["crm".into()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;

    #[test]
    fn insert_and_get_roundtrip() {
        let conn = open_memory_database().unwrap();
        let candidate = sample_candidate("Acme", "IT");
        insert_candidate(&conn, &candidate).unwrap();

        let loaded = get_candidate(&conn, &candidate.id).unwrap();
        assert_eq!(loaded.name, "Acme");
        assert_eq!(loaded.business_tag, "IT");
        assert_eq!(loaded.tags, vec!["crm".to_string()]);
    }

    #[test]
    fn get_missing_candidate_is_not_found() {
        let conn = open_memory_database().unwrap();
        let result = get_candidate(&conn, &Uuid::new_v4());
        assert!(matches!(result, Err(DatabaseError::NotFound { .. })));
    }

    #[test]
    fn list_candidates_is_name_ordered() {
        let conn = open_memory_database().unwrap();
        insert_candidate(&conn, &sample_candidate("Zeta", "IT")).unwrap();
        insert_candidate(&conn, &sample_candidate("Acme", "HR")).unwrap();

        let all = list_candidates(&conn).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].name, "Acme");
        assert_eq!(all[1].name, "Zeta");
    }
}
