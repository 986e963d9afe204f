use rusqlite::{params, Connection};

use super::candidate::parse_uuid;
use super::challenge::parse_timestamp;
use crate::db::DatabaseError;
use crate::models::RunLogEntry;

pub fn insert_run(conn: &Connection, entry: &RunLogEntry) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO pipeline_runs
            (id, request_payload, query, retrieved_documents, assembled_prompt,
             result, error, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            entry.id.to_string(),
            entry.request_payload,
            entry.query,
            entry.retrieved_documents,
            entry.assembled_prompt,
            entry.result,
            entry.error,
            entry.created_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

/// Most recent run-log entries, newest first.
pub fn recent_runs(conn: &Connection, limit: usize) -> Result<Vec<RunLogEntry>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, request_payload, query, retrieved_documents, assembled_prompt,
                result, error, created_at
         FROM pipeline_runs ORDER BY created_at DESC, id DESC LIMIT ?1",
    )?;
    let rows = stmt.query_map(params![limit as i64], |row| {
        let id_str: String = row.get(0)?;
        let created_at_str: String = row.get(7)?;
        Ok(RunLogEntry {
            id: parse_uuid(&id_str, 0)?,
            request_payload: row.get(1)?,
            query: row.get(2)?,
            retrieved_documents: row.get(3)?,
            assembled_prompt: row.get(4)?,
            result: row.get(5)?,
            error: row.get(6)?,
            created_at: parse_timestamp(&created_at_str),
        })
    })?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;

    #[test]
    fn recent_runs_newest_first() {
        let conn = open_memory_database().unwrap();
        for i in 0..3 {
            let mut entry = RunLogEntry::new(format!("{{\"run\":{i}}}"));
            entry.created_at =
                chrono::Utc::now() + chrono::Duration::seconds(i);
            insert_run(&conn, &entry).unwrap();
        }

        let runs = recent_runs(&conn, 2).unwrap();
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].request_payload, "{\"run\":2}");
        assert_eq!(runs[1].request_payload, "{\"run\":1}");
    }

    #[test]
    fn error_entries_roundtrip() {
        let conn = open_memory_database().unwrap();
        let mut entry = RunLogEntry::new("{}".into());
        entry.error = Some("oracle unreachable".into());
        insert_run(&conn, &entry).unwrap();

        let runs = recent_runs(&conn, 10).unwrap();
        assert_eq!(runs[0].error.as_deref(), Some("oracle unreachable"));
        assert!(runs[0].result.is_none());
    }
}
