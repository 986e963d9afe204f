use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::Connection;

use super::DatabaseError;

/// Open (or create) the catalog store database at the given path.
pub fn open_database(path: &Path) -> Result<Connection, DatabaseError> {
    let conn = Connection::open(path)?;
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    bootstrap_schema(&conn)?;
    Ok(conn)
}

/// Open an in-memory catalog store (tests).
pub fn open_memory_database() -> Result<Connection, DatabaseError> {
    let conn = Connection::open_in_memory()?;
    bootstrap_schema(&conn)?;
    Ok(conn)
}

/// Acquire the shared connection, recovering from a poisoned lock.
///
/// A panic while holding the guard leaves no torn state on the SQLite
/// side, so the connection stays usable. Callers must hold the guard only
/// for the duration of a repository call, never across an oracle call.
pub fn lock_connection(mutex: &Mutex<Connection>) -> MutexGuard<'_, Connection> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Create the catalog tables if they do not exist yet.
fn bootstrap_schema(conn: &Connection) -> Result<(), DatabaseError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS candidates (
            id                TEXT PRIMARY KEY,
            name              TEXT NOT NULL,
            business_tag      TEXT NOT NULL DEFAULT '',
            department        TEXT NOT NULL DEFAULT '',
            size_band         TEXT NOT NULL DEFAULT '',
            industry          TEXT NOT NULL DEFAULT '',
            region            TEXT NOT NULL DEFAULT '',
            description       TEXT NOT NULL DEFAULT '',
            challenges_solved TEXT NOT NULL DEFAULT '',
            tags              TEXT NOT NULL DEFAULT '[]'
        );

        CREATE TABLE IF NOT EXISTS challenges (
            id                   TEXT PRIMARY KEY,
            company_name         TEXT NOT NULL,
            source_url           TEXT NOT NULL DEFAULT '',
            extracted_challenges TEXT NOT NULL,
            analysis             TEXT NOT NULL,
            created_at           TEXT NOT NULL,
            UNIQUE (company_name, source_url)
        );

        CREATE TABLE IF NOT EXISTS match_results (
            id               TEXT PRIMARY KEY,
            challenge_id     TEXT NOT NULL,
            candidate_id     TEXT,
            candidate_name   TEXT NOT NULL,
            score            REAL NOT NULL,
            reason           TEXT NOT NULL DEFAULT '',
            solution_details TEXT NOT NULL DEFAULT '',
            created_at       TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS pipeline_runs (
            id                  TEXT PRIMARY KEY,
            request_payload     TEXT NOT NULL,
            query               TEXT,
            retrieved_documents TEXT,
            assembled_prompt    TEXT,
            result              TEXT,
            error               TEXT,
            created_at          TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_match_results_challenge
            ON match_results (challenge_id);
        CREATE INDEX IF NOT EXISTS idx_pipeline_runs_created
            ON pipeline_runs (created_at);",
    )?;
    Ok(())
}
