use std::sync::atomic::{AtomicU64, Ordering};

use rusqlite::Connection;
use tracing::warn;

use crate::db::repository::{insert_run, recent_runs};
use crate::db::DatabaseError;
use crate::models::RunLogEntry;

static DROPPED_WRITES: AtomicU64 = AtomicU64::new(0);

/// Best-effort execution logger over the catalog store.
///
/// `record` never fails outward: a write error is traced and counted, and
/// the pipeline outcome that triggered it is unaffected.
pub struct RunLogger<'a> {
    conn: &'a Connection,
}

impl<'a> RunLogger<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub fn record(&self, entry: &RunLogEntry) {
        if let Err(e) = insert_run(self.conn, entry) {
            DROPPED_WRITES.fetch_add(1, Ordering::Relaxed);
            warn!(run_id = %entry.id, error = %e, "Dropped run-log entry");
        }
    }

    pub fn recent(&self, limit: usize) -> Result<Vec<RunLogEntry>, DatabaseError> {
        recent_runs(self.conn, limit)
    }
}

/// Run-log writes dropped since process start.
pub fn dropped_writes() -> u64 {
    DROPPED_WRITES.load(Ordering::Relaxed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;

    #[test]
    fn record_persists_entry() {
        let conn = open_memory_database().unwrap();
        let logger = RunLogger::new(&conn);

        logger.record(&RunLogEntry::new("{\"companyName\":\"Acme\"}".into()));

        let runs = logger.recent(10).unwrap();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].request_payload, "{\"companyName\":\"Acme\"}");
    }

    #[test]
    fn record_swallows_write_failure() {
        let conn = open_memory_database().unwrap();
        conn.execute_batch("DROP TABLE pipeline_runs;").unwrap();
        let logger = RunLogger::new(&conn);

        let before = dropped_writes();
        // Missing table makes the insert fail; record must not panic.
        logger.record(&RunLogEntry::new("{}".into()));
        assert_eq!(dropped_writes(), before + 1);
    }
}
