//! SQLite-backed record store, one row per filename.

use std::fs;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, warn};

use crate::error::StoreError;
use crate::models::PersistedRecord;

type Result<T> = std::result::Result<T, StoreError>;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS invoices (
    id INTEGER PRIMARY KEY,
    filename TEXT UNIQUE NOT NULL,
    json_data TEXT,
    status TEXT,
    updated_at TEXT
);
";

const UPSERT: &str = "
INSERT INTO invoices (filename, json_data, status, updated_at)
VALUES (?1, ?2, ?3, ?4)
ON CONFLICT(filename) DO UPDATE SET
    json_data = excluded.json_data,
    status = excluded.status,
    updated_at = excluded.updated_at
";

/// Persists the latest extraction attempt for every document.
pub struct ResultStore {
    connection: Mutex<Connection>,
}

impl ResultStore {
    /// Open (or create) the database at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if let Err(e) = fs::create_dir_all(parent) {
                warn!(path = %parent.display(), error = %e, "failed to create database directory");
            }
        }

        let connection = Connection::open(path)?;
        connection.pragma_update(None, "journal_mode", "WAL")?;
        connection.pragma_update(None, "synchronous", "NORMAL")?;
        debug!("Opened record store at {}", path.display());
        Self::with_connection(connection)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(connection: Connection) -> Result<Self> {
        connection.execute_batch(SCHEMA)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.connection.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert or replace the record for `filename`.
    pub fn upsert(&self, filename: &str, json_data: Option<&str>, status: &str) -> Result<()> {
        self.conn()
            .execute(UPSERT, params![filename, json_data, status, timestamp()])?;
        debug!("Upserted record for {} ({})", filename, status);
        Ok(())
    }

    /// Upsert the record and relocate the document as one step.
    ///
    /// The row is written inside a transaction, `relocate` runs, then the
    /// transaction commits. A failing `relocate` rolls the row back. A failing
    /// commit runs `undo` to put the file back where `relocate` found it.
    pub fn upsert_with<R, U>(
        &self,
        filename: &str,
        json_data: Option<&str>,
        status: &str,
        relocate: R,
        undo: U,
    ) -> Result<()>
    where
        R: FnOnce() -> std::io::Result<()>,
        U: FnOnce() -> std::io::Result<()>,
    {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        tx.execute(UPSERT, params![filename, json_data, status, timestamp()])?;

        relocate().map_err(|source| StoreError::Relocate {
            filename: filename.to_string(),
            source,
        })?;

        if let Err(e) = tx.commit() {
            if let Err(undo_err) = undo() {
                warn!(file = %filename, error = %undo_err, "failed to undo relocation");
            }
            return Err(e.into());
        }

        debug!("Committed record for {} ({})", filename, status);
        Ok(())
    }

    pub fn get(&self, filename: &str) -> Result<Option<PersistedRecord>> {
        let record = self
            .conn()
            .query_row(
                "SELECT filename, json_data, status, updated_at FROM invoices WHERE filename = ?1",
                params![filename],
                row_to_record,
            )
            .optional()?;
        Ok(record)
    }

    /// Every record, ordered by filename.
    pub fn list(&self) -> Result<Vec<PersistedRecord>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT filename, json_data, status, updated_at FROM invoices ORDER BY filename",
        )?;
        let records = stmt
            .query_map([], row_to_record)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(records)
    }

    /// Remove the record for `filename`. Returns whether a row existed.
    pub fn delete(&self, filename: &str) -> Result<bool> {
        let removed = self
            .conn()
            .execute("DELETE FROM invoices WHERE filename = ?1", params![filename])?;
        Ok(removed > 0)
    }

    /// Remove every record. Returns the number of rows removed.
    pub fn clear(&self) -> Result<usize> {
        Ok(self.conn().execute("DELETE FROM invoices", [])?)
    }
}

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<PersistedRecord> {
    Ok(PersistedRecord {
        filename: row.get(0)?,
        json_data: row.get(1)?,
        status: row.get(2)?,
        updated_at: row.get(3)?,
    })
}

fn timestamp() -> String {
    Utc::now().to_rfc3339()
}
