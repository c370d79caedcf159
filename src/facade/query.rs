//! Query-execution facade
//!
//! Probes that check a data source go through [`QueryExecutor`] and get a
//! [`Table`] back. [`SqliteExecutor`] is the bundled implementation; it opens
//! the database read-only for every query so a probe can never modify it.

use async_trait::async_trait;
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::constants::{QUERY_ROW_LIMIT, SQLITE_BUSY_TIMEOUT_MS};
use crate::models::Table;
use crate::utils::QueryError;

/// Runs a query and returns its rows
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Name of the backing data source, for reporting
    fn source_name(&self) -> &str;

    async fn query(&self, sql: &str) -> Result<Table, QueryError>;
}

/// Read-only SQLite query executor
#[derive(Debug, Clone)]
pub struct SqliteExecutor {
    path: PathBuf,
    name: String,
}

impl SqliteExecutor {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = format!("sqlite:{}", path.display());
        Self { path, name }
    }

    fn open(path: &Path) -> Result<Connection, QueryError> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| QueryError::Connection(format!("{}: {}", path.display(), e)))?;
        conn.busy_timeout(Duration::from_millis(SQLITE_BUSY_TIMEOUT_MS))
            .map_err(|e| QueryError::Connection(e.to_string()))?;
        Ok(conn)
    }

    fn run(path: &Path, sql: &str) -> Result<Table, QueryError> {
        let conn = Self::open(path)?;
        let mut stmt = conn
            .prepare(sql)
            .map_err(|e| QueryError::Execution(e.to_string()))?;

        let mut table = Table::new(stmt.column_names());
        let column_count = stmt.column_count();
        let mut rows = stmt
            .query([])
            .map_err(|e| QueryError::Execution(e.to_string()))?;

        while let Some(row) = rows
            .next()
            .map_err(|e| QueryError::Execution(e.to_string()))?
        {
            if table.row_count() >= QUERY_ROW_LIMIT {
                tracing::debug!(limit = QUERY_ROW_LIMIT, "query result truncated");
                break;
            }
            let mut cells = Vec::with_capacity(column_count);
            for idx in 0..column_count {
                let value = row
                    .get_ref(idx)
                    .map_err(|e| QueryError::Execution(e.to_string()))?;
                cells.push(cell_text(value));
            }
            table.push_row(cells);
        }
        Ok(table)
    }
}

fn cell_text(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null => "NULL".to_string(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(f) => f.to_string(),
        ValueRef::Text(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        ValueRef::Blob(bytes) => format!("<{} bytes>", bytes.len()),
    }
}

#[async_trait]
impl QueryExecutor for SqliteExecutor {
    fn source_name(&self) -> &str {
        &self.name
    }

    async fn query(&self, sql: &str) -> Result<Table, QueryError> {
        let path = self.path.clone();
        let sql = sql.to_string();
        tokio::task::spawn_blocking(move || Self::run(&path, &sql))
            .await
            .map_err(|e| QueryError::Execution(format!("query task failed: {}", e)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn seeded_db(dir: &Path) -> PathBuf {
        let path = dir.join("health.db");
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(
            "
            CREATE TABLE jobs (id INTEGER PRIMARY KEY, name TEXT, load REAL, note TEXT, payload BLOB);
            INSERT INTO jobs (name, load, note, payload) VALUES ('nightly', 0.5, NULL, x'0102');
            INSERT INTO jobs (name, load, note, payload) VALUES ('hourly', 1.25, 'late', NULL);
            ",
        )
        .unwrap();
        path
    }

    #[tokio::test]
    async fn test_sqlite_query_returns_table() {
        let dir = tempdir().unwrap();
        let executor = SqliteExecutor::new(seeded_db(dir.path()));

        let table = executor
            .query("SELECT name, load, note, payload FROM jobs ORDER BY id")
            .await
            .unwrap();

        assert_eq!(table.columns, vec!["name", "load", "note", "payload"]);
        assert_eq!(table.rows[0], vec!["nightly", "0.5", "NULL", "<2 bytes>"]);
        assert_eq!(table.rows[1], vec!["hourly", "1.25", "late", "NULL"]);
        assert!(executor.source_name().starts_with("sqlite:"));
    }

    #[tokio::test]
    async fn test_sqlite_rejects_writes() {
        let dir = tempdir().unwrap();
        let executor = SqliteExecutor::new(seeded_db(dir.path()));

        let err = executor.query("DELETE FROM jobs").await.unwrap_err();
        assert!(matches!(err, QueryError::Execution(_)));
    }

    #[tokio::test]
    async fn test_sqlite_bad_sql_is_execution_error() {
        let dir = tempdir().unwrap();
        let executor = SqliteExecutor::new(seeded_db(dir.path()));

        let err = executor.query("SELECT * FROM missing").await.unwrap_err();
        assert!(err.to_string().contains("missing"));
    }

    #[tokio::test]
    async fn test_sqlite_missing_file_is_connection_error() {
        let dir = tempdir().unwrap();
        let executor = SqliteExecutor::new(dir.path().join("absent.db"));

        let err = executor.query("SELECT 1").await.unwrap_err();
        assert!(matches!(err, QueryError::Connection(_)));
    }
}
