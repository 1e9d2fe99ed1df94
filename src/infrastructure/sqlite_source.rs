// SQLite-backed relational source
use crate::application::relational_source::{ColumnInfo, RelationalSource, SourceError};
use crate::domain::dataset::Dataset;
use crate::infrastructure::sqlite_dataset::{quote_identifier, read_dataset, ReadError};
use async_trait::async_trait;
use rusqlite::{Connection, OpenFlags};
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct SqliteSource {
    path: PathBuf,
}

impl From<ReadError> for SourceError {
    fn from(err: ReadError) -> Self {
        match err {
            ReadError::Sqlite(e) => SourceError::Database(e.to_string()),
            ReadError::Shape(e) => SourceError::Shape(e),
        }
    }
}

impl SqliteSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Open a read-only connection on a blocking thread and run `f` on it.
    async fn with_connection<T, F>(&self, f: F) -> Result<T, SourceError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, SourceError> + Send + 'static,
    {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || {
            let conn = Connection::open_with_flags(&path, OpenFlags::SQLITE_OPEN_READ_ONLY)
                .map_err(|e| SourceError::Database(e.to_string()))?;
            f(&conn)
        })
        .await
        .map_err(|e| SourceError::Task(e.to_string()))?
    }
}

#[async_trait]
impl RelationalSource for SqliteSource {
    async fn execute(&self, sql: &str) -> Result<Dataset, SourceError> {
        let sql = sql.to_string();
        tracing::debug!("Executing source query: {}", sql);
        self.with_connection(move |conn| Ok(read_dataset(conn, &sql)?)).await
    }

    async fn list_tables(&self) -> Result<Vec<String>, SourceError> {
        self.with_connection(|conn| {
            let mut stmt = conn
                .prepare("SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'")
                .map_err(|e| SourceError::Database(e.to_string()))?;
            let names = stmt
                .query_map([], |row| row.get::<_, String>(0))
                .and_then(|rows| rows.collect::<rusqlite::Result<Vec<_>>>())
                .map_err(|e| SourceError::Database(e.to_string()))?;
            Ok(names)
        })
        .await
    }

    async fn describe_table(&self, table: &str) -> Result<Vec<ColumnInfo>, SourceError> {
        let sql = format!("PRAGMA table_info({})", quote_identifier(table));
        self.with_connection(move |conn| {
            let mut stmt = conn.prepare(&sql).map_err(|e| SourceError::Database(e.to_string()))?;
            let columns = stmt
                .query_map([], |row| {
                    Ok(ColumnInfo {
                        name: row.get(1)?,
                        data_type: row.get(2)?,
                    })
                })
                .and_then(|rows| rows.collect::<rusqlite::Result<Vec<_>>>())
                .map_err(|e| SourceError::Database(e.to_string()))?;
            Ok(columns)
        })
        .await
    }
}
