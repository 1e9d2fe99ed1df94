// Traits for relational data access
use crate::domain::dataset::Dataset;
use crate::domain::error::{DatasetError, QueryError};
use crate::domain::view::StoredView;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("database error: {0}")]
    Database(String),
    #[error("unexpected result shape: {0}")]
    Shape(#[from] DatasetError),
    #[error("database task failed: {0}")]
    Task(String),
}

/// Name and declared type of a source table column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
}

/// Read-only access to the seeded source database.
#[async_trait]
pub trait RelationalSource: Send + Sync {
    /// Run a query and collect the full result
    async fn execute(&self, sql: &str) -> Result<Dataset, SourceError>;

    /// User tables, excluding SQLite internals
    async fn list_tables(&self) -> Result<Vec<String>, SourceError>;

    async fn describe_table(&self, table: &str) -> Result<Vec<ColumnInfo>, SourceError>;
}

/// Throwaway relational engine for cross-view queries.
#[async_trait]
pub trait ScratchEngine: Send + Sync {
    /// Load `views` as same-named tables into a fresh database, run `sql`,
    /// then discard the database.
    async fn run(&self, views: Vec<StoredView>, sql: &str) -> Result<Dataset, QueryError>;
}
