// View service - Use cases for loading, editing and inspecting views
use crate::application::relational_source::{ColumnInfo, RelationalSource, SourceError};
use crate::application::view_registry::ViewRegistry;
use crate::domain::duplicates::{find_duplicates, DuplicateReport};
use crate::domain::error::{DuplicateError, RegistryError};
use crate::domain::view::StoredView;
use std::sync::Arc;
use thiserror::Error;

/// Statements the source boundary accepts.
pub const ALLOWED_SQL_PREFIXES: [&str; 2] = ["SELECT", "WITH"];

#[derive(Debug, Error)]
pub enum ViewServiceError {
    #[error("enter a name for the view")]
    MissingName,
    #[error("select a table")]
    MissingTable,
    #[error("enter a SQL query")]
    MissingQuery,
    #[error("only queries starting with SELECT or WITH are allowed")]
    ReadOnly,
    #[error("table '{0}' does not exist")]
    UnknownTable(String),
    #[error("view '{0}' not found")]
    ViewNotFound(String),
    #[error("error running query: {0}")]
    Source(#[from] SourceError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Duplicates(#[from] DuplicateError),
}

/// Where a view's data comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuerySource {
    Table(String),
    Sql(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveViewRequest {
    /// Set when editing an existing view; differs from `name` on rename.
    pub original_name: Option<String>,
    pub name: String,
    pub source: QuerySource,
}

#[derive(Clone)]
pub struct ViewService {
    views: Arc<ViewRegistry>,
    source: Arc<dyn RelationalSource>,
}

pub fn is_read_only(sql: &str) -> bool {
    let upper = sql.trim_start().to_uppercase();
    ALLOWED_SQL_PREFIXES.iter().any(|prefix| upper.starts_with(prefix))
}

fn table_reference(table: &str) -> String {
    if table.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        table.to_string()
    } else {
        format!("\"{}\"", table.replace('"', "\"\""))
    }
}

impl ViewService {
    pub fn new(views: Arc<ViewRegistry>, source: Arc<dyn RelationalSource>) -> Self {
        Self { views, source }
    }

    pub fn list_views(&self) -> Vec<StoredView> {
        self.views.list()
    }

    pub fn get_view(&self, name: &str) -> Option<StoredView> {
        self.views.get(name)
    }

    pub async fn list_tables(&self) -> Result<Vec<String>, ViewServiceError> {
        Ok(self.source.list_tables().await?)
    }

    pub async fn describe_table(&self, table: &str) -> Result<Vec<ColumnInfo>, ViewServiceError> {
        Ok(self.source.describe_table(table).await?)
    }

    /// Turn a table pick or raw SQL into the query text stored with the view.
    async fn resolve_query(&self, source: &QuerySource) -> Result<String, ViewServiceError> {
        match source {
            QuerySource::Table(table) => {
                let table = table.trim();
                if table.is_empty() {
                    return Err(ViewServiceError::MissingTable);
                }
                let tables = self.source.list_tables().await?;
                if !tables.iter().any(|t| t == table) {
                    return Err(ViewServiceError::UnknownTable(table.to_string()));
                }
                Ok(format!("SELECT * FROM {}", table_reference(table)))
            }
            QuerySource::Sql(sql) => {
                let sql = sql.trim();
                if sql.is_empty() {
                    return Err(ViewServiceError::MissingQuery);
                }
                if !is_read_only(sql) {
                    return Err(ViewServiceError::ReadOnly);
                }
                Ok(sql.to_string())
            }
        }
    }

    /// Create a view, or edit one when `original_name` is set. The query runs
    /// before the registry is touched, so a failing query changes nothing.
    pub async fn save(&self, request: SaveViewRequest) -> Result<StoredView, ViewServiceError> {
        let name = request.name.trim();
        if name.is_empty() {
            return Err(ViewServiceError::MissingName);
        }
        let query = self.resolve_query(&request.source).await?;
        let dataset = self.source.execute(&query).await?;

        let original = request.original_name.as_deref().map(str::trim).filter(|n| !n.is_empty());
        let stored = match original {
            Some(original) => {
                let stored = self.views.rename_and_update(original, name, &query, dataset)?;
                if original != name {
                    tracing::info!("Renamed view {} to {}", original, name);
                }
                stored
            }
            None => self.views.save(name, &query, dataset)?,
        };
        tracing::info!("Saved view {} with {} rows", stored.name, stored.dataset.row_count());
        Ok(stored)
    }

    /// Re-run the view's stored query. On failure the old data stays.
    pub async fn refresh(&self, name: &str) -> Result<StoredView, ViewServiceError> {
        let stored = self
            .views
            .get(name)
            .ok_or_else(|| ViewServiceError::ViewNotFound(name.to_string()))?;
        match self.source.execute(&stored.query).await {
            Ok(dataset) => {
                let refreshed = self.views.update(name, &stored.query, dataset)?;
                tracing::info!("Refreshed view {} ({} rows)", name, refreshed.dataset.row_count());
                Ok(refreshed)
            }
            Err(e) => {
                tracing::warn!("Keeping previous data for view {}: {}", name, e);
                Err(e.into())
            }
        }
    }

    pub fn delete(&self, name: &str) {
        self.views.delete(name);
        tracing::info!("Deleted view {}", name);
    }

    pub fn duplicates(&self, view_name: &str, columns: &[String]) -> Result<DuplicateReport, ViewServiceError> {
        let stored = self
            .views
            .get(view_name)
            .ok_or_else(|| ViewServiceError::ViewNotFound(view_name.to_string()))?;
        let subset: Vec<&str> = columns.iter().map(String::as_str).collect();
        Ok(find_duplicates(&stored.dataset, &subset)?)
    }
}
