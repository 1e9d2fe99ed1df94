// In-memory SQLite engine for ad-hoc queries across views
use crate::application::relational_source::ScratchEngine;
use crate::domain::dataset::Dataset;
use crate::domain::error::QueryError;
use crate::domain::view::StoredView;
use crate::infrastructure::sqlite_dataset::{quote_identifier, read_dataset, unique_column_names};
use async_trait::async_trait;
use rusqlite::{params_from_iter, Connection};
use std::collections::HashMap;

/// Creates a fresh `:memory:` database on every call.
#[derive(Debug, Clone, Default)]
pub struct SqliteScratchEngine;

impl SqliteScratchEngine {
    pub fn new() -> Self {
        Self
    }
}

fn execution(err: impl std::fmt::Display) -> QueryError {
    QueryError::Execution(err.to_string())
}

/// Create a table named after the view and copy its rows in.
fn materialize(conn: &mut Connection, view: &StoredView) -> rusqlite::Result<()> {
    let dataset = &view.dataset;
    let table = quote_identifier(&view.name);
    let names = unique_column_names(dataset.column_names().into_iter().map(String::from).collect());
    let definitions: Vec<String> = dataset
        .columns()
        .iter()
        .zip(&names)
        .map(|(c, name)| format!("{} {}", quote_identifier(name), c.kind().sql_type()).trim_end().to_string())
        .collect();

    let tx = conn.transaction()?;
    tx.execute(&format!("DROP TABLE IF EXISTS {}", table), [])?;
    if definitions.is_empty() {
        // SQLite tables need at least one column
        tx.execute(&format!("CREATE TABLE {} (_empty)", table), [])?;
        return tx.commit();
    }
    tx.execute(&format!("CREATE TABLE {} ({})", table, definitions.join(", ")), [])?;
    {
        let placeholders = vec!["?"; definitions.len()].join(", ");
        let mut stmt = tx.prepare(&format!("INSERT INTO {} VALUES ({})", table, placeholders))?;
        for row in dataset.rows() {
            stmt.execute(params_from_iter(row))?;
        }
    }
    tx.commit()
}

/// Table names are case-insensitive in SQLite, so `Flights` and `flights`
/// cannot both be loaded.
fn check_table_names(views: &[StoredView]) -> Result<(), QueryError> {
    let mut seen: HashMap<String, &str> = HashMap::new();
    for view in views {
        if let Some(other) = seen.insert(view.name.to_ascii_lowercase(), &view.name) {
            return Err(QueryError::Execution(format!(
                "views '{}' and '{}' differ only by letter case; rename one to query them",
                other, view.name
            )));
        }
    }
    Ok(())
}

fn run_blocking(views: &[StoredView], sql: &str) -> Result<Dataset, QueryError> {
    check_table_names(views)?;
    let mut conn = Connection::open_in_memory().map_err(execution)?;
    for view in views {
        materialize(&mut conn, view).map_err(|e| {
            QueryError::Execution(format!("could not load view '{}': {}", view.name, e))
        })?;
    }
    read_dataset(&conn, sql).map_err(execution)
}

#[async_trait]
impl ScratchEngine for SqliteScratchEngine {
    async fn run(&self, views: Vec<StoredView>, sql: &str) -> Result<Dataset, QueryError> {
        if sql.trim().is_empty() {
            return Err(QueryError::Empty);
        }
        let sql = sql.to_string();
        tracing::debug!("Materializing {} views for ad-hoc query", views.len());
        tokio::task::spawn_blocking(move || run_blocking(&views, &sql))
            .await
            .map_err(execution)?
    }
}
