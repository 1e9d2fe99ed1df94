// Conversions between SQLite rows and datasets
use crate::domain::dataset::{Dataset, Value};
use crate::domain::error::DatasetError;
use rusqlite::types::{ToSql, ToSqlOutput, ValueRef};
use rusqlite::Connection;
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReadError {
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
    #[error(transparent)]
    Shape(#[from] DatasetError),
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        use rusqlite::types::Value as Sql;
        Ok(match self {
            Value::Null => ToSqlOutput::Owned(Sql::Null),
            Value::Bool(b) => ToSqlOutput::Owned(Sql::Integer(i64::from(*b))),
            Value::Int(i) => ToSqlOutput::Owned(Sql::Integer(*i)),
            Value::Float(f) => ToSqlOutput::Owned(Sql::Real(*f)),
            Value::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
        })
    }
}

fn from_sql(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Int(i),
        ValueRef::Real(f) => Value::Float(f),
        ValueRef::Text(bytes) => Value::Text(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => Value::Text(format!("<{} bytes>", bytes.len())),
    }
}

/// Quote an identifier for use in generated SQL.
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Result sets may repeat a column name (`SELECT a.id, b.id ...`); later
/// repeats get a numeric suffix. SQLite identifiers ignore ASCII case, so
/// `ID` and `id` count as a repeat.
pub fn unique_column_names(names: Vec<String>) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    names
        .into_iter()
        .map(|name| {
            let mut candidate = name.clone();
            let mut n = 1;
            while !seen.insert(candidate.to_ascii_lowercase()) {
                candidate = format!("{}_{}", name, n);
                n += 1;
            }
            candidate
        })
        .collect()
}

/// Run `sql` and collect every row into a dataset.
pub fn read_dataset(conn: &Connection, sql: &str) -> Result<Dataset, ReadError> {
    let mut stmt = conn.prepare(sql)?;
    let names = unique_column_names(stmt.column_names().into_iter().map(String::from).collect());
    let width = names.len();
    let rows = stmt
        .query_map([], |row| {
            (0..width)
                .map(|i| row.get_ref(i).map(from_sql))
                .collect::<rusqlite::Result<Vec<Value>>>()
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(Dataset::from_rows(names, rows)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_dataset_maps_types() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE t (i INTEGER, r REAL, s TEXT, n TEXT);
             INSERT INTO t VALUES (1, 2.5, 'x', NULL);",
        )
        .unwrap();
        let data = read_dataset(&conn, "SELECT * FROM t").unwrap();
        assert_eq!(data.column_names(), vec!["i", "r", "s", "n"]);
        assert_eq!(
            data.row(0).unwrap(),
            vec![&Value::Int(1), &Value::Float(2.5), &Value::Text("x".to_string()), &Value::Null]
        );
    }

    #[test]
    fn test_repeated_column_names_get_suffix() {
        let conn = Connection::open_in_memory().unwrap();
        let data = read_dataset(&conn, "SELECT 1 AS id, 2 AS id, 3 AS id").unwrap();
        assert_eq!(data.column_names(), vec!["id", "id_1", "id_2"]);
    }

    #[test]
    fn test_column_names_differing_in_case_get_suffix() {
        let conn = Connection::open_in_memory().unwrap();
        let data = read_dataset(&conn, "SELECT 1 AS ID, 2 AS id, 3 AS Id_1").unwrap();
        assert_eq!(data.column_names(), vec!["ID", "id_1", "Id_1_1"]);
    }

    #[test]
    fn test_quote_identifier() {
        assert_eq!(quote_identifier("flights"), "\"flights\"");
        assert_eq!(quote_identifier("odd\"name"), "\"odd\"\"name\"");
    }
}
