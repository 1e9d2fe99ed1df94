// Domain error types
use thiserror::Error;

/// Failures building a [`Dataset`](super::dataset::Dataset).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DatasetError {
    #[error("column '{column}' has {actual} rows, expected {expected}")]
    RaggedColumns {
        column: String,
        expected: usize,
        actual: usize,
    },
    #[error("row {row} has {actual} values, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        actual: usize,
    },
    #[error("column '{0}' appears more than once")]
    DuplicateColumn(String),
}

/// Registry key errors shared by the view and dashboard registries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("'{0}' not found")]
    NotFound(String),
    #[error("'{0}' already exists")]
    AlreadyExists(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    #[error("invalid filter '{line}': {reason}")]
    InvalidFilter { line: String, reason: String },
    #[error("column '{0}' not found in view")]
    ColumnNotFound(String),
}

/// Reasons a visualization could not be rendered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("view '{0}' does not exist")]
    ViewNotFound(String),
    #[error(transparent)]
    Filter(#[from] FilterError),
    #[error("the '{0}' column mapping is required for this visualization")]
    MissingField(&'static str),
    #[error("columns not found: {}", .0.join(", "))]
    MissingColumns(Vec<String>),
    #[error("no data left to chart after applying filters")]
    EmptyDataset,
    #[error("unknown visualization kind: {0}")]
    UnknownVisualizationKind(String),
    #[error("column '{column}' holds non-numeric value '{value}'")]
    NonNumericValue { column: String, value: String },
    #[error("could not serialize chart: {0}")]
    ChartSerialization(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DuplicateError {
    #[error("select at least one column to check for duplicates")]
    NoColumnsSelected,
    #[error("column '{0}' not found in view")]
    ColumnNotFound(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("query text is empty")]
    Empty,
    #[error("query failed: {0}")]
    Execution(String),
}
