// Stored view domain model
use super::dataset::Dataset;
use chrono::{DateTime, Utc};

/// A named snapshot of a dataset and the query that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredView {
    pub name: String,
    pub query: String,
    pub dataset: Dataset,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StoredView {
    pub fn new(name: String, query: String, dataset: Dataset) -> Self {
        let now = Utc::now();
        Self {
            name,
            query,
            dataset,
            created_at: now,
            updated_at: now,
        }
    }
}
