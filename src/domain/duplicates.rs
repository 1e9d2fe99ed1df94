// Duplicate row detection over a subset of columns
use super::dataset::{CellKey, Column, Dataset};
use super::error::DuplicateError;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct DuplicateReport {
    /// Every row whose subset values occur more than once, sorted by the subset.
    pub rows: Dataset,
    /// Rows that repeat an earlier row (the first occurrence is not counted).
    pub duplicate_count: usize,
}

impl DuplicateReport {
    pub fn has_duplicates(&self) -> bool {
        self.duplicate_count > 0
    }
}

pub fn find_duplicates(dataset: &Dataset, subset: &[&str]) -> Result<DuplicateReport, DuplicateError> {
    if subset.is_empty() {
        return Err(DuplicateError::NoColumnsSelected);
    }
    let columns = subset
        .iter()
        .map(|name| {
            dataset
                .column(name)
                .ok_or_else(|| DuplicateError::ColumnNotFound(name.to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut occurrences: HashMap<Vec<CellKey>, usize> = HashMap::new();
    for row in 0..dataset.row_count() {
        *occurrences.entry(row_key(&columns, row)).or_default() += 1;
    }

    let duplicate_count = occurrences.values().map(|n| n - 1).sum();
    let mut indices: Vec<usize> = (0..dataset.row_count())
        .filter(|&row| occurrences.get(&row_key(&columns, row)).copied().unwrap_or(0) > 1)
        .collect();
    indices.sort_by(|&a, &b| {
        columns
            .iter()
            .map(|c| c.values[a].sort_cmp(&c.values[b]))
            .find(|ordering| ordering.is_ne())
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    Ok(DuplicateReport {
        rows: dataset.take_rows(&indices),
        duplicate_count,
    })
}

fn row_key<'a>(columns: &[&'a Column], row: usize) -> Vec<CellKey<'a>> {
    columns.iter().map(|c| c.values[row].key()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::dataset::Value;

    fn flights() -> Dataset {
        Dataset::from_rows(
            vec!["flight_id", "airline", "origin"],
            vec![
                vec![Value::Int(1), "Gol".into(), "GRU".into()],
                vec![Value::Int(2), "Azul".into(), "GIG".into()],
                vec![Value::Int(3), "Gol".into(), "BSB".into()],
                vec![Value::Int(4), "Azul".into(), "GIG".into()],
                vec![Value::Int(5), "Gol".into(), "GRU".into()],
                vec![Value::Int(6), "LATAM".into(), "POA".into()],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_duplicates_include_all_occurrences_sorted() {
        let report = find_duplicates(&flights(), &["airline", "origin"]).unwrap();
        assert_eq!(report.duplicate_count, 2);
        assert!(report.has_duplicates());
        let ids: Vec<String> = report.rows.column("flight_id").unwrap().values.iter().map(|v| v.to_string()).collect();
        assert_eq!(ids, vec!["2", "4", "1", "5"]);
    }

    #[test]
    fn test_single_column_subset() {
        let report = find_duplicates(&flights(), &["airline"]).unwrap();
        // Gol x3 contributes 2, Azul x2 contributes 1
        assert_eq!(report.duplicate_count, 3);
        assert_eq!(report.rows.row_count(), 5);
    }

    #[test]
    fn test_no_duplicates() {
        let report = find_duplicates(&flights(), &["flight_id"]).unwrap();
        assert!(!report.has_duplicates());
        assert!(report.rows.is_empty());
    }

    #[test]
    fn test_errors() {
        assert_eq!(find_duplicates(&flights(), &[]).unwrap_err(), DuplicateError::NoColumnsSelected);
        assert_eq!(
            find_duplicates(&flights(), &["gate"]).unwrap_err(),
            DuplicateError::ColumnNotFound("gate".to_string())
        );
    }
}
