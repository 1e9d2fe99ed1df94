// Sandbox service - Ad-hoc queries across every saved view
use crate::application::relational_source::ScratchEngine;
use crate::application::view_registry::ViewRegistry;
use crate::domain::dataset::{ColumnKind, Dataset};
use crate::domain::error::{QueryError, RegistryError};
use crate::domain::view::StoredView;
use std::sync::Arc;

/// Column names and inferred kinds of one view, shown next to the editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewSummary {
    pub name: String,
    pub columns: Vec<(String, ColumnKind)>,
}

#[derive(Clone)]
pub struct SandboxService {
    views: Arc<ViewRegistry>,
    engine: Arc<dyn ScratchEngine>,
}

impl SandboxService {
    pub fn new(views: Arc<ViewRegistry>, engine: Arc<dyn ScratchEngine>) -> Self {
        Self { views, engine }
    }

    /// Run `sql` against a snapshot of the registry taken now.
    pub async fn run(&self, sql: &str) -> Result<Dataset, QueryError> {
        let snapshot = self.views.list();
        let result = self.engine.run(snapshot, sql).await;
        match &result {
            Ok(dataset) => tracing::info!("Ad-hoc query returned {} rows", dataset.row_count()),
            Err(e) => tracing::warn!("Ad-hoc query failed: {}", e),
        }
        result
    }

    /// Keep a query result as a new view.
    pub fn save_result(&self, name: &str, sql: &str, dataset: Dataset) -> Result<StoredView, RegistryError> {
        let stored = self.views.save(name.trim(), sql, dataset)?;
        tracing::info!("Saved sandbox result as view {}", stored.name);
        Ok(stored)
    }

    pub fn view_summaries(&self) -> Vec<ViewSummary> {
        self.views
            .list()
            .into_iter()
            .map(|view| ViewSummary {
                columns: view
                    .dataset
                    .columns()
                    .iter()
                    .map(|c| (c.name.clone(), c.kind()))
                    .collect(),
                name: view.name,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::dataset::Value;
    use crate::infrastructure::scratch_engine::SqliteScratchEngine;

    fn service() -> (Arc<ViewRegistry>, SandboxService) {
        let views = Arc::new(ViewRegistry::new());
        let flights = Dataset::from_rows(
            vec!["airline", "passengers"],
            vec![
                vec!["Azul".into(), Value::Int(120)],
                vec!["Gol".into(), Value::Int(80)],
            ],
        )
        .unwrap();
        views.save("flights", "SELECT * FROM flights", flights).unwrap();
        let service = SandboxService::new(views.clone(), Arc::new(SqliteScratchEngine::new()));
        (views, service)
    }

    #[tokio::test]
    async fn test_run_sees_latest_registry_state() {
        let (views, service) = service();
        let result = service.run("SELECT SUM(passengers) AS total FROM flights").await.unwrap();
        assert_eq!(result.row(0).unwrap(), vec![&Value::Int(200)]);

        views
            .update(
                "flights",
                "SELECT 1",
                Dataset::from_rows(vec!["passengers"], vec![vec![Value::Int(5)]]).unwrap(),
            )
            .unwrap();
        let result = service.run("SELECT SUM(passengers) AS total FROM flights").await.unwrap();
        assert_eq!(result.row(0).unwrap(), vec![&Value::Int(5)]);
    }

    #[tokio::test]
    async fn test_save_result_as_view() {
        let (views, service) = service();
        let sql = "SELECT airline FROM flights WHERE passengers > 100";
        let result = service.run(sql).await.unwrap();
        service.save_result("big_flights", sql, result).unwrap();
        assert_eq!(views.get("big_flights").unwrap().dataset.row_count(), 1);

        let again = service.run(sql).await.unwrap();
        assert_eq!(
            service.save_result("big_flights", sql, again).unwrap_err(),
            RegistryError::AlreadyExists("big_flights".to_string())
        );
    }

    #[tokio::test]
    async fn test_query_error() {
        let (_, service) = service();
        assert!(matches!(
            service.run("SELECT * FROM nowhere").await,
            Err(QueryError::Execution(_))
        ));
    }

    #[test]
    fn test_view_summaries() {
        let (_, service) = service();
        assert_eq!(
            service.view_summaries(),
            vec![ViewSummary {
                name: "flights".to_string(),
                columns: vec![
                    ("airline".to_string(), ColumnKind::Text),
                    ("passengers".to_string(), ColumnKind::Integer),
                ],
            }]
        );
    }
}
