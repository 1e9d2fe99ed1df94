// Dashboard service - Use cases for building and maintaining dashboard items
use crate::application::dashboard_registry::DashboardRegistry;
use crate::application::view_registry::ViewRegistry;
use crate::application::visualization::VisualizationBuilder;
use crate::domain::dashboard::{
    split_column_list, ColumnMapping, DashboardItem, Rendered, VisualizationDefinition, VizKind,
};
use crate::domain::error::{BuildError, RegistryError};
use std::sync::Arc;
use thiserror::Error;

/// Distinct values offered per column in the dashboard filter form.
const MAX_FILTER_VALUES: usize = 50;

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("choose a view to build the visualization")]
    MissingView,
    #[error("dashboard item '{0}' not found")]
    ItemNotFound(String),
    #[error(transparent)]
    Build(#[from] BuildError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Raw builder form input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisualizationRequest {
    pub name: Option<String>,
    pub view_name: Option<String>,
    pub viz_kind: String,
    pub columns: ColumnMapping,
    pub filters_text: String,
}

/// One row of the per-item filter form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterInput {
    pub column: String,
    pub operator: String,
    pub value: String,
}

/// Columns and sample values the filter form of an item can offer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterMetadata {
    /// Columns the visualization itself reads
    pub used: Vec<String>,
    pub allowed: Vec<String>,
    pub values: Vec<(String, Vec<String>)>,
}

/// Join complete (column, operator, value) rows into filter text.
pub fn compose_filters(inputs: &[FilterInput]) -> String {
    inputs
        .iter()
        .filter_map(|input| {
            let (column, operator, value) = (input.column.trim(), input.operator.trim(), input.value.trim());
            (!column.is_empty() && !operator.is_empty() && !value.is_empty())
                .then(|| format!("{} {} {}", column, operator, value))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Clone)]
pub struct DashboardService {
    views: Arc<ViewRegistry>,
    items: Arc<DashboardRegistry>,
    builder: VisualizationBuilder,
}

impl DashboardService {
    pub fn new(views: Arc<ViewRegistry>, items: Arc<DashboardRegistry>) -> Self {
        let builder = VisualizationBuilder::new(views.clone());
        Self { views, items, builder }
    }

    pub fn list_items(&self) -> Vec<DashboardItem> {
        self.items.list()
    }

    pub fn get_item(&self, id: &str) -> Option<DashboardItem> {
        self.items.get(id)
    }

    /// Column names of a view, empty when it does not exist.
    pub fn view_columns(&self, view_name: &str) -> Vec<String> {
        self.views
            .get(view_name)
            .map(|v| v.dataset.column_names().into_iter().map(String::from).collect())
            .unwrap_or_default()
    }

    fn render(&self, request: VisualizationRequest) -> Result<(VisualizationDefinition, Rendered), DashboardError> {
        let view_name = request
            .view_name
            .filter(|v| !v.trim().is_empty())
            .ok_or(DashboardError::MissingView)?;
        let viz_kind: VizKind = request.viz_kind.parse()?;
        let name = request
            .name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| viz_kind.title().to_string());
        let definition = VisualizationDefinition {
            name,
            view_name,
            viz_kind,
            columns: request.columns,
            filters_text: request.filters_text,
        };
        let rendered = self.builder.build_definition(&definition)?;
        Ok((definition, rendered))
    }

    pub fn preview(&self, request: VisualizationRequest) -> Result<Rendered, DashboardError> {
        self.render(request).map(|(_, rendered)| rendered)
    }

    pub fn add(&self, request: VisualizationRequest) -> Result<DashboardItem, DashboardError> {
        let (definition, rendered) = self.render(request)?;
        let item = self.items.add(definition, rendered);
        tracing::info!("Added dashboard item {} ({})", item.id, item.name);
        Ok(item)
    }

    pub fn update(&self, id: &str, request: VisualizationRequest) -> Result<DashboardItem, DashboardError> {
        if self.items.get(id).is_none() {
            return Err(DashboardError::ItemNotFound(id.to_string()));
        }
        let (definition, rendered) = self.render(request)?;
        let item = self.items.update(id, definition, rendered)?;
        tracing::info!("Updated dashboard item {} ({})", item.id, item.name);
        Ok(item)
    }

    /// Re-render an item with new filters. The item is only touched when the
    /// render succeeds, so its previous output survives a failure.
    pub fn apply_filters(&self, id: &str, inputs: &[FilterInput]) -> Result<DashboardItem, DashboardError> {
        let item = self
            .items
            .get(id)
            .ok_or_else(|| DashboardError::ItemNotFound(id.to_string()))?;
        let definition = VisualizationDefinition {
            filters_text: compose_filters(inputs),
            ..item.definition()
        };
        let rendered = self
            .builder
            .build_definition(&definition)
            .inspect_err(|e| tracing::warn!("Keeping previous render of {}: {}", item.id, e))?;
        Ok(self.items.apply_filters(id, &definition.filters_text, rendered)?)
    }

    pub fn delete(&self, id: &str) {
        self.items.delete(id);
        tracing::info!("Deleted dashboard item {}", id);
    }

    pub fn filter_metadata(&self, item: &DashboardItem) -> FilterMetadata {
        let Some(view) = self.views.get(&item.view_name) else {
            return FilterMetadata::default();
        };
        let available: Vec<&str> = view.dataset.column_names();
        let present = |names: Vec<&str>| -> Vec<String> {
            names
                .into_iter()
                .filter(|n| available.contains(n))
                .map(String::from)
                .collect()
        };

        let used = match item.viz_kind {
            VizKind::Table => {
                let selected = present(item.columns.table_column_list());
                if selected.is_empty() {
                    present(available.clone())
                } else {
                    selected
                }
            }
            VizKind::Pie => present(
                [item.columns.names.as_deref(), item.columns.values.as_deref()]
                    .into_iter()
                    .flatten()
                    .collect(),
            ),
        };
        let extra = present(split_column_list(item.columns.filter_columns.as_deref()));

        let mut allowed: Vec<String> = Vec::new();
        for column in used.iter().chain(&extra) {
            if !allowed.contains(column) {
                allowed.push(column.clone());
            }
        }
        if allowed.is_empty() {
            allowed = present(available.clone());
        }

        let values = allowed
            .iter()
            .filter_map(|name| {
                let column = view.dataset.column(name)?;
                let distinct: Vec<String> = column
                    .distinct_values(MAX_FILTER_VALUES)
                    .into_iter()
                    .map(|v| v.to_string())
                    .collect();
                (!distinct.is_empty()).then(|| (name.clone(), distinct))
            })
            .collect();

        FilterMetadata { used, allowed, values }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::dataset::{Dataset, Value};

    fn flights_today() -> Dataset {
        Dataset::from_rows(
            vec!["airline", "status", "flights"],
            vec![
                vec!["Azul".into(), "Delayed".into(), Value::Int(1)],
                vec!["Gol".into(), "Arrived".into(), Value::Int(1)],
                vec!["Azul".into(), "Arrived".into(), Value::Int(1)],
            ],
        )
        .unwrap()
    }

    fn service() -> (Arc<ViewRegistry>, DashboardService) {
        let views = Arc::new(ViewRegistry::new());
        views.save("flights_today", "SELECT * FROM flights", flights_today()).unwrap();
        let service = DashboardService::new(views.clone(), Arc::new(DashboardRegistry::new()));
        (views, service)
    }

    fn pie_request() -> VisualizationRequest {
        VisualizationRequest {
            name: Some("By airline".to_string()),
            view_name: Some("flights_today".to_string()),
            viz_kind: "pie".to_string(),
            columns: ColumnMapping {
                names: Some("airline".to_string()),
                values: Some("flights".to_string()),
                ..Default::default()
            },
            filters_text: String::new(),
        }
    }

    fn filter(column: &str, operator: &str, value: &str) -> FilterInput {
        FilterInput {
            column: column.to_string(),
            operator: operator.to_string(),
            value: value.to_string(),
        }
    }

    #[test]
    fn test_compose_filters_skips_incomplete_rows() {
        let text = compose_filters(&[
            filter("status", "=", "Arrived"),
            filter("airline", "", "Gol"),
            filter(" airline ", "contains", " az "),
        ]);
        assert_eq!(text, "status = Arrived\nairline contains az");
    }

    #[test]
    fn test_add_defaults_name_from_kind() {
        let (_, service) = service();
        let item = service
            .add(VisualizationRequest {
                name: Some("  ".to_string()),
                view_name: Some("flights_today".to_string()),
                viz_kind: "table".to_string(),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(item.name, "Table");
        assert!(matches!(item.rendered, Rendered::Table { row_count: 3, .. }));
        assert_eq!(service.list_items().len(), 1);
    }

    #[test]
    fn test_preview_does_not_persist() {
        let (_, service) = service();
        let rendered = service.preview(pie_request()).unwrap();
        assert!(matches!(rendered, Rendered::Chart { .. }));
        assert!(service.list_items().is_empty());
        assert!(matches!(
            service.preview(VisualizationRequest::default()),
            Err(DashboardError::MissingView)
        ));
    }

    #[test]
    fn test_failed_update_keeps_item() {
        let (_, service) = service();
        let item = service.add(pie_request()).unwrap();
        let mut broken = pie_request();
        broken.columns.values = None;
        assert!(matches!(
            service.update(&item.id, broken),
            Err(DashboardError::Build(BuildError::MissingField("values")))
        ));
        assert_eq!(service.get_item(&item.id).unwrap(), item);
        assert!(matches!(
            service.update("missing", pie_request()),
            Err(DashboardError::ItemNotFound(_))
        ));
    }

    #[test]
    fn test_apply_filters_rerenders() {
        let (_, service) = service();
        let item = service.add(pie_request()).unwrap();
        let updated = service
            .apply_filters(&item.id, &[filter("status", "=", "Arrived")])
            .unwrap();
        assert_eq!(updated.filters_text, "status = Arrived");
        assert_eq!(updated.name, "By airline");
        assert_ne!(updated.rendered, item.rendered);
    }

    #[test]
    fn test_apply_filters_after_view_deleted_keeps_render() {
        let (views, service) = service();
        let item = service.add(pie_request()).unwrap();
        views.delete("flights_today");

        let err = service
            .apply_filters(&item.id, &[filter("status", "=", "Arrived")])
            .unwrap_err();
        assert!(matches!(err, DashboardError::Build(BuildError::ViewNotFound(_))));
        let kept = service.get_item(&item.id).unwrap();
        assert_eq!(kept.rendered, item.rendered);
        assert_eq!(kept.filters_text, "");
    }

    #[test]
    fn test_filter_metadata_for_pie() {
        let (_, service) = service();
        let mut request = pie_request();
        request.columns.filter_columns = Some("status, gate".to_string());
        let item = service.add(request).unwrap();

        let metadata = service.filter_metadata(&item);
        assert_eq!(metadata.used, vec!["airline", "flights"]);
        assert_eq!(metadata.allowed, vec!["airline", "flights", "status"]);
        assert_eq!(
            metadata.values[0],
            ("airline".to_string(), vec!["Azul".to_string(), "Gol".to_string()])
        );
    }

    #[test]
    fn test_filter_metadata_for_table_and_missing_view() {
        let (views, service) = service();
        let item = service
            .add(VisualizationRequest {
                view_name: Some("flights_today".to_string()),
                viz_kind: "table".to_string(),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(service.filter_metadata(&item).allowed, vec!["airline", "status", "flights"]);

        views.delete("flights_today");
        assert_eq!(service.filter_metadata(&item), FilterMetadata::default());
        assert!(service.view_columns("flights_today").is_empty());
    }
}
