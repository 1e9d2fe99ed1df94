// Visualization builder - renders a view into a table or chart
use crate::application::view_registry::ViewRegistry;
use crate::domain::chart::{ChartSpec, PieSlice};
use crate::domain::dashboard::{ColumnMapping, Rendered, VisualizationDefinition, VizKind};
use crate::domain::dataset::{CellKey, Dataset, Value};
use crate::domain::error::BuildError;
use crate::domain::filter::apply_filters;
use crate::infrastructure::html::dataset_to_html;
use std::collections::HashMap;
use std::sync::Arc;

/// Rendered tables never show more rows than this.
pub const MAX_TABLE_ROWS: usize = 500;

/// Pure render path shared by previews, dashboard adds/updates and filter
/// reapplication. Reads the view registry, never writes to it.
#[derive(Clone)]
pub struct VisualizationBuilder {
    views: Arc<ViewRegistry>,
}

impl VisualizationBuilder {
    pub fn new(views: Arc<ViewRegistry>) -> Self {
        Self { views }
    }

    pub fn build(
        &self,
        view_name: &str,
        viz_kind: &str,
        columns: &ColumnMapping,
        filters_text: &str,
    ) -> Result<Rendered, BuildError> {
        let view = self
            .views
            .get(view_name)
            .ok_or_else(|| BuildError::ViewNotFound(view_name.to_string()))?;
        let filtered = apply_filters(&view.dataset, filters_text)?;

        match viz_kind.parse::<VizKind>()? {
            VizKind::Table => render_table(&filtered, columns),
            VizKind::Pie => render_pie(&filtered, columns),
        }
    }

    pub fn build_definition(&self, definition: &VisualizationDefinition) -> Result<Rendered, BuildError> {
        self.build(
            &definition.view_name,
            definition.viz_kind.as_str(),
            &definition.columns,
            &definition.filters_text,
        )
    }
}

fn render_table(dataset: &Dataset, columns: &ColumnMapping) -> Result<Rendered, BuildError> {
    let selected = columns.table_column_list();
    let projected = if selected.is_empty() {
        dataset.head(MAX_TABLE_ROWS)
    } else {
        dataset
            .select(&selected)
            .map_err(BuildError::MissingColumns)?
            .head(MAX_TABLE_ROWS)
    };
    Ok(Rendered::Table {
        table_html: dataset_to_html(&projected),
        row_count: projected.row_count(),
    })
}

fn render_pie(dataset: &Dataset, columns: &ColumnMapping) -> Result<Rendered, BuildError> {
    if dataset.is_empty() {
        return Err(BuildError::EmptyDataset);
    }
    let names = columns.names.as_deref().ok_or(BuildError::MissingField("names"))?;
    let values = columns.values.as_deref().ok_or(BuildError::MissingField("values"))?;
    let projected = dataset.select(&[names, values]).map_err(BuildError::MissingColumns)?;
    let slices = pie_slices(&projected, names, values)?;

    let chart_json = ChartSpec::pie(names, slices)
        .to_json()
        .map_err(|e| BuildError::ChartSerialization(e.to_string()))?;
    Ok(Rendered::Chart { chart_json })
}

/// One slice per distinct name in first-appearance order, values summed.
/// Rows with a null name or value are left out.
fn pie_slices(dataset: &Dataset, names: &str, values: &str) -> Result<Vec<PieSlice>, BuildError> {
    let (Some(name_column), Some(value_column)) = (dataset.column(names), dataset.column(values)) else {
        return Err(BuildError::MissingColumns(vec![names.to_string(), values.to_string()]));
    };

    let mut slices: Vec<PieSlice> = Vec::new();
    let mut positions: HashMap<CellKey<'_>, usize> = HashMap::new();
    for (name, value) in name_column.values.iter().zip(&value_column.values) {
        if name.is_null() || value.is_null() {
            continue;
        }
        let amount = numeric(value).ok_or_else(|| BuildError::NonNumericValue {
            column: values.to_string(),
            value: value.to_string(),
        })?;
        match positions.get(&name.key()) {
            Some(&index) => slices[index].value += amount,
            None => {
                positions.insert(name.key(), slices.len());
                slices.push(PieSlice {
                    label: name.to_string(),
                    value: amount,
                });
            }
        }
    }
    Ok(slices)
}

fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Text(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        other => other.as_f64(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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

    fn builder_with(name: &str, dataset: Dataset) -> (Arc<ViewRegistry>, VisualizationBuilder) {
        let views = Arc::new(ViewRegistry::new());
        views.save(name, "SELECT * FROM flights", dataset).unwrap();
        (views.clone(), VisualizationBuilder::new(views))
    }

    fn pie_mapping() -> ColumnMapping {
        ColumnMapping {
            names: Some("airline".to_string()),
            values: Some("flights".to_string()),
            ..Default::default()
        }
    }

    fn chart(rendered: Rendered) -> serde_json::Value {
        match rendered {
            Rendered::Chart { chart_json } => serde_json::from_str(&chart_json).unwrap(),
            other => panic!("expected chart, got {:?}", other),
        }
    }

    #[test]
    fn test_pie_end_to_end() {
        let (_, builder) = builder_with("flights_today", flights_today());
        let rendered = builder
            .build("flights_today", "pie", &pie_mapping(), "status = Arrived")
            .unwrap();
        let spec = chart(rendered);
        assert_eq!(spec["data"][0]["labels"], serde_json::json!(["Gol", "Azul"]));
        assert_eq!(spec["data"][0]["values"], serde_json::json!([1.0, 1.0]));
    }

    #[test]
    fn test_pie_sums_duplicate_names() {
        let (_, builder) = builder_with("flights_today", flights_today());
        let spec = chart(builder.build("flights_today", "pie", &pie_mapping(), "").unwrap());
        assert_eq!(spec["data"][0]["labels"], serde_json::json!(["Azul", "Gol"]));
        assert_eq!(spec["data"][0]["values"], serde_json::json!([2.0, 1.0]));
    }

    #[test]
    fn test_pie_errors() {
        let (_, builder) = builder_with("flights_today", flights_today());
        assert_eq!(
            builder
                .build("flights_today", "pie", &pie_mapping(), "status = Cancelled")
                .unwrap_err(),
            BuildError::EmptyDataset
        );
        let no_values = ColumnMapping {
            names: Some("airline".to_string()),
            ..Default::default()
        };
        assert_eq!(
            builder.build("flights_today", "pie", &no_values, "").unwrap_err(),
            BuildError::MissingField("values")
        );
        let text_values = ColumnMapping {
            names: Some("airline".to_string()),
            values: Some("status".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            builder.build("flights_today", "pie", &text_values, "").unwrap_err(),
            BuildError::NonNumericValue { .. }
        ));
    }

    #[test]
    fn test_table_projection_and_missing_columns() {
        let (_, builder) = builder_with("flights_today", flights_today());
        let mapping = ColumnMapping {
            table_columns: Some("status, airline".to_string()),
            ..Default::default()
        };
        match builder.build("flights_today", "table", &mapping, "").unwrap() {
            Rendered::Table { table_html, row_count } => {
                assert_eq!(row_count, 3);
                assert!(table_html.contains("<th>status</th><th>airline</th></tr>"));
                assert!(!table_html.contains("<th>flights</th>"));
            }
            other => panic!("expected table, got {:?}", other),
        }

        let mapping = ColumnMapping {
            table_columns: Some("airline, gate".to_string()),
            ..Default::default()
        };
        assert_eq!(
            builder.build("flights_today", "table", &mapping, "").unwrap_err(),
            BuildError::MissingColumns(vec!["gate".to_string()])
        );
    }

    #[test]
    fn test_table_truncates_to_limit() {
        let rows = (0..600).map(|i| vec![Value::Int(i)]).collect();
        let (_, builder) = builder_with("big", Dataset::from_rows(vec!["n"], rows).unwrap());
        match builder.build("big", "table", &ColumnMapping::default(), "").unwrap() {
            Rendered::Table { table_html, row_count } => {
                assert_eq!(row_count, MAX_TABLE_ROWS);
                assert_eq!(table_html.matches("<td>").count(), MAX_TABLE_ROWS);
            }
            other => panic!("expected table, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_table_is_not_an_error() {
        let (_, builder) = builder_with("flights_today", flights_today());
        let rendered = builder
            .build("flights_today", "table", &ColumnMapping::default(), "status = Cancelled")
            .unwrap();
        assert!(matches!(rendered, Rendered::Table { row_count: 0, .. }));
    }

    #[test]
    fn test_unknown_view_kind_and_filter_errors() {
        let (views, builder) = builder_with("flights_today", flights_today());
        assert_eq!(
            builder.build("ghost", "table", &ColumnMapping::default(), "").unwrap_err(),
            BuildError::ViewNotFound("ghost".to_string())
        );
        assert_eq!(
            builder.build("flights_today", "scatter", &ColumnMapping::default(), "").unwrap_err(),
            BuildError::UnknownVisualizationKind("scatter".to_string())
        );
        assert!(matches!(
            builder.build("flights_today", "table", &ColumnMapping::default(), "gate = 3"),
            Err(BuildError::Filter(_))
        ));
        // The stored view is never touched by a render
        assert_eq!(views.get("flights_today").unwrap().dataset, flights_today());
    }
}
