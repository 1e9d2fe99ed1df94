// Dashboard domain model
use super::error::BuildError;
use serde::Serialize;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VizKind {
    Table,
    Pie,
}

impl VizKind {
    pub const ALL: [VizKind; 2] = [VizKind::Table, VizKind::Pie];

    pub fn as_str(&self) -> &'static str {
        match self {
            VizKind::Table => "table",
            VizKind::Pie => "pie",
        }
    }

    /// Display label, used as the default item name.
    pub fn title(&self) -> &'static str {
        match self {
            VizKind::Table => "Table",
            VizKind::Pie => "Pie",
        }
    }
}

impl FromStr for VizKind {
    type Err = BuildError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "table" => Ok(VizKind::Table),
            "pie" => Ok(VizKind::Pie),
            other => Err(BuildError::UnknownVisualizationKind(other.to_string())),
        }
    }
}

/// Column roles a visualization reads. Which roles matter depends on the
/// kind: `table_columns` for tables, `names`/`values` for pies.
/// `filter_columns` lists extra columns offered in the dashboard filter form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMapping {
    pub names: Option<String>,
    pub values: Option<String>,
    pub table_columns: Option<String>,
    pub filter_columns: Option<String>,
}

impl ColumnMapping {
    pub fn table_column_list(&self) -> Vec<&str> {
        split_column_list(self.table_columns.as_deref())
    }

    pub fn filter_column_list(&self) -> Vec<&str> {
        split_column_list(self.filter_columns.as_deref())
    }
}

/// Split a comma-joined column list, dropping blanks.
pub fn split_column_list(value: Option<&str>) -> Vec<&str> {
    value
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Output of a successful render, cached verbatim on dashboard items.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Rendered {
    Table { table_html: String, row_count: usize },
    Chart { chart_json: String },
}

/// Everything needed to (re)render a visualization.
#[derive(Debug, Clone, PartialEq)]
pub struct VisualizationDefinition {
    pub name: String,
    pub view_name: String,
    pub viz_kind: VizKind,
    pub columns: ColumnMapping,
    pub filters_text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardItem {
    pub id: String,
    pub name: String,
    /// Resolved against the view registry at render time; may dangle.
    pub view_name: String,
    pub viz_kind: VizKind,
    pub columns: ColumnMapping,
    pub filters_text: String,
    pub rendered: Rendered,
}

impl DashboardItem {
    pub fn new(id: String, definition: VisualizationDefinition, rendered: Rendered) -> Self {
        Self {
            id,
            name: definition.name,
            view_name: definition.view_name,
            viz_kind: definition.viz_kind,
            columns: definition.columns,
            filters_text: definition.filters_text,
            rendered,
        }
    }

    pub fn definition(&self) -> VisualizationDefinition {
        VisualizationDefinition {
            name: self.name.clone(),
            view_name: self.view_name.clone(),
            viz_kind: self.viz_kind,
            columns: self.columns.clone(),
            filters_text: self.filters_text.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_viz_kind() {
        assert_eq!("pie".parse::<VizKind>().unwrap(), VizKind::Pie);
        assert_eq!(" table ".parse::<VizKind>().unwrap(), VizKind::Table);
        assert_eq!(
            "bar".parse::<VizKind>().unwrap_err(),
            BuildError::UnknownVisualizationKind("bar".to_string())
        );
    }

    #[test]
    fn test_split_column_list() {
        let mapping = ColumnMapping {
            table_columns: Some(" airline, ,status ,".to_string()),
            ..Default::default()
        };
        assert_eq!(mapping.table_column_list(), vec!["airline", "status"]);
        assert!(mapping.filter_column_list().is_empty());
    }

    #[test]
    fn test_rendered_serializes_with_kind_tag() {
        let rendered = Rendered::Chart {
            chart_json: "{}".to_string(),
        };
        let json = serde_json::to_value(&rendered).unwrap();
        assert_eq!(json["kind"], "chart");
        assert_eq!(json["chart_json"], "{}");
    }
}
