// Chart specification domain model
//
// Serializes to a Plotly figure: `{"data": [...], "layout": {...}}`.
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub data: Vec<PieTrace>,
    pub layout: ChartLayout,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PieTrace {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub labels: Vec<String>,
    pub values: Vec<f64>,
    pub textinfo: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartLayout {
    pub legend: Legend,
    pub margin: Margin,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Legend {
    pub title: LegendTitle,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendTitle {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Margin {
    pub t: u32,
    pub b: u32,
    pub l: u32,
    pub r: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PieSlice {
    pub label: String,
    pub value: f64,
}

impl ChartSpec {
    pub fn pie(names_column: &str, slices: Vec<PieSlice>) -> Self {
        let (labels, values) = slices.into_iter().map(|s| (s.label, s.value)).unzip();
        Self {
            data: vec![PieTrace {
                kind: "pie",
                labels,
                values,
                textinfo: "percent+label",
            }],
            layout: ChartLayout {
                legend: Legend {
                    title: LegendTitle {
                        text: names_column.to_string(),
                    },
                },
                margin: Margin {
                    t: 40,
                    b: 20,
                    l: 20,
                    r: 20,
                },
            },
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pie_spec_shape() {
        let spec = ChartSpec::pie(
            "airline",
            vec![
                PieSlice {
                    label: "Azul".to_string(),
                    value: 2.0,
                },
                PieSlice {
                    label: "Gol".to_string(),
                    value: 1.0,
                },
            ],
        );
        let json: serde_json::Value = serde_json::from_str(&spec.to_json().unwrap()).unwrap();
        assert_eq!(json["data"][0]["type"], "pie");
        assert_eq!(json["data"][0]["labels"], serde_json::json!(["Azul", "Gol"]));
        assert_eq!(json["data"][0]["values"], serde_json::json!([2.0, 1.0]));
        assert_eq!(json["layout"]["legend"]["title"]["text"], "airline");
    }
}
