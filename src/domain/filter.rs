// Line-oriented filter expressions
//
// Each non-blank line is `<column> <operator> <value...>`. Lines narrow the
// rows left by the previous line, so the whole text is an AND chain.
use super::dataset::{Dataset, Value};
use super::error::FilterError;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Ne,
    Gt,
    Lt,
    Ge,
    Le,
    Contains,
}

impl Operator {
    pub const ALL: [Operator; 7] = [
        Operator::Eq,
        Operator::Ne,
        Operator::Gt,
        Operator::Lt,
        Operator::Ge,
        Operator::Le,
        Operator::Contains,
    ];

    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "=" => Some(Operator::Eq),
            "!=" => Some(Operator::Ne),
            ">" => Some(Operator::Gt),
            "<" => Some(Operator::Lt),
            ">=" => Some(Operator::Ge),
            "<=" => Some(Operator::Le),
            t if t.eq_ignore_ascii_case("contains") => Some(Operator::Contains),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Ne => "!=",
            Operator::Gt => ">",
            Operator::Lt => "<",
            Operator::Ge => ">=",
            Operator::Le => "<=",
            Operator::Contains => "contains",
        }
    }
}

/// One parsed filter line.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterClause {
    pub column: String,
    pub operator: Operator,
    pub value: Value,
    needle: String,
}

impl FilterClause {
    /// Null cells never match, whatever the operator.
    pub fn matches(&self, cell: &Value) -> bool {
        if cell.is_null() {
            return false;
        }
        let ordering = cell.compare(&self.value);
        match self.operator {
            Operator::Eq => ordering == Some(Ordering::Equal),
            Operator::Ne => ordering != Some(Ordering::Equal),
            Operator::Gt => ordering == Some(Ordering::Greater),
            Operator::Lt => ordering == Some(Ordering::Less),
            Operator::Ge => matches!(ordering, Some(Ordering::Greater | Ordering::Equal)),
            Operator::Le => matches!(ordering, Some(Ordering::Less | Ordering::Equal)),
            Operator::Contains => cell.to_string().to_lowercase().contains(&self.needle),
        }
    }
}

/// Parse a filter value with a restricted literal grammar: quoted string,
/// boolean, integer, float, else the bare trimmed text.
pub fn parse_literal(raw: &str) -> Value {
    let text = raw.trim();
    if let Some(inner) = strip_quotes(text) {
        return Value::Text(inner.to_string());
    }
    if text.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if text.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }
    if let Ok(i) = text.parse::<i64>() {
        return Value::Int(i);
    }
    if looks_numeric(text) {
        if let Ok(f) = text.parse::<f64>() {
            return Value::Float(f);
        }
    }
    Value::Text(text.trim_matches('"').to_string())
}

fn strip_quotes(text: &str) -> Option<&str> {
    if text.len() < 2 {
        return None;
    }
    ['"', '\'']
        .into_iter()
        .find_map(|q| text.strip_prefix(q)?.strip_suffix(q))
}

// Keeps `inf`, `nan` and friends out of the float grammar
fn looks_numeric(text: &str) -> bool {
    text.chars().any(|c| c.is_ascii_digit())
        && text
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E'))
}

/// Parse one non-blank line against the columns of `dataset`.
fn parse_line(line: &str, dataset: &Dataset) -> Result<FilterClause, FilterError> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() < 3 {
        return Err(FilterError::InvalidFilter {
            line: line.to_string(),
            reason: "expected 'column operator value'".to_string(),
        });
    }
    let column = parts[0];
    if !dataset.has_column(column) {
        return Err(FilterError::ColumnNotFound(column.to_string()));
    }
    let operator = Operator::parse(parts[1]).ok_or_else(|| FilterError::InvalidFilter {
        line: line.to_string(),
        reason: format!(
            "unknown operator '{}', use one of {}",
            parts[1],
            Operator::ALL.map(|op| op.as_str()).join(", ")
        ),
    })?;
    let raw_value = parts[2..].join(" ");
    let value = parse_literal(&raw_value);
    let needle = strip_quotes(&raw_value)
        .unwrap_or(&raw_value)
        .trim_matches('"')
        .to_lowercase();

    Ok(FilterClause {
        column: column.to_string(),
        operator,
        value,
        needle,
    })
}

/// Apply every line of `filters_text` to `dataset` in order.
pub fn apply_filters(dataset: &Dataset, filters_text: &str) -> Result<Dataset, FilterError> {
    let mut filtered = dataset.clone();
    for line in filters_text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let clause = parse_line(line, &filtered)?;
        let mask: Vec<bool> = match filtered.column(&clause.column) {
            Some(column) => column.values.iter().map(|cell| clause.matches(cell)).collect(),
            None => return Err(FilterError::ColumnNotFound(clause.column)),
        };
        filtered = filtered.retain_rows(&mask);
    }
    Ok(filtered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn flights() -> Dataset {
        Dataset::from_rows(
            vec!["airline", "status", "passengers", "distance_km"],
            vec![
                vec!["Azul".into(), "Scheduled".into(), Value::Int(120), Value::Float(800.5)],
                vec!["Gol".into(), "Arrived".into(), Value::Int(90), Value::Float(1200.0)],
                vec!["LATAM".into(), Value::Null, Value::Null, Value::Float(300.0)],
                vec!["Voepass".into(), "Delayed".into(), Value::Int(60), Value::Float(2500.0)],
            ],
        )
        .unwrap()
    }

    fn airlines(dataset: &Dataset) -> Vec<String> {
        dataset
            .column("airline")
            .unwrap()
            .values
            .iter()
            .map(|v| v.to_string())
            .collect()
    }

    #[test]
    fn test_parse_literal() {
        assert_eq!(parse_literal("42"), Value::Int(42));
        assert_eq!(parse_literal("-3.5"), Value::Float(-3.5));
        assert_eq!(parse_literal("True"), Value::Bool(true));
        assert_eq!(parse_literal("FALSE"), Value::Bool(false));
        assert_eq!(parse_literal("'Gol'"), Value::Text("Gol".to_string()));
        assert_eq!(parse_literal("\"New York\""), Value::Text("New York".to_string()));
        assert_eq!(parse_literal(" Arrived "), Value::Text("Arrived".to_string()));
        assert_eq!(parse_literal("nan"), Value::Text("nan".to_string()));
        assert_eq!(parse_literal("__import__('os')"), Value::Text("__import__('os')".to_string()));
    }

    #[test]
    fn test_empty_text_keeps_everything() {
        assert_eq!(apply_filters(&flights(), "").unwrap(), flights());
        assert_eq!(apply_filters(&flights(), "\n  \n").unwrap(), flights());
    }

    #[test]
    fn test_comparison_operators() {
        let data = flights();
        assert_eq!(airlines(&apply_filters(&data, "passengers > 60").unwrap()), vec!["Azul", "Gol"]);
        assert_eq!(airlines(&apply_filters(&data, "passengers >= 90").unwrap()), vec!["Azul", "Gol"]);
        assert_eq!(airlines(&apply_filters(&data, "passengers <= 90").unwrap()), vec!["Gol", "Voepass"]);
        assert_eq!(airlines(&apply_filters(&data, "distance_km < 1000").unwrap()), vec!["Azul", "LATAM"]);
        assert_eq!(airlines(&apply_filters(&data, "distance_km = 1200").unwrap()), vec!["Gol"]);
        assert_eq!(airlines(&apply_filters(&data, "airline = 'Gol'").unwrap()), vec!["Gol"]);
    }

    #[test]
    fn test_value_may_contain_spaces() {
        let data = Dataset::from_rows(
            vec!["city"],
            vec![vec!["Sao Paulo".into()], vec!["Rio".into()]],
        )
        .unwrap();
        let filtered = apply_filters(&data, "city = Sao   Paulo").unwrap();
        assert_eq!(filtered.row_count(), 1);
    }

    #[test]
    fn test_contains_matches_float_text_form() {
        let data = Dataset::from_rows(vec!["avg"], vec![vec![Value::Float(150.0)], vec![Value::Float(15.5)]]).unwrap();
        let filtered = apply_filters(&data, "avg contains 150.0").unwrap();
        assert_eq!(filtered.column("avg").unwrap().values, vec![Value::Float(150.0)]);
    }

    #[test]
    fn test_boolean_literal_matches_integer_flags() {
        let data = Dataset::from_rows(
            vec!["airline", "on_time"],
            vec![vec!["Azul".into(), Value::Int(1)], vec!["Gol".into(), Value::Int(0)]],
        )
        .unwrap();
        assert_eq!(airlines(&apply_filters(&data, "on_time = true").unwrap()), vec!["Azul"]);
        assert_eq!(airlines(&apply_filters(&data, "on_time != true").unwrap()), vec!["Gol"]);
    }

    #[test]
    fn test_contains_is_case_insensitive() {
        let filtered = apply_filters(&flights(), "status contains sched").unwrap();
        assert_eq!(airlines(&filtered), vec!["Azul"]);
        let filtered = apply_filters(&flights(), "status CONTAINS ARR").unwrap();
        assert_eq!(airlines(&filtered), vec!["Gol"]);
    }

    #[test]
    fn test_nulls_never_match() {
        let data = flights();
        // LATAM has null status and passengers
        assert_eq!(airlines(&apply_filters(&data, "status != Arrived").unwrap()), vec!["Azul", "Voepass"]);
        assert_eq!(airlines(&apply_filters(&data, "passengers != 5").unwrap()), vec!["Azul", "Gol", "Voepass"]);
        assert!(!airlines(&apply_filters(&data, "status contains e").unwrap()).contains(&"LATAM".to_string()));
    }

    #[test]
    fn test_incomparable_kinds() {
        let data = flights();
        assert!(apply_filters(&data, "airline > 5").unwrap().is_empty());
        assert_eq!(apply_filters(&data, "airline != 5").unwrap().row_count(), 4);
    }

    #[test]
    fn test_invalid_lines() {
        let data = flights();
        assert!(matches!(
            apply_filters(&data, "status Arrived"),
            Err(FilterError::InvalidFilter { .. })
        ));
        assert!(matches!(
            apply_filters(&data, "status ~ Arrived"),
            Err(FilterError::InvalidFilter { .. })
        ));
        assert_eq!(
            apply_filters(&data, "passengers > 1\ngate = 4").unwrap_err(),
            FilterError::ColumnNotFound("gate".to_string())
        );
    }

    #[test]
    fn test_lines_narrow_sequentially() {
        let filtered = apply_filters(&flights(), "passengers > 60\nstatus contains arr").unwrap();
        assert_eq!(airlines(&filtered), vec!["Gol"]);
    }

    proptest! {
        #[test]
        fn prop_filter_lines_compose(
            rows in proptest::collection::vec((0i64..6, 0i64..6), 0..30),
            a in 0i64..6,
            b in 0i64..6,
        ) {
            let data = Dataset::from_rows(
                vec!["x", "y"],
                rows.into_iter().map(|(x, y)| vec![Value::Int(x), Value::Int(y)]).collect(),
            ).unwrap();
            let combined = apply_filters(&data, &format!("x > {a}\ny = {b}")).unwrap();
            let first = apply_filters(&data, &format!("x > {a}")).unwrap();
            let stepwise = apply_filters(&first, &format!("y = {b}")).unwrap();
            prop_assert_eq!(combined, stepwise);
        }
    }
}
