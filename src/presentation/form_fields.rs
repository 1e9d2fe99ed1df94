// Ordered access to urlencoded fields, including repeated keys
//
// Handlers extract `Form<Vec<(String, String)>>` / `Query<Vec<(String, String)>>`
// so multi-select inputs keep every value in submission order.

#[derive(Debug, Clone, Default)]
pub struct FormFields(Vec<(String, String)>);

impl FormFields {
    pub fn new(pairs: Vec<(String, String)>) -> Self {
        Self(pairs)
    }

    /// First value for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    pub fn get_all(&self, key: &str) -> Vec<&str> {
        self.0
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// Trimmed first value, `None` when missing or blank.
    pub fn cleaned(&self, key: &str) -> Option<String> {
        self.get(key)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(String::from)
    }

    /// Non-blank values joined with `", "`, `None` when nothing is left.
    pub fn joined_list(&self, key: &str) -> Option<String> {
        let values: Vec<&str> = self
            .get_all(key)
            .into_iter()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .collect();
        (!values.is_empty()).then(|| values.join(", "))
    }
}
