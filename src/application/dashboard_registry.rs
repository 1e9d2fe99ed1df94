// In-memory registry of dashboard items
use crate::domain::dashboard::{DashboardItem, Rendered, VisualizationDefinition};
use crate::domain::error::RegistryError;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Dashboard items keyed by generated id, in insertion order.
#[derive(Debug, Default)]
pub struct DashboardRegistry {
    items: Mutex<Vec<DashboardItem>>,
}

/// 128 random bits, lowercase hex. URL safe.
fn generate_id() -> String {
    format!("{:032x}", rand::random::<u128>())
}

impl DashboardRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, Vec<DashboardItem>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn list(&self) -> Vec<DashboardItem> {
        self.entries().clone()
    }

    pub fn get(&self, id: &str) -> Option<DashboardItem> {
        self.entries().iter().find(|item| item.id == id).cloned()
    }

    pub fn add(&self, definition: VisualizationDefinition, rendered: Rendered) -> DashboardItem {
        let mut items = self.entries();
        let id = loop {
            let candidate = generate_id();
            if !items.iter().any(|item| item.id == candidate) {
                break candidate;
            }
        };
        let item = DashboardItem::new(id, definition, rendered);
        items.push(item.clone());
        item
    }

    /// Replace every field except the id.
    pub fn update(
        &self,
        id: &str,
        definition: VisualizationDefinition,
        rendered: Rendered,
    ) -> Result<DashboardItem, RegistryError> {
        let mut items = self.entries();
        let item = items
            .iter_mut()
            .find(|item| item.id == id)
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))?;
        *item = DashboardItem::new(id.to_string(), definition, rendered);
        Ok(item.clone())
    }

    /// Replace only the filter text and the cached render.
    pub fn apply_filters(
        &self,
        id: &str,
        filters_text: &str,
        rendered: Rendered,
    ) -> Result<DashboardItem, RegistryError> {
        let mut items = self.entries();
        let item = items
            .iter_mut()
            .find(|item| item.id == id)
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))?;
        item.filters_text = filters_text.to_string();
        item.rendered = rendered;
        Ok(item.clone())
    }

    pub fn delete(&self, id: &str) {
        self.entries().retain(|item| item.id != id);
    }

    #[cfg(test)]
    pub fn clear(&self) {
        self.entries().clear();
    }
}
