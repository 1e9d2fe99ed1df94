// In-memory registry of named views
use crate::domain::dataset::Dataset;
use crate::domain::error::RegistryError;
use crate::domain::view::StoredView;
use chrono::Utc;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Views keyed by name, kept in registration order.
///
/// Every accessor hands out clones; the registry is the only owner of its
/// entries. A single mutex serializes mutations, so concurrent writers to the
/// same name resolve as last-write-wins.
#[derive(Debug, Default)]
pub struct ViewRegistry {
    views: Mutex<Vec<StoredView>>,
}

impl ViewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, Vec<StoredView>> {
        // Entries are replaced whole, so a poisoned lock still guards valid data
        self.views.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn list(&self) -> Vec<StoredView> {
        self.entries().clone()
    }

    pub fn get(&self, name: &str) -> Option<StoredView> {
        self.entries().iter().find(|v| v.name == name).cloned()
    }

    /// Register a new view. Existing names are rejected, never overwritten.
    pub fn save(&self, name: &str, query: &str, dataset: Dataset) -> Result<StoredView, RegistryError> {
        let mut views = self.entries();
        if views.iter().any(|v| v.name == name) {
            return Err(RegistryError::AlreadyExists(name.to_string()));
        }
        let stored = StoredView::new(name.to_string(), query.to_string(), dataset);
        views.push(stored.clone());
        Ok(stored)
    }

    pub fn update(&self, name: &str, query: &str, dataset: Dataset) -> Result<StoredView, RegistryError> {
        let mut views = self.entries();
        let stored = views
            .iter_mut()
            .find(|v| v.name == name)
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))?;
        stored.query = query.to_string();
        stored.dataset = dataset;
        stored.updated_at = Utc::now();
        Ok(stored.clone())
    }

    /// Move a view to a new key. The entry goes to the end of the listing;
    /// renaming to the same name leaves it in place.
    #[cfg(test)]
    pub fn rename(&self, old_name: &str, new_name: &str) -> Result<StoredView, RegistryError> {
        let mut views = self.entries();
        let index = relocate(&mut views, old_name, new_name)?;
        Ok(views[index].clone())
    }

    /// Rename and replace query and data under one lock, so no other writer
    /// sees the view renamed but not yet updated.
    pub fn rename_and_update(
        &self,
        old_name: &str,
        new_name: &str,
        query: &str,
        dataset: Dataset,
    ) -> Result<StoredView, RegistryError> {
        let mut views = self.entries();
        let index = relocate(&mut views, old_name, new_name)?;
        let stored = &mut views[index];
        stored.query = query.to_string();
        stored.dataset = dataset;
        stored.updated_at = Utc::now();
        Ok(stored.clone())
    }

    pub fn delete(&self, name: &str) {
        self.entries().retain(|v| v.name != name);
    }

    #[cfg(test)]
    pub fn clear(&self) {
        self.entries().clear();
    }
}

/// Index of the entry now keyed by `new_name`.
fn relocate(views: &mut Vec<StoredView>, old_name: &str, new_name: &str) -> Result<usize, RegistryError> {
    if old_name != new_name && views.iter().any(|v| v.name == new_name) {
        return Err(RegistryError::AlreadyExists(new_name.to_string()));
    }
    let index = views
        .iter()
        .position(|v| v.name == old_name)
        .ok_or_else(|| RegistryError::NotFound(old_name.to_string()))?;
    if old_name == new_name {
        return Ok(index);
    }
    let mut stored = views.remove(index);
    stored.name = new_name.to_string();
    views.push(stored);
    Ok(views.len() - 1)
}
