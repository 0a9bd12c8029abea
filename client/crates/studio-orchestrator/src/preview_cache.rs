use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

/// Last known preview address per project, shared by every session of one
/// workspace so that reopening a paused project can show its last frame.
#[derive(Debug, Clone, Default)]
pub struct PreviewCache {
    inner: Arc<Mutex<HashMap<String, String>>>,
}

impl PreviewCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, project_id: &str) -> Option<String> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(project_id)
            .cloned()
    }

    /// Blank addresses are ignored.
    pub fn insert(&self, project_id: &str, address: &str) {
        if address.trim().is_empty() {
            return;
        }

        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(project_id.to_string(), address.to_string());
    }

    pub fn remove(&self, project_id: &str) -> Option<String> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(project_id)
    }

    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
