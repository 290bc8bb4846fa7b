//! In-memory session storage (default, thread-safe).

use super::SessionStorage;
use crate::error::Result;
use dashmap::DashMap;
use std::sync::Arc;

/// Process-local storage; clones share the same map.
#[derive(Clone, Default)]
pub struct InMemoryStorage {
    slots: Arc<DashMap<String, String>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl SessionStorage for InMemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let value = self.slots.get(key).map(|v| v.value().clone());
        debug!(
            "✓ InMemory storage GET {} -> {}",
            key,
            if value.is_some() { "HIT" } else { "MISS" }
        );
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.slots.insert(key.to_string(), value.to_string());
        debug!("✓ InMemory storage SET {}", key);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.slots.remove(key);
        debug!("✓ InMemory storage REMOVE {}", key);
        Ok(())
    }
}
