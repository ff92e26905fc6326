use std::collections::HashMap;

use serde_json::Value;
use steelscan_domain::repository::{KeyValueStore, StoreKey};
use steelscan_types::StoreError;

/// In-memory store for tests and throwaway sessions
#[derive(Debug, Default, Clone)]
pub struct MemoryKeyValueStore {
    values: HashMap<StoreKey, Value>,
    save_count: usize,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-seed a value, as if saved by an earlier session
    pub fn with_value(mut self, key: StoreKey, value: Value) -> Self {
        self.values.insert(key, value);
        self
    }

    /// Number of `save` calls so far
    pub fn save_count(&self) -> usize {
        self.save_count
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn load(&self, key: StoreKey) -> Result<Option<Value>, StoreError> {
        Ok(self.values.get(&key).cloned())
    }

    fn save(&mut self, key: StoreKey, value: &Value) -> Result<(), StoreError> {
        self.values.insert(key, value.clone());
        self.save_count += 1;
        Ok(())
    }
}
