//! Persisted store contract
//!
//! Three independent collections live under three keys. Implementations
//! are synchronous; every mutation of a collection is written through.

use serde_json::Value;
use std::fmt;
use steelscan_types::StoreError;

/// Keys of the persisted collections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreKey {
    Profiles,
    Inventory,
    Palette,
}

impl StoreKey {
    pub const ALL: [StoreKey; 3] = [StoreKey::Profiles, StoreKey::Inventory, StoreKey::Palette];

    pub fn as_str(&self) -> &'static str {
        match self {
            StoreKey::Profiles => "profiles",
            StoreKey::Inventory => "inventory",
            StoreKey::Palette => "palette",
        }
    }
}

impl fmt::Display for StoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Key-value store holding one JSON document per key
pub trait KeyValueStore: Send {
    /// Load the value under `key`; `None` on first run
    fn load(&self, key: StoreKey) -> Result<Option<Value>, StoreError>;

    /// Replace the value under `key`
    fn save(&mut self, key: StoreKey, value: &Value) -> Result<(), StoreError>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Box<S> {
    fn load(&self, key: StoreKey) -> Result<Option<Value>, StoreError> {
        (**self).load(key)
    }

    fn save(&mut self, key: StoreKey, value: &Value) -> Result<(), StoreError> {
        (**self).save(key, value)
    }
}
