//! Repository adapters for persistence layer

use serde::de::DeserializeOwned;
use serde_json::Value;
use steelscan_domain::repository::{KeyValueStore, StoreKey};
use steelscan_infra::persistence::{FileKeyValueStore, MemoryKeyValueStore};
use steelscan_types::{default_palette, ColorPaletteEntry, DestinationProfile, InventoryRecord, Result};
use tracing::{debug, warn};

use crate::app::AppState;
use crate::config::Config;

/// The three persisted collections
#[derive(Debug, Clone, PartialEq)]
pub struct Collections {
    pub profiles: Vec<DestinationProfile>,
    pub inventory: Vec<InventoryRecord>,
    pub palette: Vec<ColorPaletteEntry>,
}

impl Default for Collections {
    fn default() -> Self {
        Self {
            profiles: vec![DestinationProfile::builtin()],
            inventory: Vec::new(),
            palette: default_palette(),
        }
    }
}

/// Open file-based store
pub fn open_store(config: &Config) -> Result<FileKeyValueStore> {
    let store_dir = config.store_dir()?;
    FileKeyValueStore::open(store_dir)
}

/// Open the store selected on the command line
pub fn open_session_store(config: &Config, ephemeral: bool) -> Result<Box<dyn KeyValueStore>> {
    if ephemeral {
        Ok(Box::new(MemoryKeyValueStore::new()))
    } else {
        Ok(Box::new(open_store(config)?))
    }
}

fn load_or<T, S, F>(store: &S, key: StoreKey, fallback: F) -> T
where
    T: DeserializeOwned,
    S: KeyValueStore + ?Sized,
    F: FnOnce() -> T,
{
    let value = match store.load(key) {
        Ok(Some(value)) => value,
        Ok(None) => {
            debug!(key = %key, "nothing stored, using defaults");
            return fallback();
        }
        Err(e) => {
            warn!(key = %key, error = %e, "stored collection unreadable, using defaults");
            return fallback();
        }
    };

    match serde_json::from_value(value) {
        Ok(collection) => collection,
        Err(e) => {
            warn!(key = %key, error = %e, "stored collection malformed, using defaults");
            fallback()
        }
    }
}

/// Load every collection, falling back to defaults per key
pub fn load_collections<S: KeyValueStore + ?Sized>(store: &S) -> Collections {
    let defaults = Collections::default();

    let mut profiles: Vec<DestinationProfile> =
        load_or(store, StoreKey::Profiles, || defaults.profiles.clone());
    if profiles.is_empty() {
        warn!("stored profile list is empty, using the built-in profile");
        profiles = defaults.profiles.clone();
    }

    Collections {
        profiles,
        inventory: load_or(store, StoreKey::Inventory, Vec::new),
        palette: load_or(store, StoreKey::Palette, || defaults.palette.clone()),
    }
}

/// JSON form of one collection of `state`
pub fn collection_value(state: &AppState, key: StoreKey) -> serde_json::Result<Value> {
    match key {
        StoreKey::Profiles => serde_json::to_value(&state.profiles),
        StoreKey::Inventory => serde_json::to_value(&state.inventory),
        StoreKey::Palette => serde_json::to_value(&state.palette),
    }
}

/// Write one collection through to the store. Failures are logged.
pub fn persist<S: KeyValueStore + ?Sized>(store: &mut S, state: &AppState, key: StoreKey) {
    let value = match collection_value(state, key) {
        Ok(value) => value,
        Err(e) => {
            warn!(key = %key, error = %e, "collection could not be serialized");
            return;
        }
    };

    if let Err(e) = store.save(key, &value) {
        warn!(key = %key, error = %e, "collection not saved");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_first_run_defaults() {
        let store = MemoryKeyValueStore::new();
        let collections = load_collections(&store);

        assert_eq!(collections, Collections::default());
        assert_eq!(collections.profiles[0].rules.states.len(), 50);
        assert_eq!(collections.palette.len(), 20);
    }

    #[test]
    fn test_malformed_and_empty_fall_back() {
        let store = MemoryKeyValueStore::new()
            .with_value(StoreKey::Profiles, json!([]))
            .with_value(StoreKey::Inventory, json!({ "not": "a list" }))
            .with_value(StoreKey::Palette, json!([{ "name": "Only", "hex": "#000000" }]));
        let collections = load_collections(&store);

        assert_eq!(collections.profiles, vec![DestinationProfile::builtin()]);
        assert!(collections.inventory.is_empty());
        assert_eq!(collections.palette, vec![ColorPaletteEntry::new("Only", "#000000")]);
    }

    #[test]
    fn test_persist_writes_collection() {
        let mut store = MemoryKeyValueStore::new();
        let mut state = AppState::default();
        state.palette.truncate(2);

        persist(&mut store, &state, StoreKey::Palette);

        assert_eq!(store.save_count(), 1);
        assert_eq!(load_collections(&store).palette, state.palette);
    }
}
