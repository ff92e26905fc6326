//! Persistence implementations
//!
//! This module provides implementations of the domain key-value store.

mod file_store;
mod memory_store;

pub use file_store::FileKeyValueStore;
pub use memory_store::MemoryKeyValueStore;
