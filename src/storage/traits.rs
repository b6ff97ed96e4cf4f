//! KeyValueStore trait for flat string-keyed slot storage

use anyhow::Result;
use std::sync::Arc;

/// Synchronous string key / string value store.
///
/// Shaped after the browser `localStorage` API: a missing key reads as `None`
/// and removing a missing key is not an error.
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`
    fn get_item(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value
    fn set_item(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key` if present
    fn remove_item(&self, key: &str) -> Result<()>;
}

/// Store handle shared between every controller bound to it.
pub type SharedStore = Arc<dyn KeyValueStore>;
