//! Key-value storage for mirrored slots
//!
//! The mirror engine only ever talks to a `KeyValueStore`. Three backends are
//! available:
//!
//! - `MemoryStore` - In-memory storage (tests, no persistence)
//! - `FsStore` - One file per slot under a root directory
//! - `SqliteStore` - SQLite-backed storage (requires `sqlite` feature)
//!
//! `open_store` picks one from the `[store]` section of the settings file;
//! `open_default_store` does the same for the settings found on this machine.

mod helper;
pub mod implementations;
mod traits;

use std::sync::Arc;

use anyhow::{Context, Result};
use config::{Backend, PathManager, Settings, StoreSettings};
use tracing::info;

pub use implementations::fs::FsStore;
pub use implementations::memory::MemoryStore;
#[cfg(feature = "sqlite")]
pub use implementations::sqlite::SqliteStore;
pub use traits::{KeyValueStore, SharedStore};

/// Open the backend described by `settings`.
pub fn open_store(settings: &StoreSettings) -> Result<SharedStore> {
    match settings.backend {
        Backend::Memory => {
            info!("Opening in-memory slot store");
            Ok(Arc::new(MemoryStore::new()))
        }
        Backend::Fs => {
            let root = settings
                .resolved_path()
                .ok_or_else(|| anyhow::anyhow!("Could not determine slot directory"))?;
            info!("Opening filesystem slot store at {:?}", root);
            Ok(Arc::new(FsStore::new(root)))
        }
        Backend::Sqlite => open_sqlite(settings),
    }
}

/// Open the store configured on this machine.
///
/// Honours `.env` files (so `SAFE_MIRROR_DATA_DIR` can live there), creates
/// the data and config directories, then reads `settings.toml`.
pub fn open_default_store() -> Result<SharedStore> {
    config::load_env_file();
    PathManager::ensure_dirs_exist().context("Failed to create safe-mirror directories")?;
    let settings = Settings::load();
    open_store(&settings.store)
}

#[cfg(feature = "sqlite")]
fn open_sqlite(settings: &StoreSettings) -> Result<SharedStore> {
    let path = settings
        .resolved_path()
        .ok_or_else(|| anyhow::anyhow!("Could not determine database path"))?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    info!("Opening sqlite slot store at {:?}", path);
    Ok(Arc::new(SqliteStore::open(path)?))
}

#[cfg(not(feature = "sqlite"))]
fn open_sqlite(_settings: &StoreSettings) -> Result<SharedStore> {
    anyhow::bail!(
        "sqlite backend requested but safe-mirror was built without the `sqlite` feature"
    )
}
