//! Store settings management

use crate::PathManager;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Which durable store backs the mirrored slots
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Process-local, lost on exit
    Memory,
    /// One file per slot
    #[default]
    Fs,
    /// Single SQLite database
    Sqlite,
}

/// The `[store]` section of settings.toml
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSettings {
    #[serde(default)]
    pub backend: Backend,
    /// Directory (fs) or database file (sqlite); platform default when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl StoreSettings {
    /// Explicit path, else the platform default for the backend.
    /// The memory backend has no path.
    pub fn resolved_path(&self) -> Option<PathBuf> {
        match self.backend {
            Backend::Memory => None,
            Backend::Fs => self.path.clone().or_else(PathManager::slots_dir),
            Backend::Sqlite => self.path.clone().or_else(PathManager::db_path),
        }
    }
}

/// Application settings stored in settings.toml
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub store: StoreSettings,
}

impl Settings {
    /// Load settings from the settings file, or return defaults if not found
    pub fn load() -> Self {
        let Some(path) = PathManager::settings_path() else {
            return Self::default();
        };

        Self::load_from(&path).unwrap_or_default()
    }

    /// Load settings from an explicit file
    pub fn load_from(path: &Path) -> Result<Self, String> {
        let content = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read settings {:?}: {}", path, e))?;
        toml::from_str(&content).map_err(|e| format!("Failed to parse settings: {}", e))
    }

    /// Save settings to the settings file
    pub fn save(&self) -> Result<(), String> {
        let path = PathManager::settings_path().ok_or("Could not determine settings path")?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create config dir: {}", e))?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize settings: {}", e))?;
        fs::write(path, content).map_err(|e| format!("Failed to write settings: {}", e))?;
        Ok(())
    }
}
