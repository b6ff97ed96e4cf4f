use directories::BaseDirs;
use std::path::PathBuf;
use std::sync::OnceLock;

/// Environment variable that relocates every data path
pub const DATA_DIR_ENV: &str = "SAFE_MIRROR_DATA_DIR";

static DATA_DIR_OVERRIDE: OnceLock<PathBuf> = OnceLock::new();

pub struct PathManager;

impl PathManager {
    /// Set a custom data directory (embedders, tests)
    pub fn set_data_dir(path: PathBuf) {
        let _ = DATA_DIR_OVERRIDE.set(path);
    }

    fn base_data_dir() -> Option<PathBuf> {
        if let Some(d) = DATA_DIR_OVERRIDE.get() {
            return Some(d.clone());
        }
        if let Some(d) = std::env::var_os(DATA_DIR_ENV) {
            return Some(PathBuf::from(d));
        }
        BaseDirs::new().map(|d| d.data_dir().join("safe-mirror"))
    }

    pub fn data_dir() -> Option<PathBuf> {
        Self::base_data_dir()
    }

    pub fn config_dir() -> Option<PathBuf> {
        if DATA_DIR_OVERRIDE.get().is_some() || std::env::var_os(DATA_DIR_ENV).is_some() {
            return Self::data_dir();
        }
        BaseDirs::new().map(|d| d.config_dir().join("safe-mirror"))
    }

    pub fn settings_path() -> Option<PathBuf> {
        Self::config_dir().map(|d| d.join("settings.toml"))
    }

    /// Default root for the filesystem backend
    pub fn slots_dir() -> Option<PathBuf> {
        Self::data_dir().map(|d| d.join("slots"))
    }

    /// Default database for the sqlite backend
    pub fn db_path() -> Option<PathBuf> {
        Self::data_dir().map(|d| d.join("safe.db"))
    }

    pub fn ensure_dirs_exist() -> std::io::Result<()> {
        if let Some(d) = Self::data_dir() {
            std::fs::create_dir_all(d)?;
        }
        if let Some(d) = Self::config_dir() {
            std::fs::create_dir_all(d)?;
        }
        Ok(())
    }
}
