pub mod paths;
pub mod settings;

use std::path::Path;

pub use paths::PathManager;
pub use settings::{Backend, Settings, StoreSettings};

/// Load environment variables from .env files.
/// First loads from ~/.env (home directory), then from ./.env (project directory).
/// Project directory values take precedence over home directory values.
pub fn load_env_file() {
    if let Some(dirs) = directories::BaseDirs::new() {
        load_env_from(&dirs.home_dir().join(".env"));
    }

    dotenv::dotenv().ok();
}

/// Load one .env file. Missing files are ignored and variables already set
/// in the environment are left alone.
pub fn load_env_from(path: &Path) -> bool {
    dotenv::from_path(path).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_env_from_sets_variables() {
        let dir = std::env::temp_dir().join(format!("env_test_{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(".env");
        std::fs::write(&path, "SAFE_MIRROR_ENV_TEST_VALUE=from-dotenv\n").unwrap();

        assert!(load_env_from(&path));
        assert_eq!(
            std::env::var("SAFE_MIRROR_ENV_TEST_VALUE").unwrap(),
            "from-dotenv"
        );

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_load_env_from_missing_file() {
        let path = std::env::temp_dir().join(format!("missing_{}.env", uuid::Uuid::new_v4()));
        assert!(!load_env_from(&path));
    }
}
