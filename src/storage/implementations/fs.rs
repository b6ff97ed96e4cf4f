//! Filesystem slot storage
//!
//! Each slot lives in its own file named by the SHA-256 of its key, which keeps
//! arbitrary key strings (slashes, spaces, unicode) out of file names.

use anyhow::{Context, Result};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::PathBuf;

use crate::storage::helper::key_hash;
use crate::storage::traits::KeyValueStore;

/// Slot storage on the filesystem
///
/// Files are stored in a sharded directory structure based on the first 2 characters
/// of the key hash: `root/{hash[0:2]}/{hash}`
#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    /// Create a new FsStore with the given root directory
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Root directory of this store
    pub fn root(&self) -> &PathBuf {
        &self.root
    }

    /// Get the filesystem path for a slot key
    pub fn path_for(&self, key: &str) -> PathBuf {
        let hash = key_hash(key);
        let shard = &hash[0..2];
        self.root.join(shard).join(hash)
    }

    /// Clean up temp files left behind by interrupted writes
    pub fn cleanup_temp_files(&self) -> Result<usize> {
        let mut cleaned = 0;

        if !self.root.exists() {
            return Ok(0);
        }

        for shard_entry in fs::read_dir(&self.root)? {
            let shard_path = shard_entry?.path();

            if !shard_path.is_dir() {
                continue;
            }

            for slot_entry in fs::read_dir(&shard_path)? {
                let slot_path = slot_entry?.path();

                if slot_path.extension().is_some_and(|ext| ext == "tmp") {
                    fs::remove_file(&slot_path)?;
                    cleaned += 1;
                }
            }
        }

        Ok(cleaned)
    }
}

impl KeyValueStore for FsStore {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to read slot {:?}", key)),
        }
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create shard directory {:?}", parent))?;
        }

        // Write atomically using a temp file
        let temp_path = path.with_extension("tmp");
        let mut file = fs::File::create(&temp_path)?;
        file.write_all(value.as_bytes())?;
        file.sync_all()?;
        fs::rename(&temp_path, &path)
            .with_context(|| format!("Failed to write slot {:?}", key))?;

        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("Failed to remove slot {:?}", key)),
        }
    }
}
