//! Key-value persistence.
//!
//! Each record key maps to one JSON document. `DirStore` keeps them as
//! `<dir>/<key>.json` files and `MemoryStore` keeps them in a map for tests.

#[cfg(test)]
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::Result;

pub const TODOS_KEY: &str = "todos";
pub const CATEGORIES_KEY: &str = "categories";
pub const THEME_KEY: &str = "theme";

/// Opaque get/set store. Last write wins.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

/// Directory-backed store with one file per key.
#[derive(Debug, Clone)]
pub struct DirStore {
    dir: PathBuf,
}

impl DirStore {
    pub fn new(dir: &Path) -> Self {
        DirStore { dir: dir.to_path_buf() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KeyValueStore for DirStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(path)?))
    }

    /// Atomic-ish write via temp + rename.
    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        let mut f = File::create(&tmp)?;
        f.write_all(value.as_bytes())?;
        f.flush()?;
        fs::rename(tmp, &path)?;
        tracing::debug!(key, path = %path.display(), bytes = value.len(), "record written");
        Ok(())
    }
}

/// In-memory store.
#[cfg(test)]
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    records: HashMap<String, String>,
}

#[cfg(test)]
impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(mut self, key: &str, value: &str) -> Self {
        self.records.insert(key.to_string(), value.to_string());
        self
    }
}

#[cfg(test)]
impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.records.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.records.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dir_store_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut store = DirStore::new(&dir.path().join("nested"));
        assert_eq!(store.get(TODOS_KEY).unwrap(), None);

        store.set(TODOS_KEY, "{\"todos\":[]}").unwrap();
        assert_eq!(store.get(TODOS_KEY).unwrap().as_deref(), Some("{\"todos\":[]}"));
        assert!(dir.path().join("nested").join("todos.json").exists());
        assert!(!dir.path().join("nested").join("todos.json.tmp").exists());

        store.set(TODOS_KEY, "[]").unwrap();
        assert_eq!(store.get(TODOS_KEY).unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn test_memory_store_last_write_wins() {
        let mut store = MemoryStore::new().with_record(THEME_KEY, "\"dark\"");
        assert_eq!(store.get(THEME_KEY).unwrap().as_deref(), Some("\"dark\""));
        store.set(THEME_KEY, "\"light\"").unwrap();
        assert_eq!(store.get(THEME_KEY).unwrap().as_deref(), Some("\"light\""));
        assert_eq!(store.get(CATEGORIES_KEY).unwrap(), None);
    }
}
