//! Durable local key-value storage backing the offline queue.

use crate::error::QueueError;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// String-valued key-value store. Single writer, single reader.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, QueueError>;
    fn set(&self, key: &str, value: &str) -> Result<(), QueueError>;
}

/// Keeps every key in one JSON object file, rewritten atomically on `set`.
pub struct FileKeyValueStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileKeyValueStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self, key: &str) -> Result<Map<String, Value>, QueueError> {
        if !self.path.exists() {
            return Ok(Map::new());
        }

        let raw = fs::read_to_string(&self.path).map_err(|e| QueueError::Read {
            key: key.to_string(),
            message: format!("{}: {e}", self.path.display()),
        })?;
        if raw.trim().is_empty() {
            return Ok(Map::new());
        }

        // A broken container file is not a queue corruption; refuse to
        // overwrite it so nothing else stored there is lost.
        serde_json::from_str::<Map<String, Value>>(&raw).map_err(|e| QueueError::Read {
            key: key.to_string(),
            message: format!("{} is not a JSON object: {e}", self.path.display()),
        })
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, QueueError> {
        let _guard = self
            .lock
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let entries = self.read_entries(key)?;
        Ok(entries.get(key).and_then(Value::as_str).map(String::from))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), QueueError> {
        let _guard = self
            .lock
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut entries = self.read_entries(key)?;
        entries.insert(key.to_string(), Value::String(value.to_string()));

        let serialized = serde_json::to_string_pretty(&entries)?;
        write_atomic(&self.path, &serialized).map_err(|e| QueueError::Write {
            key: key.to_string(),
            message: e.to_string(),
        })
    }
}

fn write_atomic(path: &Path, content: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }

    let temp_path = path.with_extension("tmp");
    fs::write(&temp_path, content)?;

    if let Err(rename_error) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(rename_error);
    }

    Ok(())
}

/// Process-local store for tests and throwaway sessions.
#[derive(Default)]
pub struct MemoryKeyValueStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, QueueError> {
        let entries = self
            .entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), QueueError> {
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
