//! Durable client storage for session artifacts.
//!
//! Plays the role of the browser's local storage: a flat string key/value space that outlives the
//! process. `FileStorage` re-reads its file on every `get` so that a login or logout performed by
//! another process is picked up on the next snapshot.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use parking_lot::{Mutex, RwLock};
use serde_json::{Map, Value};

use crate::error::{GateError, GateResult};

pub trait SessionStorage: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> GateResult<()>;
    fn remove(&self, key: &str) -> GateResult<()>;
}

#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self { Self::default() }

    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let map = entries.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        Self { entries: RwLock::new(map) }
    }
}

impl SessionStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> { self.entries.read().get(key).cloned() }

    fn set(&self, key: &str, value: &str) -> GateResult<()> {
        self.entries.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> GateResult<()> {
        self.entries.write().remove(key);
        Ok(())
    }
}

pub const SESSION_FILE: &str = "session.json";

/// JSON object file `<dir>/session.json` holding string values.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    // serialises read-modify-write cycles within this process
    write_lock: Mutex<()>,
}

impl FileStorage {
    pub fn open<P: AsRef<Path>>(dir: P) -> GateResult<Self> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir).map_err(|e| {
            GateError::storage("session_dir".to_string(), format!("cannot create {}: {}", dir.display(), e))
        })?;
        Ok(Self { path: dir.join(SESSION_FILE), write_lock: Mutex::new(()) })
    }

    pub fn path(&self) -> &Path { &self.path }

    /// Missing, unreadable or corrupt files read as empty.
    fn load(&self) -> Map<String, Value> {
        let Ok(text) = std::fs::read_to_string(&self.path) else { return Map::new(); };
        match serde_json::from_str::<Value>(&text) {
            Ok(Value::Object(m)) => m,
            _ => {
                tracing::warn!(target: "session", path = %self.path.display(), "session file is corrupt; reading as empty");
                Map::new()
            }
        }
    }

    fn store(&self, map: &Map<String, Value>) -> GateResult<()> {
        let text = serde_json::to_string_pretty(map)?;
        // one staging file per process
        let tmp = temp_path(&self.path);
        std::fs::write(&tmp, text)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(format!(".{}.tmp", std::process::id()));
    path.with_file_name(name)
}

impl SessionStorage for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        match self.load().get(key) {
            Some(Value::String(s)) => Some(s.clone()),
            _ => None,
        }
    }

    fn set(&self, key: &str, value: &str) -> GateResult<()> {
        let _g = self.write_lock.lock();
        let mut map = self.load();
        map.insert(key.to_string(), Value::String(value.to_string()));
        self.store(&map)
    }

    fn remove(&self, key: &str) -> GateResult<()> {
        let _g = self.write_lock.lock();
        let mut map = self.load();
        if map.remove(key).is_some() {
            self.store(&map)?;
        }
        Ok(())
    }
}
