//! Key-value repository for profile and daily counters.
//!
//! Everything that is not a journal entry lives here: the user profile and
//! per-day counters such as water intake and step count. The store is
//! passed in explicitly; nothing reaches for it as global state.
//!
//! Keys in use:
//! - `profile`
//! - `water:<YYYY-MM-DD>` (ml)
//! - `steps:<YYYY-MM-DD>`

use crate::{Error, Result, UserProfile};
use chrono::NaiveDate;
use fs2::FileExt;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

pub const PROFILE_KEY: &str = "profile";

/// Key for a dated counter, e.g. `water:2024-05-01`
pub fn day_key(prefix: &str, date: NaiveDate) -> String {
    format!("{}:{}", prefix, date.format("%Y-%m-%d"))
}

/// Repository interface for loosely structured state
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<Value>>;
    fn set(&mut self, key: &str, value: Value) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<Option<Value>>;

    /// Replace the value at `key` with `f(current)` as one step
    ///
    /// Returns the stored value. Nothing is written if `f` fails.
    fn update(
        &mut self,
        key: &str,
        f: &mut dyn FnMut(Option<Value>) -> Result<Value>,
    ) -> Result<Value>;
}

/// In-memory store, used by tests and embedders without a data directory
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: Value) -> Result<()> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<Option<Value>> {
        Ok(self.entries.remove(key))
    }

    fn update(
        &mut self,
        key: &str,
        f: &mut dyn FnMut(Option<Value>) -> Result<Value>,
    ) -> Result<Value> {
        let value = f(self.entries.get(key).cloned())?;
        self.entries.insert(key.to_string(), value.clone());
        Ok(value)
    }
}

/// JSON object file store with file locking
///
/// Every `set` rewrites the whole file atomically. Reads take a shared
/// lock on the file. Updates hold an exclusive lock on a sibling
/// `.lock` file for the whole read-modify-write, then rename a temp file
/// over the original.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the whole object
    ///
    /// Returns an empty map if the file doesn't exist.
    /// If the file is corrupted, logs a warning and returns an empty map.
    fn load(&self) -> Result<Map<String, Value>> {
        if !self.path.exists() {
            tracing::debug!("No store file at {:?}, starting empty", self.path);
            return Ok(Map::new());
        }

        let file = File::open(&self.path)?;
        file.lock_shared()?;

        let mut contents = String::new();
        let read = std::io::BufReader::new(&file).read_to_string(&mut contents);
        file.unlock()?;
        read?;

        match serde_json::from_str::<Map<String, Value>>(&contents) {
            Ok(map) => Ok(map),
            Err(e) => {
                tracing::warn!(
                    "Failed to parse store file {:?}: {}. Treating as empty.",
                    self.path,
                    e
                );
                Ok(Map::new())
            }
        }
    }

    /// Take the writer lock, released when the returned file is dropped
    fn lock_writers(&self) -> Result<File> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let lock_path = self.path.with_extension("json.lock");
        let lock = OpenOptions::new()
            .create(true)
            .write(true)
            .open(&lock_path)?;
        lock.lock_exclusive()?;
        Ok(lock)
    }

    /// Atomically replace the file contents
    fn save(&self, map: &Map<String, Value>) -> Result<()> {
        let parent = self
            .path
            .parent()
            .ok_or_else(|| Error::Store(format!("store path {:?} has no parent", self.path)))?;
        std::fs::create_dir_all(parent)?;

        let temp = NamedTempFile::new_in(parent)?;
        temp.as_file().lock_exclusive()?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            serde_json::to_writer(&mut writer, map)?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;
        temp.persist(&self.path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Saved store to {:?}", self.path);
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.load()?.remove(key))
    }

    fn set(&mut self, key: &str, value: Value) -> Result<()> {
        let lock = self.lock_writers()?;
        let mut map = self.load()?;
        map.insert(key.to_string(), value);
        self.save(&map)?;
        lock.unlock()?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<Option<Value>> {
        let lock = self.lock_writers()?;
        let mut map = self.load()?;
        let removed = map.remove(key);
        if removed.is_some() {
            self.save(&map)?;
        }
        lock.unlock()?;
        Ok(removed)
    }

    fn update(
        &mut self,
        key: &str,
        f: &mut dyn FnMut(Option<Value>) -> Result<Value>,
    ) -> Result<Value> {
        let lock = self.lock_writers()?;
        let mut map = self.load()?;
        let value = f(map.get(key).cloned())?;
        map.insert(key.to_string(), value.clone());
        self.save(&map)?;
        lock.unlock()?;
        Ok(value)
    }
}

/// Load the saved profile, if onboarding has happened
///
/// A profile that no longer deserializes is logged and treated as absent.
pub fn load_profile(store: &dyn KeyValueStore) -> Result<Option<UserProfile>> {
    let value = match store.get(PROFILE_KEY)? {
        Some(value) => value,
        None => return Ok(None),
    };

    match serde_json::from_value(value) {
        Ok(profile) => Ok(Some(profile)),
        Err(e) => {
            tracing::warn!("Stored profile is unreadable: {}. Ignoring it.", e);
            Ok(None)
        }
    }
}

pub fn save_profile(store: &mut dyn KeyValueStore, profile: &UserProfile) -> Result<()> {
    store.set(PROFILE_KEY, serde_json::to_value(profile)?)?;
    tracing::info!("Saved profile");
    Ok(())
}

/// Read a dated counter (0 when unset or not a number)
pub fn day_counter(store: &dyn KeyValueStore, prefix: &str, date: NaiveDate) -> Result<u64> {
    Ok(store
        .get(&day_key(prefix, date))?
        .and_then(|v| v.as_u64())
        .unwrap_or(0))
}

/// Overwrite a dated counter
pub fn set_day_counter(
    store: &mut dyn KeyValueStore,
    prefix: &str,
    date: NaiveDate,
    value: u64,
) -> Result<()> {
    store.set(&day_key(prefix, date), Value::from(value))
}

/// Add to a dated counter and return the new total
pub fn add_day_counter(
    store: &mut dyn KeyValueStore,
    prefix: &str,
    date: NaiveDate,
    amount: u64,
) -> Result<u64> {
    let mut total = 0;
    store.update(&day_key(prefix, date), &mut |current| {
        total = current
            .and_then(|v| v.as_u64())
            .unwrap_or(0)
            .saturating_add(amount);
        Ok(Value::from(total))
    })?;
    Ok(total)
}
