use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::dates::day_key;

pub const STREAK_KEY: &str = "streak";
pub const PREFS_KEY: &str = "prefs";
pub const TASKS_KEY_PREFIX: &str = "tasks_";
pub const EXPORT_FILE_NAME: &str = "daily_focus_backup.json";

const STORE_FILE: &str = "store.json";

#[derive(Debug)]
pub enum StorageError {
    Io(std::io::Error),
    Json(serde_json::Error),
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::Io(err) => write!(f, "io error: {err}"),
            StorageError::Json(err) => write!(f, "json error: {err}"),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<std::io::Error> for StorageError {
    fn from(value: std::io::Error) -> Self {
        StorageError::Io(value)
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(value: serde_json::Error) -> Self {
        StorageError::Json(value)
    }
}

/// A flat string-to-string key space, in the manner of browser local storage.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: String) -> Result<(), StorageError>;
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
    fn keys(&self) -> Vec<String>;
    fn clear(&mut self) -> Result<(), StorageError>;
}

pub fn tasks_key(date: NaiveDate) -> String {
    format!("{TASKS_KEY_PREFIX}{}", day_key(date))
}

/// Decodes the JSON value under `key`. Missing and undecodable values both come
/// back as `T::default()`.
pub fn load_json_or_default<T, S>(store: &S, key: &str) -> T
where
    T: DeserializeOwned + Default,
    S: KeyValueStore + ?Sized,
{
    let Some(raw) = store.get(key) else {
        return T::default();
    };
    match serde_json::from_str(&raw) {
        Ok(value) => value,
        Err(err) => {
            log::warn!("discarding unreadable value key={key} err={err}");
            T::default()
        }
    }
}

pub fn save_json<T, S>(store: &mut S, key: &str, value: &T) -> Result<(), StorageError>
where
    T: Serialize + ?Sized,
    S: KeyValueStore + ?Sized,
{
    let json = serde_json::to_string(value)?;
    store.set(key, json)
}

/// Every persisted key mapped to its raw string value.
pub fn export_document<S: KeyValueStore + ?Sized>(store: &S) -> BTreeMap<String, String> {
    store
        .keys()
        .into_iter()
        .filter_map(|key| store.get(&key).map(|value| (key, value)))
        .collect()
}

pub fn export_json<S: KeyValueStore + ?Sized>(store: &S) -> Result<String, StorageError> {
    Ok(serde_json::to_string_pretty(&export_document(store))?)
}

/// Writes the export document into `dir` and returns the file path.
pub fn write_export<S: KeyValueStore + ?Sized>(
    store: &S,
    dir: &Path,
) -> Result<PathBuf, StorageError> {
    fs::create_dir_all(dir)?;
    let path = dir.join(EXPORT_FILE_NAME);
    write_atomic_bytes(&path, export_json(store)?.as_bytes())?;
    Ok(path)
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.entries.remove(key);
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    fn clear(&mut self) -> Result<(), StorageError> {
        self.entries.clear();
        Ok(())
    }
}

/// Keeps the whole key space in one JSON object file under `root`, rewritten
/// atomically on every change.
pub struct FileStore {
    root: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileStore {
    pub fn open(root: PathBuf) -> Result<Self, StorageError> {
        fs::create_dir_all(&root)?;
        let path = root.join(STORE_FILE);
        let entries = if path.exists() {
            match load_json::<BTreeMap<String, String>>(&path) {
                Ok(entries) => entries,
                Err(StorageError::Json(err)) => {
                    let aside = quarantine(&root, &path)?;
                    log::warn!(
                        "store file unreadable, starting empty err={err} moved_to={}",
                        aside.display()
                    );
                    BTreeMap::new()
                }
                Err(err) => return Err(err),
            }
        } else {
            BTreeMap::new()
        };
        log::debug!("store opened path={} keys={}", path.display(), entries.len());
        Ok(Self { root, entries })
    }

    fn flush(&self) -> Result<(), StorageError> {
        let json = serde_json::to_vec_pretty(&self.entries)?;
        write_atomic_bytes(&self.root.join(STORE_FILE), &json)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StorageError> {
        let previous = self.entries.insert(key.to_string(), value);
        if let Err(err) = self.flush() {
            // Keep memory in step with what is on disk.
            match previous {
                Some(previous) => self.entries.insert(key.to_string(), previous),
                None => self.entries.remove(key),
            };
            return Err(err);
        }
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        let Some(previous) = self.entries.remove(key) else {
            return Ok(());
        };
        if let Err(err) = self.flush() {
            self.entries.insert(key.to_string(), previous);
            return Err(err);
        }
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    fn clear(&mut self) -> Result<(), StorageError> {
        let previous = std::mem::take(&mut self.entries);
        if let Err(err) = self.flush() {
            self.entries = previous;
            return Err(err);
        }
        Ok(())
    }
}

// Bytes, not a string: invalid UTF-8 must surface as a decode error.
fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, StorageError> {
    let bytes = fs::read(path)?;
    Ok(serde_json::from_slice(&bytes)?)
}

fn quarantine(root: &Path, path: &Path) -> Result<PathBuf, StorageError> {
    let timestamp = chrono::Local::now().format("%Y%m%d-%H%M%S").to_string();
    let aside = root.join(format!("store.corrupt-{timestamp}.json"));
    fs::copy(path, &aside)?;
    Ok(aside)
}

fn write_atomic_bytes(path: &Path, bytes: &[u8]) -> Result<(), StorageError> {
    let temp_path = path.with_extension("tmp");
    {
        let mut file = File::create(&temp_path)?;
        file.write_all(bytes)?;
        file.sync_all()?;
    }
    fs::rename(temp_path, path)?;
    Ok(())
}
