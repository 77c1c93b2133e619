use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use thiserror::Error;

const STORAGE_DIR_NAME: &str = "elara-nexus";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("storage medium unavailable")]
    Unavailable,
    #[error("storage read failed: {message}")]
    Read { message: String },
    #[error("storage write failed: {message}")]
    Write { message: String },
}

/// Synchronous string key-value medium the settings store persists into.
pub trait SettingsStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

impl<S: SettingsStorage + ?Sized> SettingsStorage for &S {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set_item(key, value)
    }
}

impl<S: SettingsStorage + ?Sized> SettingsStorage for Box<S> {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set_item(key, value)
    }
}

impl<S: SettingsStorage + ?Sized> SettingsStorage for Arc<S> {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set_item(key, value)
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    items: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&self) {
        self.items
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clear();
    }
}

impl SettingsStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let items = self
            .items
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.items
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Storage for contexts with no persistent medium (headless runs, tests of
/// the fallback path). Every access reports [`StorageError::Unavailable`].
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableStorage;

impl SettingsStorage for UnavailableStorage {
    fn get_item(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Err(StorageError::Unavailable)
    }

    fn set_item(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
        Err(StorageError::Unavailable)
    }
}

/// One JSON file per key under a directory, created on first write.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn open_default() -> Self {
        Self::new(default_storage_dir())
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[must_use]
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl SettingsStorage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(raw) => Ok(Some(raw)),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(None),
            Err(error) => Err(StorageError::Read {
                message: error.to_string(),
            }),
        }
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir).map_err(|error| StorageError::Write {
            message: format!("mkdir {}: {error}", self.dir.display()),
        })?;
        fs::write(self.path_for(key), value).map_err(|error| StorageError::Write {
            message: error.to_string(),
        })
    }
}

#[must_use]
pub fn default_storage_dir() -> PathBuf {
    if let Some(mut data_dir) = dirs::data_local_dir() {
        data_dir.push(STORAGE_DIR_NAME);
        return data_dir;
    }

    if let Some(mut home_dir) = dirs::home_dir() {
        home_dir.push(format!(".{STORAGE_DIR_NAME}"));
        return home_dir;
    }

    PathBuf::from(".")
}

#[cfg(target_arch = "wasm32")]
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserLocalStorage;

#[cfg(target_arch = "wasm32")]
impl BrowserLocalStorage {
    fn storage() -> Result<web_sys::Storage, StorageError> {
        let Some(window) = web_sys::window() else {
            return Err(StorageError::Unavailable);
        };
        match window.local_storage() {
            Ok(Some(storage)) => Ok(storage),
            _ => Err(StorageError::Unavailable),
        }
    }
}

#[cfg(target_arch = "wasm32")]
impl SettingsStorage for BrowserLocalStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Self::storage()?
            .get_item(key)
            .map_err(|_| StorageError::Read {
                message: "failed to read local storage".to_string(),
            })
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        Self::storage()?
            .set_item(key, value)
            .map_err(|_| StorageError::Write {
                message: "failed to write local storage".to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_storage_shares_items_across_clones() {
        let storage = MemoryStorage::new();
        let view = storage.clone();
        storage.set_item("k", "v").expect("set");
        assert_eq!(view.get_item("k").expect("get"), Some("v".to_string()));

        view.clear();
        assert_eq!(storage.get_item("k").expect("get"), None);
    }

    #[test]
    fn file_storage_creates_directory_and_survives_reopen() {
        let temp = tempfile::tempdir().expect("temp dir");
        let dir = temp.path().join("nested").join("nexus");
        let storage = FileStorage::new(&dir);
        assert_eq!(storage.get_item("settings").expect("missing read"), None);

        storage.set_item("settings", "{\"a\":1}").expect("write");
        assert!(storage.path_for("settings").exists());

        let reopened = FileStorage::new(&dir);
        assert_eq!(
            reopened.get_item("settings").expect("read"),
            Some("{\"a\":1}".to_string())
        );
    }

    #[test]
    fn unavailable_storage_reports_unavailable() {
        assert_eq!(
            UnavailableStorage.get_item("k"),
            Err(StorageError::Unavailable)
        );
        assert_eq!(
            UnavailableStorage.set_item("k", "v"),
            Err(StorageError::Unavailable)
        );
    }

    #[test]
    fn boxed_storage_delegates() {
        let boxed: Box<dyn SettingsStorage> = Box::new(MemoryStorage::new());
        boxed.set_item("k", "v").expect("set");
        assert_eq!(boxed.get_item("k").expect("get"), Some("v".to_string()));
    }
}
