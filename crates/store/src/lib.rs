use std::collections::HashMap;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use serde::{de::DeserializeOwned, Serialize};

mod error;
pub use error::*;

/// String-keyed persistence with whole-value reads and writes.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, Error>;
    fn set(&self, key: &str, value: String) -> Result<(), Error>;
    fn remove(&self, key: &str) -> Result<(), Error>;
}

pub trait ScopedStoreKey: std::fmt::Display {}

#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, Error> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: String) -> Result<(), Error> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), Error> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.remove(key);
        Ok(())
    }
}

/// One `<key>.json` file per key inside `dir`.
pub struct FileStore {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, Error> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;

        Ok(Self {
            dir,
            write_lock: Mutex::new(()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, Error> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');

        if !valid {
            return Err(Error::InvalidKey(key.to_string()));
        }

        Ok(self.dir.join(format!("{}.json", key)))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, Error> {
        let path = self.path_for(key)?;

        match std::fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: String) -> Result<(), Error> {
        let path = self.path_for(key)?;
        let tmp = path.with_extension("json.tmp");

        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        std::fs::write(&tmp, value)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), Error> {
        let path = self.path_for(key)?;

        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Typed view over a [`KeyValueStore`] restricted to one key enum.
pub struct ScopedStore<K: ScopedStoreKey> {
    inner: Arc<dyn KeyValueStore>,
    _key: PhantomData<fn(K)>,
}

impl<K: ScopedStoreKey> Clone for ScopedStore<K> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            _key: PhantomData,
        }
    }
}

impl<K: ScopedStoreKey> ScopedStore<K> {
    pub fn new(inner: Arc<dyn KeyValueStore>) -> Self {
        Self {
            inner,
            _key: PhantomData,
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    pub fn get<T: DeserializeOwned>(&self, key: K) -> Result<Option<T>, Error> {
        match self.inner.get(&key.to_string())? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    pub fn set<T: Serialize>(&self, key: K, value: T) -> Result<(), Error> {
        let raw = serde_json::to_string(&value)?;
        self.inner.set(&key.to_string(), raw)
    }

    pub fn remove(&self, key: K) -> Result<(), Error> {
        self.inner.remove(&key.to_string())
    }
}
