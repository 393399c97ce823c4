// File: backend.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use log::debug;
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use super::errors::BackendError;
use crate::config::{BackendKind, StoreConfig};
use crate::util::estimate_size;

/// String key/value medium the history blob lives in.
pub trait StorageBackend: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, BackendError>;
    fn set(&self, key: &str, value: &str) -> Result<(), BackendError>;
    fn remove(&self, key: &str) -> Result<(), BackendError>;
    fn name(&self) -> &'static str;
}

impl<B: StorageBackend + ?Sized> StorageBackend for Box<B> {
    fn get(&self, key: &str) -> Result<Option<String>, BackendError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), BackendError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), BackendError> {
        (**self).remove(key)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

pub fn open_backend(config: &StoreConfig) -> Result<Box<dyn StorageBackend>, BackendError> {
    let dir = config.resolve_data_dir();
    debug!("opening {} backend in {}", config.backend(), dir.display());
    match config.backend() {
        BackendKind::File => Ok(Box::new(FileBackend::new(dir)?)),
        BackendKind::Sled => Ok(Box::new(SledBackend::open(&dir)?)),
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    entries: Mutex<HashMap<String, String>>,
    capacity: Option<u64>,
    unavailable: AtomicBool,
}

/// In-process backend. Clones share the same entries, so a test can keep a
/// handle after passing one to the store.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    state: Arc<MemoryState>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects writes whose total estimated size would exceed `bytes`.
    pub fn with_capacity(bytes: u64) -> Self {
        Self {
            state: Arc::new(MemoryState {
                capacity: Some(bytes),
                ..Default::default()
            }),
        }
    }

    pub fn set_available(&self, available: bool) {
        self.state.unavailable.store(!available, Ordering::SeqCst);
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.state
            .entries
            .lock()
            .ok()
            .and_then(|entries| entries.get(key).cloned())
    }

    fn entries(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>, BackendError> {
        if self.state.unavailable.load(Ordering::SeqCst) {
            return Err(BackendError::Unavailable(
                "in-memory storage disabled".to_string(),
            ));
        }
        self.state
            .entries
            .lock()
            .map_err(|_| BackendError::Unavailable("in-memory storage poisoned".to_string()))
    }
}

impl StorageBackend for MemoryBackend {
    fn get(&self, key: &str) -> Result<Option<String>, BackendError> {
        Ok(self.entries()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), BackendError> {
        let mut entries = self.entries()?;
        if let Some(capacity) = self.state.capacity {
            let others: u64 = entries
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| estimate_size(k) + estimate_size(v))
                .sum();
            let needed = others + estimate_size(key) + estimate_size(value);
            if needed > capacity {
                return Err(BackendError::QuotaExceeded(format!(
                    "{} bytes needed, {} available",
                    needed, capacity
                )));
            }
        }
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), BackendError> {
        self.entries()?.remove(key);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

const ENOSPC: i32 = 28;

/// One JSON file per key inside a data directory. Writes go through a
/// temporary file in the same directory and are renamed into place.
#[derive(Debug)]
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    pub fn new(dir: PathBuf) -> Result<Self, BackendError> {
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let file_name: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(format!("{}.json", file_name))
    }
}

fn map_write_error(error: std::io::Error) -> BackendError {
    if error.raw_os_error() == Some(ENOSPC) {
        BackendError::QuotaExceeded(error.to_string())
    } else {
        BackendError::from(error)
    }
}

impl StorageBackend for FileBackend {
    fn get(&self, key: &str) -> Result<Option<String>, BackendError> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), BackendError> {
        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir).map_err(map_write_error)?;
        tmp.write_all(value.as_bytes()).map_err(map_write_error)?;
        tmp.flush().map_err(map_write_error)?;
        tmp.persist(self.path_for(key))
            .map_err(|e| map_write_error(e.error))?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), BackendError> {
        match std::fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn name(&self) -> &'static str {
        "file"
    }
}

/// Embedded key/value backend.
pub struct SledBackend {
    db: sled::Db,
}

impl SledBackend {
    pub fn open(dir: &Path) -> Result<Self, BackendError> {
        std::fs::create_dir_all(dir)?;
        let db = sled::Config::default()
            .path(dir.join("history.sled"))
            .open()?;
        Ok(Self { db })
    }
}

impl StorageBackend for SledBackend {
    fn get(&self, key: &str) -> Result<Option<String>, BackendError> {
        match self.db.get(key.as_bytes())? {
            Some(value) => String::from_utf8(value.to_vec())
                .map(Some)
                .map_err(|e| BackendError::Database(e.to_string())),
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), BackendError> {
        self.db.insert(key.as_bytes(), value.as_bytes())?;
        self.db.flush().map_err(|e| match e {
            sled::Error::Io(io) => map_write_error(io),
            other => BackendError::from(other),
        })?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), BackendError> {
        self.db.remove(key.as_bytes())?;
        self.db.flush()?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "sled"
    }
}
