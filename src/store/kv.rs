// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Flat key-value store backed by one JSON file per key.
//!
//! The presence subsystem persists small documents (the active-venue map,
//! ping stats, background snapshots) on every mutation so that state
//! survives process restart. Writes go to a temp file and are renamed into
//! place so a crash mid-write never leaves a torn document.
//!
//! An in-memory backend backs tests that don't want disk I/O.

use crate::error::{AppError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Handle to the local key-value store. Cheap to clone.
#[derive(Clone)]
pub struct KvStore {
    backend: Backend,
}

#[derive(Clone)]
enum Backend {
    Disk(PathBuf),
    Memory(Arc<Mutex<HashMap<String, serde_json::Value>>>),
}

impl KvStore {
    /// Open (creating if needed) a store rooted at `dir`.
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|e| {
            AppError::Storage(format!("create {}: {}", dir.display(), e))
        })?;
        Ok(Self {
            backend: Backend::Disk(dir),
        })
    }

    /// Create an in-memory store (for tests).
    pub fn new_in_memory() -> Self {
        Self {
            backend: Backend::Memory(Arc::new(Mutex::new(HashMap::new()))),
        }
    }

    /// Read and deserialize the document under `key`.
    ///
    /// Returns `Ok(None)` when the key has never been written.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let value = match &self.backend {
            Backend::Disk(dir) => {
                let path = dir.join(format!("{}.json", key));
                if !path.exists() {
                    return Ok(None);
                }
                let data = fs::read_to_string(&path)
                    .map_err(|e| AppError::Storage(format!("read {}: {}", key, e)))?;
                serde_json::from_str(&data)
                    .map_err(|e| AppError::Storage(format!("parse {}: {}", key, e)))?
            }
            Backend::Memory(map) => {
                let map = map.lock().expect("kv store lock poisoned");
                match map.get(key) {
                    Some(v) => v.clone(),
                    None => return Ok(None),
                }
            }
        };

        serde_json::from_value(value)
            .map(Some)
            .map_err(|e| AppError::Storage(format!("decode {}: {}", key, e)))
    }

    /// Serialize and write the document under `key`.
    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let doc = serde_json::to_value(value)
            .map_err(|e| AppError::Storage(format!("encode {}: {}", key, e)))?;

        match &self.backend {
            Backend::Disk(dir) => {
                let path = dir.join(format!("{}.json", key));
                let tmp = dir.join(format!("{}.json.tmp", key));
                let data = serde_json::to_string_pretty(&doc)
                    .map_err(|e| AppError::Storage(format!("encode {}: {}", key, e)))?;
                fs::write(&tmp, data)
                    .map_err(|e| AppError::Storage(format!("write {}: {}", key, e)))?;
                fs::rename(&tmp, &path)
                    .map_err(|e| AppError::Storage(format!("rename {}: {}", key, e)))?;
            }
            Backend::Memory(map) => {
                let mut map = map.lock().expect("kv store lock poisoned");
                map.insert(key.to_string(), doc);
            }
        }
        Ok(())
    }

    /// Delete the document under `key`, if present.
    pub fn delete(&self, key: &str) -> Result<()> {
        match &self.backend {
            Backend::Disk(dir) => {
                let path = dir.join(format!("{}.json", key));
                if path.exists() {
                    fs::remove_file(&path)
                        .map_err(|e| AppError::Storage(format!("delete {}: {}", key, e)))?;
                }
            }
            Backend::Memory(map) => {
                let mut map = map.lock().expect("kv store lock poisoned");
                map.remove(key);
            }
        }
        Ok(())
    }
}
