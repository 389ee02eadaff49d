//! An in-memory store used by the test suite and local development.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use bytes::Bytes;

use crate::storage::StorageBackend;

#[derive(Debug, Clone)]
pub struct StoredObject {
    pub content_type: String,
    pub data: Bytes,
}

/// A [`StorageBackend`] keeping every object in a shared map.
///
/// Cloning is shallow, clones observe the same objects. Individual keys
/// can be primed to fail their next store call, which is how the tests
/// exercise the partial-failure paths.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    objects: Arc<Mutex<HashMap<String, StoredObject>>>,
    failing: Arc<Mutex<HashSet<String>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every stored key, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.objects.lock().unwrap().keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn get(&self, key: &str) -> Option<StoredObject> {
        self.objects.lock().unwrap().get(key).cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.objects.lock().unwrap().contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.objects.lock().unwrap().is_empty()
    }

    /// Makes every store call against `key` fail.
    pub fn fail_store_on(&self, key: &str) {
        self.failing.lock().unwrap().insert(key.to_string());
    }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    async fn store(&self, key: &str, content_type: &str, data: Bytes) -> Result<String> {
        if self.failing.lock().unwrap().contains(key) {
            return Err(anyhow!("injected store failure"));
        }

        self.objects.lock().unwrap().insert(
            key.to_string(),
            StoredObject {
                content_type: content_type.to_string(),
                data,
            },
        );

        Ok(format!("https://cdn.example.com/{}", key))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.objects.lock().unwrap().remove(key);
        Ok(())
    }
}
