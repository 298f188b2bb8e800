//! In-Memory State Store
//!
//! A shared map behind a mutex. Clones share the same data, so a test (or
//! an embedding service) can hand one clone to the driver and keep another
//! to play the external writer.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use super::{StateStore, StoreError};

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    data: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, String>>, StoreError> {
        self.data
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))
    }
}

impl StateStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.lock()?.remove(key);
        Ok(())
    }

    fn take(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.lock()?.remove(key))
    }
}
