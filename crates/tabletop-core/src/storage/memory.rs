//! Process-local session records.

use super::{BoxFuture, Storage, StorageError, StorageResult};
use crate::session::Session;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

/// Keeps each session as the same JSON snapshot a durable backend would write,
/// so a restored session never shares state with the one that was saved.
#[derive(Default)]
pub struct MemoryStorage {
    records: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn records(&self) -> StorageResult<MutexGuard<'_, HashMap<String, String>>> {
        self.records
            .lock()
            .map_err(|e| StorageError::Other(format!("Lock error: {}", e)))
    }
}

impl Storage for MemoryStorage {
    fn save(&self, key: &str, session: &Session) -> BoxFuture<'_, StorageResult<()>> {
        let key = key.to_string();
        let snapshot = session.to_json();
        Box::pin(async move {
            let snapshot = snapshot.map_err(|e| StorageError::Serialization(e.to_string()))?;
            self.records()?.insert(key, snapshot);
            Ok(())
        })
    }

    fn load(&self, key: &str) -> BoxFuture<'_, StorageResult<Session>> {
        let key = key.to_string();
        Box::pin(async move {
            let snapshot = self.records()?.get(&key).cloned();
            let snapshot = snapshot.ok_or(StorageError::NotFound(key))?;
            Session::from_json(&snapshot).map_err(|e| StorageError::Serialization(e.to_string()))
        })
    }

    fn delete(&self, key: &str) -> BoxFuture<'_, StorageResult<()>> {
        let key = key.to_string();
        Box::pin(async move {
            self.records()?.remove(&key);
            Ok(())
        })
    }
}
