//! Browser `localStorage` implementation for WebAssembly.

use super::{BoxFuture, Storage, StorageError, StorageResult};
use crate::session::Session;
use web_sys::Storage as WebStorage;

/// Keeps session records apart from other data on the page's origin.
const KEY_PREFIX: &str = "tabletop:";

/// Session storage backed by the page's `localStorage`.
///
/// Note: This is intentionally not Send/Sync since WASM is single-threaded.
#[derive(Default)]
pub struct LocalStorage;

impl LocalStorage {
    pub fn new() -> Self {
        Self
    }

    fn web_storage() -> StorageResult<WebStorage> {
        let window =
            web_sys::window().ok_or_else(|| StorageError::Other("No window object".to_string()))?;
        window
            .local_storage()
            .map_err(|e| StorageError::Other(format!("localStorage error: {:?}", e)))?
            .ok_or_else(|| StorageError::Other("localStorage not available".to_string()))
    }

    fn prefixed(key: &str) -> String {
        format!("{KEY_PREFIX}{key}")
    }
}

impl Storage for LocalStorage {
    fn save(&self, key: &str, session: &Session) -> BoxFuture<'_, StorageResult<()>> {
        let key = Self::prefixed(key);
        let json = session.to_json();
        Box::pin(async move {
            let json = json.map_err(|e| StorageError::Serialization(e.to_string()))?;
            Self::web_storage()?
                .set_item(&key, &json)
                .map_err(|e| StorageError::Io(format!("Failed to write {}: {:?}", key, e)))
        })
    }

    fn load(&self, key: &str) -> BoxFuture<'_, StorageResult<Session>> {
        let key = key.to_string();
        Box::pin(async move {
            let json = Self::web_storage()?
                .get_item(&Self::prefixed(&key))
                .map_err(|e| StorageError::Io(format!("Failed to read {}: {:?}", key, e)))?
                .ok_or_else(|| StorageError::NotFound(key.clone()))?;
            Session::from_json(&json).map_err(|e| StorageError::Serialization(e.to_string()))
        })
    }

    fn delete(&self, key: &str) -> BoxFuture<'_, StorageResult<()>> {
        let key = Self::prefixed(key);
        Box::pin(async move {
            Self::web_storage()?
                .remove_item(&key)
                .map_err(|e| StorageError::Io(format!("Failed to delete {}: {:?}", key, e)))
        })
    }
}
