//! Storage abstraction for session persistence.

mod memory;
mod persistence;

#[cfg(not(target_arch = "wasm32"))]
mod file;

#[cfg(target_arch = "wasm32")]
mod local;

pub use memory::MemoryStorage;
pub use persistence::{
    DEFAULT_AUTOSAVE_INTERVAL, PlatformSessionPersistence, PlatformStorage, SessionPersistence,
    create_default_storage,
};

#[cfg(not(target_arch = "wasm32"))]
pub use file::FileStorage;

#[cfg(target_arch = "wasm32")]
pub use local::LocalStorage;

use crate::session::Session;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Session not found: {0}")]
    NotFound(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Storage error: {0}")]
    Other(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Boxed future for async operations (compatible with WASM).
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Thread-safety required of backends: `Send + Sync` natively, nothing on
/// single-threaded WASM.
#[cfg(not(target_arch = "wasm32"))]
pub trait StorageBounds: Send + Sync {}
#[cfg(not(target_arch = "wasm32"))]
impl<T: Send + Sync> StorageBounds for T {}

#[cfg(target_arch = "wasm32")]
pub trait StorageBounds {}
#[cfg(target_arch = "wasm32")]
impl<T> StorageBounds for T {}

/// A place to keep one session per key.
///
/// Keys come from [`Session::storage_key`] and are otherwise opaque.
pub trait Storage: StorageBounds {
    /// Save a session under `key`, replacing any previous record.
    fn save(&self, key: &str, session: &Session) -> BoxFuture<'_, StorageResult<()>>;

    /// Load the session stored under `key`, or [`StorageError::NotFound`].
    fn load(&self, key: &str) -> BoxFuture<'_, StorageResult<Session>>;

    /// Delete the record for `key`. Deleting a missing record is not an error.
    fn delete(&self, key: &str) -> BoxFuture<'_, StorageResult<()>>;
}
