//! Debounced persistence of one map's session.
//!
//! A session is stored under `vtt-session:<map image>`. Restoring never fails:
//! a missing or unreadable record yields a fresh session.

use super::{Storage, StorageError, StorageResult};
use crate::engine::VttEngine;
use crate::session::Session;
use std::sync::Arc;

#[cfg(not(target_arch = "wasm32"))]
use std::time::{Duration, Instant};

#[cfg(target_arch = "wasm32")]
use web_time::{Duration, Instant};

/// Minimum time between two writes of a changing session.
pub const DEFAULT_AUTOSAVE_INTERVAL: Duration = Duration::from_millis(500);

/// Keeps a session's stored copy in step with the live one.
pub struct SessionPersistence<S: Storage> {
    storage: Arc<S>,
    map_image: String,
    key: String,
    interval: Duration,
    last_save: Option<Instant>,
    dirty: bool,
}

impl<S: Storage> SessionPersistence<S> {
    /// Persistence for the session of `map_image`.
    pub fn new(storage: Arc<S>, map_image: &str) -> Self {
        Self {
            storage,
            map_image: map_image.to_string(),
            key: Session::storage_key_for(map_image),
            interval: DEFAULT_AUTOSAVE_INTERVAL,
            last_save: None,
            dirty: false,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Dirty and the debounce interval has passed since the last write.
    pub fn should_save(&self) -> bool {
        if !self.dirty {
            return false;
        }
        match self.last_save {
            Some(last) => last.elapsed() >= self.interval,
            None => true,
        }
    }

    /// Load the stored session, or start a new one for this map.
    pub async fn restore(&mut self) -> Session {
        let session = match self.storage.load(&self.key).await {
            Ok(mut session) => {
                log::info!("restored session {}", self.key);
                // The record's key is authoritative for which map it belongs to
                session.map_image = self.map_image.clone();
                session
            }
            Err(StorageError::NotFound(_)) => Session::new(self.map_image.as_str()),
            Err(e) => {
                log::warn!("discarding stored session {}: {}", self.key, e);
                Session::new(self.map_image.as_str())
            }
        };
        self.dirty = false;
        self.last_save = Some(Instant::now());
        session
    }

    /// Write if [`Self::should_save`]. Returns whether a write happened.
    pub async fn maybe_save(&mut self, session: &Session) -> StorageResult<bool> {
        if !self.should_save() {
            return Ok(false);
        }
        self.save(session).await?;
        Ok(true)
    }

    /// Write immediately.
    pub async fn save(&mut self, session: &Session) -> StorageResult<()> {
        self.storage.save(&self.key, session).await?;
        self.last_save = Some(Instant::now());
        self.dirty = false;
        log::debug!("saved session {}", self.key);
        Ok(())
    }

    /// Write pending changes regardless of the interval.
    pub async fn flush(&mut self, session: &Session) -> StorageResult<()> {
        if self.dirty {
            self.save(session).await?;
        }
        Ok(())
    }

    /// Remove the stored record.
    pub async fn clear(&mut self) -> StorageResult<()> {
        self.storage.delete(&self.key).await?;
        self.dirty = false;
        Ok(())
    }

    /// Pick up the engine's changes and write them when due.
    ///
    /// A failed write is logged and retried on a later call.
    pub async fn observe(&mut self, engine: &mut VttEngine) -> bool {
        if engine.take_dirty() {
            self.mark_dirty();
        }
        match self.maybe_save(engine.session()).await {
            Ok(saved) => saved,
            Err(e) => {
                log::warn!("failed to save session {}: {}", self.key, e);
                false
            }
        }
    }

    /// Reset the engine and delete the stored record.
    pub async fn reset(&mut self, engine: &mut VttEngine) -> StorageResult<()> {
        engine.reset();
        self.clear().await
    }
}

/// Platform-specific storage type.
#[cfg(not(target_arch = "wasm32"))]
pub type PlatformStorage = super::FileStorage;

#[cfg(target_arch = "wasm32")]
pub type PlatformStorage = super::LocalStorage;

pub type PlatformSessionPersistence = SessionPersistence<PlatformStorage>;

/// Create the default storage for the current platform.
#[cfg(not(target_arch = "wasm32"))]
pub fn create_default_storage() -> StorageResult<Arc<PlatformStorage>> {
    super::FileStorage::default_location().map(Arc::new)
}

#[cfg(target_arch = "wasm32")]
pub fn create_default_storage() -> StorageResult<Arc<PlatformStorage>> {
    Ok(Arc::new(super::LocalStorage::new()))
}
