//! Share record storage.
//!
//! Every method is atomic on its own. Sequences of calls are serialized by
//! [`super::ShareService`].

use super::model::{SessionRef, Share};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};
use thiserror::Error;

/// Store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Lock poisoned: {0}")]
    Lock(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Backend holding every share ever created, active or not.
pub trait ShareStore: Send + Sync {
    /// All shares for a session, oldest first.
    fn shares_for(&self, session_ref: &SessionRef) -> StoreResult<Vec<Share>>;

    fn find_active(&self, session_ref: &SessionRef) -> StoreResult<Option<Share>>;

    fn find_by_token(&self, share_token: &str) -> StoreResult<Option<Share>>;

    /// Mark every share of the session inactive. Returns how many changed.
    fn deactivate_all(&self, session_ref: &SessionRef) -> StoreResult<usize>;

    /// Deactivate the session's shares and add `share` as one change: either
    /// both happen or neither does. Returns how many shares were superseded.
    fn replace_active(&self, share: Share) -> StoreResult<usize>;
}

fn deactivate(shares: &mut [Share], session_ref: &SessionRef) -> usize {
    let mut changed = 0;
    for share in shares
        .iter_mut()
        .filter(|s| s.is_active && &s.session_ref == session_ref)
    {
        share.is_active = false;
        changed += 1;
    }
    changed
}

/// In-memory store for tests and single-process use.
#[derive(Default)]
pub struct MemoryShareStore {
    shares: RwLock<Vec<Share>>,
}

impl MemoryShareStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<std::sync::RwLockReadGuard<'_, Vec<Share>>> {
        self.shares
            .read()
            .map_err(|e| StoreError::Lock(e.to_string()))
    }

    fn write(&self) -> StoreResult<std::sync::RwLockWriteGuard<'_, Vec<Share>>> {
        self.shares
            .write()
            .map_err(|e| StoreError::Lock(e.to_string()))
    }
}

impl ShareStore for MemoryShareStore {
    fn shares_for(&self, session_ref: &SessionRef) -> StoreResult<Vec<Share>> {
        Ok(self
            .read()?
            .iter()
            .filter(|s| &s.session_ref == session_ref)
            .cloned()
            .collect())
    }

    fn find_active(&self, session_ref: &SessionRef) -> StoreResult<Option<Share>> {
        Ok(self
            .read()?
            .iter()
            .find(|s| s.is_active && &s.session_ref == session_ref)
            .cloned())
    }

    fn find_by_token(&self, share_token: &str) -> StoreResult<Option<Share>> {
        Ok(self
            .read()?
            .iter()
            .find(|s| s.share_token == share_token)
            .cloned())
    }

    fn deactivate_all(&self, session_ref: &SessionRef) -> StoreResult<usize> {
        Ok(deactivate(&mut self.write()?, session_ref))
    }

    fn replace_active(&self, share: Share) -> StoreResult<usize> {
        let mut shares = self.write()?;
        let superseded = deactivate(&mut shares, &share.session_ref);
        shares.push(share);
        Ok(superseded)
    }
}

/// All shares in one JSON file.
///
/// Writes go to a sibling temp file which then replaces the original, so a
/// crash mid-write leaves the previous contents intact.
pub struct FileShareStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileShareStore {
    pub const FILE_NAME: &'static str = "shares.json";

    /// Store `shares.json` inside `data_dir`, creating the directory.
    pub fn new(data_dir: impl AsRef<Path>) -> StoreResult<Self> {
        let data_dir = data_dir.as_ref();
        fs::create_dir_all(data_dir).map_err(|e| {
            StoreError::Io(format!("Failed to create {}: {}", data_dir.display(), e))
        })?;
        Ok(Self {
            path: data_dir.join(Self::FILE_NAME),
            lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> StoreResult<Vec<Share>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let json = fs::read_to_string(&self.path).map_err(|e| {
            StoreError::Io(format!("Failed to read {}: {}", self.path.display(), e))
        })?;
        serde_json::from_str(&json).map_err(|e| {
            StoreError::Serialization(format!("Failed to parse {}: {}", self.path.display(), e))
        })
    }

    fn persist(&self, shares: &[Share]) -> StoreResult<()> {
        let json = serde_json::to_string_pretty(shares)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)
            .map_err(|e| StoreError::Io(format!("Failed to write {}: {}", tmp.display(), e)))?;
        fs::rename(&tmp, &self.path).map_err(|e| {
            StoreError::Io(format!("Failed to replace {}: {}", self.path.display(), e))
        })
    }

    fn with_lock<T>(&self, f: impl FnOnce() -> StoreResult<T>) -> StoreResult<T> {
        let _guard = self
            .lock
            .lock()
            .map_err(|e| StoreError::Lock(e.to_string()))?;
        f()
    }
}

impl ShareStore for FileShareStore {
    fn shares_for(&self, session_ref: &SessionRef) -> StoreResult<Vec<Share>> {
        self.with_lock(|| {
            Ok(self
                .load()?
                .into_iter()
                .filter(|s| &s.session_ref == session_ref)
                .collect())
        })
    }

    fn find_active(&self, session_ref: &SessionRef) -> StoreResult<Option<Share>> {
        self.with_lock(|| {
            Ok(self
                .load()?
                .into_iter()
                .find(|s| s.is_active && &s.session_ref == session_ref))
        })
    }

    fn find_by_token(&self, share_token: &str) -> StoreResult<Option<Share>> {
        self.with_lock(|| {
            Ok(self
                .load()?
                .into_iter()
                .find(|s| s.share_token == share_token))
        })
    }

    fn deactivate_all(&self, session_ref: &SessionRef) -> StoreResult<usize> {
        self.with_lock(|| {
            let mut shares = self.load()?;
            let changed = deactivate(&mut shares, session_ref);
            if changed > 0 {
                self.persist(&shares)?;
            }
            Ok(changed)
        })
    }

    fn replace_active(&self, share: Share) -> StoreResult<usize> {
        self.with_lock(|| {
            let mut shares = self.load()?;
            let superseded = deactivate(&mut shares, &share.session_ref);
            shares.push(share);
            // Nothing changes on disk unless the whole list is written
            self.persist(&shares)?;
            Ok(superseded)
        })
    }
}
