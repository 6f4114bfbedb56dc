//! Share-link operations.
//!
//! At most one share per session is active. Creation and revocation of a
//! session's shares run under that session's lock, so two concurrent creations
//! can't both leave an active share behind.

use super::model::{Identity, SessionRef, Share};
use super::store::{ShareStore, StoreError};
use crate::access::AccessControl;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info, warn};

/// How long a request waits for a session's lock by default.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// Share operation errors.
#[derive(Debug, Error)]
pub enum ShareError {
    #[error("permission denied")]
    PermissionDenied,
    #[error("session is busy, try again")]
    Conflict,
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

pub type ShareResult<T> = Result<T, ShareError>;

pub struct ShareService {
    store: Arc<dyn ShareStore>,
    access: Arc<dyn AccessControl>,
    locks: DashMap<SessionRef, Arc<Mutex<()>>>,
    lock_timeout: Duration,
}

impl ShareService {
    pub fn new(store: Arc<dyn ShareStore>, access: Arc<dyn AccessControl>) -> Self {
        Self {
            store,
            access,
            locks: DashMap::new(),
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        }
    }

    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    /// Fail unless `user_id` may manage the session.
    pub fn ensure_can_manage(&self, session_ref: &SessionRef, user_id: &str) -> ShareResult<()> {
        if self.access.can_manage(session_ref, user_id) {
            Ok(())
        } else {
            warn!(%session_ref, user_id, "share management denied");
            Err(ShareError::PermissionDenied)
        }
    }

    async fn lock(&self, session_ref: &SessionRef) -> ShareResult<SessionGuard<'_>> {
        // Clone the Arc out so the map shard isn't held across the await
        let lock = self
            .locks
            .entry(session_ref.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        match tokio::time::timeout(self.lock_timeout, lock.lock_owned()).await {
            Ok(guard) => Ok(SessionGuard {
                locks: &self.locks,
                session_ref: session_ref.clone(),
                guard: Some(guard),
            }),
            Err(_) => {
                warn!(%session_ref, "timed out waiting for share lock");
                release_idle(&self.locks, session_ref);
                Err(ShareError::Conflict)
            }
        }
    }

    /// Replace the session's active share with a new one.
    ///
    /// The old share stays active if the new one can't be stored.
    pub async fn create_share(&self, session_ref: &SessionRef, requester: &str) -> ShareResult<Share> {
        self.ensure_can_manage(session_ref, requester)?;
        let _guard = self.lock(session_ref).await?;

        let share = Share::new(session_ref.clone(), requester);
        let superseded = self.store.replace_active(share.clone())?;

        info!(%session_ref, created_by = requester, superseded, "share created");
        Ok(share)
    }

    pub fn find_active_share(&self, session_ref: &SessionRef) -> ShareResult<Option<Share>> {
        Ok(self.store.find_active(session_ref)?)
    }

    /// Revoke every share of the session. Revoking nothing is not an error.
    pub async fn deactivate_shares(&self, session_ref: &SessionRef, requester: &str) -> ShareResult<()> {
        self.ensure_can_manage(session_ref, requester)?;
        let _guard = self.lock(session_ref).await?;

        let revoked = self.store.deactivate_all(session_ref)?;
        info!(%session_ref, revoked, "shares deactivated");
        Ok(())
    }

    /// The active share behind a token. Unknown and revoked tokens resolve to `None`.
    pub fn resolve_share(&self, share_token: &str) -> ShareResult<Option<Share>> {
        let share = self.store.find_by_token(share_token)?;
        Ok(share.filter(|s| s.is_active))
    }

    /// Whether `identity` may write to the session.
    pub fn authorize_write(&self, session_ref: &SessionRef, identity: &Identity) -> ShareResult<()> {
        match identity {
            Identity::Dm(user_id) => self.ensure_can_manage(session_ref, user_id),
            Identity::Player { share_token } => match self.resolve_share(share_token)? {
                Some(share) if &share.session_ref == session_ref => Ok(()),
                _ => {
                    debug!(%session_ref, "share token does not grant this session");
                    Err(ShareError::PermissionDenied)
                }
            },
        }
    }
}

/// Holds a session's lock. Dropping it forgets the lock once nobody else wants it.
struct SessionGuard<'a> {
    locks: &'a DashMap<SessionRef, Arc<Mutex<()>>>,
    session_ref: SessionRef,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for SessionGuard<'_> {
    fn drop(&mut self) {
        // The owned guard holds its own reference to the mutex
        self.guard.take();
        release_idle(self.locks, &self.session_ref);
    }
}

/// Remove the session's lock if only the map still refers to it.
fn release_idle(locks: &DashMap<SessionRef, Arc<Mutex<()>>>, session_ref: &SessionRef) {
    locks.remove_if(session_ref, |_, lock| Arc::strong_count(lock) == 1);
}
