//! Single-active share links for tabletop sessions.

mod model;
mod service;
mod store;

pub use model::{Identity, SessionRef, Share, generate_share_token};
pub use service::{DEFAULT_LOCK_TIMEOUT, ShareError, ShareResult, ShareService};
pub use store::{FileShareStore, MemoryShareStore, ShareStore, StoreError, StoreResult};
