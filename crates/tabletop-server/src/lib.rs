//! Tabletop share-link server.
//!
//! Lets a DM hand players a link to one tabletop session. Each session has at
//! most one active link; creating a new one retires the old.

pub mod access;
pub mod config;
pub mod routes;
pub mod share;

pub use access::{AccessControl, StaticAccessControl};
pub use config::{ConfigError, ServerConfig};
pub use routes::{AppState, router};
pub use share::{Identity, SessionRef, Share, ShareError, ShareService};
