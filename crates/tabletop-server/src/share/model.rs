//! Share records and the identities that use them.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Random bytes behind a share token.
const SHARE_TOKEN_BYTES: usize = 32;

/// Identifies one tabletop session on the server.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionRef {
    pub campaign_id: String,
    pub vtt_id: String,
}

impl SessionRef {
    pub fn new(campaign_id: impl Into<String>, vtt_id: impl Into<String>) -> Self {
        Self {
            campaign_id: campaign_id.into(),
            vtt_id: vtt_id.into(),
        }
    }
}

impl fmt::Display for SessionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.campaign_id, self.vtt_id)
    }
}

/// A player-facing link to one session. The token is the capability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Share {
    pub id: Uuid,
    pub share_token: String,
    pub session_ref: SessionRef,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub is_active: bool,
}

impl Share {
    /// A new active share with a fresh token.
    pub fn new(session_ref: SessionRef, created_by: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            share_token: generate_share_token(),
            session_ref,
            created_by: created_by.into(),
            created_at: Utc::now(),
            is_active: true,
        }
    }
}

/// URL-safe token from the OS-seeded thread RNG.
pub fn generate_share_token() -> String {
    let mut bytes = [0u8; SHARE_TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Who is asking to change a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    /// An authenticated user, checked against access control.
    Dm(String),
    /// Anyone holding a share token.
    Player { share_token: String },
}
