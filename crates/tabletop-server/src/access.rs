//! Who may manage a session's share links.

use crate::config::ConfigError;
use crate::share::SessionRef;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// Answers "is this user an owner or co-DM of the session's campaign?".
pub trait AccessControl: Send + Sync {
    fn can_manage(&self, session_ref: &SessionRef, user_id: &str) -> bool;
}

/// Managers of one campaign.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CampaignAccess {
    pub owner: String,
    #[serde(default)]
    pub co_dms: HashSet<String>,
}

/// Access list loaded once at startup.
///
/// The file maps campaign ids to their managers:
///
/// ```json
/// { "campaigns": { "c1": { "owner": "alice", "co_dms": ["bob"] } } }
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StaticAccessControl {
    #[serde(default)]
    campaigns: HashMap<String, CampaignAccess>,
}

impl StaticAccessControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Acl(format!("{}: {}", path.display(), e)))?;
        serde_json::from_str(&json)
            .map_err(|e| ConfigError::Acl(format!("{}: {}", path.display(), e)))
    }

    pub fn with_owner(mut self, campaign_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        self.campaigns.entry(campaign_id.into()).or_default().owner = user_id.into();
        self
    }

    pub fn with_co_dm(mut self, campaign_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        self.campaigns
            .entry(campaign_id.into())
            .or_default()
            .co_dms
            .insert(user_id.into());
        self
    }
}

impl AccessControl for StaticAccessControl {
    fn can_manage(&self, session_ref: &SessionRef, user_id: &str) -> bool {
        if user_id.is_empty() {
            return false;
        }
        self.campaigns
            .get(&session_ref.campaign_id)
            .is_some_and(|c| c.owner == user_id || c.co_dms.contains(user_id))
    }
}
