//! Server configuration from the environment.

use crate::share::DEFAULT_LOCK_TIMEOUT;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_BIND: &str = "0.0.0.0:3030";
const DEFAULT_DATA_DIR: &str = "data";
const DEFAULT_PUBLIC_URL: &str = "http://localhost:3030";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
    #[error("access list: {0}")]
    Acl(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    /// Directory holding `shares.json`.
    pub data_dir: PathBuf,
    /// Base of the links handed to players.
    pub public_url: String,
    /// JSON access list of campaign owners and co-DMs.
    pub acl_file: Option<PathBuf>,
    pub lock_timeout: Duration,
}

impl ServerConfig {
    /// Read `TABLETOP_*` variables. Call `dotenvy::dotenv()` first to pick up `.env`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bind_value = lookup("TABLETOP_BIND").unwrap_or_else(|| DEFAULT_BIND.into());
        let bind = bind_value.parse().map_err(|_| ConfigError::Invalid {
            name: "TABLETOP_BIND",
            value: bind_value.clone(),
        })?;

        let lock_timeout = match lookup("TABLETOP_LOCK_TIMEOUT_MS") {
            Some(value) => value
                .parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|_| ConfigError::Invalid {
                    name: "TABLETOP_LOCK_TIMEOUT_MS",
                    value,
                })?,
            None => DEFAULT_LOCK_TIMEOUT,
        };

        let public_url = lookup("TABLETOP_PUBLIC_URL")
            .unwrap_or_else(|| DEFAULT_PUBLIC_URL.into())
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            bind,
            data_dir: lookup("TABLETOP_DATA_DIR")
                .unwrap_or_else(|| DEFAULT_DATA_DIR.into())
                .into(),
            public_url,
            acl_file: lookup("TABLETOP_ACL_FILE").map(PathBuf::from),
            lock_timeout,
        })
    }
}
