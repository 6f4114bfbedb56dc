//! Tabletop share-link server binary.

use anyhow::Context;
use std::sync::Arc;
use tabletop_server::share::FileShareStore;
use tabletop_server::{AppState, ServerConfig, ShareService, StaticAccessControl, router};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is fine
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tabletop_server=info,tower_http=info".into()),
        )
        .init();

    let config = ServerConfig::from_env()?;

    let access = match &config.acl_file {
        Some(path) => StaticAccessControl::from_file(path)?,
        None => {
            warn!("TABLETOP_ACL_FILE not set, nobody can manage share links");
            StaticAccessControl::new()
        }
    };

    let store = FileShareStore::new(&config.data_dir)
        .with_context(|| format!("opening share store in {}", config.data_dir.display()))?;
    info!("Share store at {}", store.path().display());

    let shares = ShareService::new(Arc::new(store), Arc::new(access))
        .with_lock_timeout(config.lock_timeout);
    let app = router(AppState {
        shares: Arc::new(shares),
        public_url: config.public_url.clone(),
    });

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("binding {}", config.bind))?;
    info!("Tabletop share server listening on {}", config.bind);

    axum::serve(listener, app).await?;
    Ok(())
}
