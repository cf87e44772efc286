use std::sync::Arc;

use tracing::error;
use tracing_subscriber::EnvFilter;

use tailgate_schedule_sync::config::{ConfigError, SyncConfig};
use tailgate_schedule_sync::reconcile::LiveReconciler;
use tailgate_schedule_sync::server::{self, ServerState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .try_init();

    let config = SyncConfig::from_env().inspect_err(|e| error!(error = %e, "Invalid configuration"))?;
    let auth_token = config.auth_token.clone().ok_or(ConfigError::Missing("SYNC_AUTH_TOKEN"))?;
    let reconciler = Arc::new(LiveReconciler::from_config(&config)?);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    server::serve(listener, ServerState::new(reconciler, auth_token)).await?;
    Ok(())
}
