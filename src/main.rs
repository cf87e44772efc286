use std::sync::Arc;

use lambda_runtime::{Error, LambdaEvent, service_fn};
use tracing::{error, info};

use tailgate_schedule_sync::config::SyncConfig;
use tailgate_schedule_sync::handler::{Request, handler};
use tailgate_schedule_sync::reconcile::LiveReconciler;

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Initialize structured logging with tracing
    let _ = tracing_subscriber::fmt()
        .json()
        .with_max_level(tracing::Level::INFO)
        .with_current_span(false)
        .with_target(false)
        .with_ansi(false)
        .without_time()
        .try_init();

    let config = SyncConfig::from_env().inspect_err(|e| error!(error = %e, "Invalid configuration"))?;
    let reconciler = Arc::new(LiveReconciler::from_config(&config)?);
    info!(team_id = %config.team_id, time_zone = %config.time_zone, "Schedule sync initialized");

    lambda_runtime::run(service_fn(move |event: LambdaEvent<Request>| {
        let reconciler = Arc::clone(&reconciler);
        async move { handler(event, reconciler).await }
    }))
    .await
}
