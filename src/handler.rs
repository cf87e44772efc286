use std::sync::Arc;

use lambda_runtime::{Error, LambdaEvent};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};

use crate::model::sync_log::SyncSummary;
use crate::reconcile::LiveReconciler;
use crate::trigger::{Trigger, TriggerOutcome, fire};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    /// Plain scheduler events without a payload count as the daily run.
    #[serde(default = "default_trigger")]
    pub trigger: Trigger,
}

fn default_trigger() -> Trigger {
    Trigger::Daily
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<SyncSummary>,
}

impl Response {
    pub fn from_outcome(trigger: Trigger, outcome: TriggerOutcome) -> Self {
        match outcome {
            TriggerOutcome::Ran(summary) => Response {
                message: format!(
                    "{:?} sync: {} updated, {} added, {} errors",
                    trigger,
                    summary.updated,
                    summary.added,
                    summary.errors.len()
                ),
                summary: Some(summary),
            },
            TriggerOutcome::Skipped(message) => Response { message, summary: None },
        }
    }
}

#[instrument(skip(event, reconciler))]
pub async fn handler(event: LambdaEvent<Request>, reconciler: Arc<LiveReconciler>) -> Result<Response, Error> {
    let trigger = event.payload.trigger;

    // ureq is blocking; keep it off the runtime threads.
    let task = tokio::task::spawn_blocking(move || fire(trigger, reconciler.as_ref(), chrono::Utc::now()));
    match task.await {
        Ok(outcome) => {
            let response = Response::from_outcome(trigger, outcome);
            info!(message = %response.message, "Trigger handled");
            Ok(response)
        }
        Err(e) => {
            let message = format!("Sync task join error: {}", e);
            error!(error = %e, "Sync task failed");
            Ok(Response { message, summary: None })
        }
    }
}
