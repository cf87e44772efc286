use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of one reconciliation run. Appended to `syncLogs` as-is and
/// returned by the manual trigger.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SyncSummary {
    pub updated: u32,
    pub added: u32,
    #[serde(default)]
    pub errors: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

impl SyncSummary {
    pub fn new(timestamp: DateTime<Utc>) -> Self {
        Self { updated: 0, added: 0, errors: Vec::new(), timestamp }
    }
}
