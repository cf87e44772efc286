use chrono::{DateTime, Datelike, NaiveDate, Timelike, Utc, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::espn::ScheduleFeed;
use crate::model::sync_log::SyncSummary;
use crate::reconcile::Reconciler;
use crate::store::GameStore;

/// First and last local hours (inclusive) of the Saturday live window.
pub const LIVE_WINDOW_HOURS: (u32, u32) = (11, 23);

/// Which schedule fired. Carried as the constant input of the scheduler rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trigger {
    /// Once a day at 06:00 local.
    Daily,
    /// Every 15 minutes on Saturdays, to pick up final scores the same day.
    Live,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TriggerOutcome {
    Ran(SyncSummary),
    Skipped(String),
}

/// True when `now` falls on a Saturday between 11:00 and 23:59 local time.
pub fn in_live_window(now: DateTime<Utc>, time_zone: Tz) -> bool {
    let local = now.with_timezone(&time_zone);
    let (first, last) = LIVE_WINDOW_HOURS;
    local.weekday() == Weekday::Sat && (first..=last).contains(&local.hour())
}

/// Whether any game dated `today` is still waiting for a final score.
pub fn has_open_game_on<S: GameStore>(store: &S, today: NaiveDate) -> bool {
    match store.list_games() {
        Ok(listing) => {
            listing.games.iter().any(|g| g.record.date == today && !g.record.is_completed())
                || listing.unreadable.iter().any(|u| u.natural_key.as_ref().is_some_and(|(_, d)| *d == today))
        }
        Err(e) => {
            // Let the run itself surface the store problem.
            warn!(error = %e, "Could not check for a game today");
            true
        }
    }
}

/// Gate a trigger and run the reconciler when it passes.
#[instrument(level = "info", skip(reconciler))]
pub fn fire<F: ScheduleFeed, S: GameStore>(
    trigger: Trigger,
    reconciler: &Reconciler<F, S>,
    now: DateTime<Utc>,
) -> TriggerOutcome {
    if trigger == Trigger::Live {
        let time_zone = reconciler.time_zone();
        if !in_live_window(now, time_zone) {
            let msg = format!("Outside game hours at {}, skipping live update.", now.with_timezone(&time_zone));
            info!("{}", msg);
            return TriggerOutcome::Skipped(msg);
        }
        let today = now.with_timezone(&time_zone).date_naive();
        if !has_open_game_on(reconciler.store(), today) {
            let msg = format!("No unfinished game on {}, skipping live update.", today);
            info!("{}", msg);
            return TriggerOutcome::Skipped(msg);
        }
    }
    TriggerOutcome::Ran(reconciler.run(now))
}
