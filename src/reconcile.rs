use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::panic::{self, AssertUnwindSafe};

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use chrono_tz::Tz;
use tracing::{error, info, instrument, warn};

use crate::config::SyncConfig;
use crate::espn::{EspnFeed, ScheduleFeed};
use crate::model::feed_game::FeedGame;
use crate::model::game::{GamePatch, GameRecord, GameStatus, StoredGame, TBD};
use crate::model::sync_log::SyncSummary;
use crate::store::{self, GameListing, GameStore, SharedStore, StoreError};

/// Diffs the feed's schedule against the stored games and writes the
/// minimal set of changes.
#[derive(Debug)]
pub struct Reconciler<F, S> {
    feed: F,
    store: S,
    time_zone: Tz,
    season: Option<i32>,
}

/// Reconciler wired to ESPN and the configured store backend.
pub type LiveReconciler = Reconciler<EspnFeed, SharedStore>;

impl LiveReconciler {
    pub fn from_config(config: &SyncConfig) -> Result<Self, StoreError> {
        let store = store::open_store(&config.store)?;
        Ok(Reconciler::new(EspnFeed::from_config(config), store, config.time_zone).with_season(config.season))
    }
}

impl<F: ScheduleFeed, S: GameStore> Reconciler<F, S> {
    pub fn new(feed: F, store: S, time_zone: Tz) -> Self {
        Self { feed, store, time_zone, season: None }
    }

    /// Pin the season instead of following the calendar.
    pub fn with_season(mut self, season: Option<i32>) -> Self {
        self.season = season;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn time_zone(&self) -> Tz {
        self.time_zone
    }

    pub fn season_for(&self, now: DateTime<Utc>) -> i32 {
        self.season.unwrap_or_else(|| now.with_timezone(&self.time_zone).year())
    }

    /// One reconciliation run. Never fails: every problem ends up in
    /// `errors` and the summary is appended to the sync log.
    #[instrument(level = "info", skip(self))]
    pub fn run(&self, now: DateTime<Utc>) -> SyncSummary {
        let mut summary = SyncSummary::new(now);

        // A panic mid-run still produces a summary and a log entry.
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.reconcile(now, &mut summary)));
        if let Err(payload) = outcome {
            let message = panic_message(payload.as_ref());
            error!(panic = %message, "Reconciliation panicked");
            summary.errors.push(format!("sync run panicked: {}", message));
        }

        if let Err(e) = self.store.append_log(&summary) {
            error!(error = %e, "Failed to append sync log");
            summary.errors.push(format!("failed to write sync log: {}", e));
        }

        info!(
            updated = summary.updated,
            added = summary.added,
            errors = summary.errors.len(),
            "Reconciliation finished"
        );
        summary
    }

    fn reconcile(&self, now: DateTime<Utc>, summary: &mut SyncSummary) {
        let season = self.season_for(now);

        let feed_games = match self.feed.fetch_schedule(season) {
            Ok(games) => games,
            Err(e) => {
                error!(error = %e, season, "Schedule fetch failed; nothing to reconcile");
                summary.errors.push(e.to_string());
                return;
            }
        };
        if feed_games.is_empty() {
            return;
        }

        match self.store.list_games() {
            Ok(listing) => self.apply(&feed_games, listing, now, summary),
            Err(e) => {
                error!(error = %e, "Failed to load stored games");
                summary.errors.push(format!("failed to load games: {}", e));
            }
        }
    }

    fn apply(&self, feed_games: &[FeedGame], listing: GameListing, now: DateTime<Utc>, summary: &mut SyncSummary) {
        // Keys held by records we cannot read are still taken.
        let mut occupied = HashSet::new();
        for game in &listing.unreadable {
            error!(key = %game.key, reason = %game.reason, "Stored game could not be read");
            summary.errors.push(format!("stored game {} could not be read: {}", game.key, game.reason));
            if let Some(key) = &game.natural_key {
                occupied.insert(key.clone());
            }
        }
        let mut by_key = index_by_natural_key(listing.games);

        for feed_game in feed_games {
            let key = feed_game.natural_key();
            match by_key.get(&key) {
                Some(existing) => {
                    let patch = stage_changes(&existing.record, feed_game);
                    if patch.is_empty() {
                        continue;
                    }
                    let patch = GamePatch { updated_at: Some(now), last_synced_at: Some(now), ..patch };
                    match self.store.update_game(&existing.key, &patch) {
                        Ok(()) => {
                            info!(
                                key = %existing.key,
                                opponent = %feed_game.opponent,
                                date = %feed_game.date,
                                fields = ?patch.changed_fields(),
                                "Updated game"
                            );
                            summary.updated += 1;
                        }
                        Err(StoreError::NotFound(k)) => {
                            warn!(key = %k, opponent = %feed_game.opponent, "Game deleted before update; skipping");
                            summary.errors.push(format!("game {} vs {} was deleted before it could be updated", feed_game.date, feed_game.opponent));
                        }
                        Err(e) => {
                            error!(key = %existing.key, error = %e, "Failed to update game");
                            summary.errors.push(format!("failed to update {} vs {}: {}", feed_game.date, feed_game.opponent, e));
                        }
                    }
                }
                None if occupied.contains(&key) => {
                    warn!(
                        opponent = %feed_game.opponent,
                        date = %feed_game.date,
                        "Feed game matches an unreadable stored game; leaving it alone"
                    );
                }
                None if feed_game.is_bowl_game => {
                    let record = new_post_season_record(feed_game, now);
                    match self.store.insert_game(&record) {
                        Ok(new_key) => {
                            info!(
                                key = %new_key,
                                opponent = %feed_game.opponent,
                                bowl = feed_game.bowl_name.as_deref().unwrap_or(""),
                                "Added post-season game"
                            );
                            summary.added += 1;
                            by_key.insert(key, StoredGame { key: new_key, record });
                        }
                        Err(e) => {
                            error!(opponent = %feed_game.opponent, error = %e, "Failed to insert post-season game");
                            summary.errors.push(format!("failed to add {} vs {}: {}", feed_game.date, feed_game.opponent, e));
                        }
                    }
                }
                // Regular-season games are entered by hand before the season.
                None => {}
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

fn index_by_natural_key(stored: Vec<StoredGame>) -> HashMap<(String, NaiveDate), StoredGame> {
    let mut by_key = HashMap::with_capacity(stored.len());
    for game in stored {
        let key = game.record.natural_key();
        if let Some(previous) = by_key.insert(key, game) {
            warn!(key = %previous.key, opponent = %previous.record.opponent, "Duplicate stored game for the same opponent and date");
        }
    }
    by_key
}

/// Changes the feed implies for a stored game. Empty when nothing differs.
///
/// TBD values never overwrite stored data and a completed game never goes back
/// to an earlier status; only its score is corrected when the feed disagrees.
pub fn stage_changes(stored: &GameRecord, feed: &FeedGame) -> GamePatch {
    let mut patch = GamePatch::default();

    if feed.time != TBD && feed.time != stored.time {
        patch.time = Some(feed.time.clone());
    }
    if feed.tv_network != TBD && feed.tv_network != stored.tv_network {
        patch.tv_network = Some(feed.tv_network.clone());
    }
    if let Some(score) = feed.final_score {
        if !stored.is_completed() {
            patch.status = Some(GameStatus::Completed);
            patch.set_final_score(score);
        } else if stored.final_score() != Some(score) {
            patch.set_final_score(score);
        }
    }

    patch
}

/// Record for a bowl or playoff game the store has not seen yet.
pub fn new_post_season_record(feed: &FeedGame, now: DateTime<Utc>) -> GameRecord {
    GameRecord {
        date: feed.date,
        time: feed.time.clone(),
        opponent: feed.opponent.clone(),
        location: feed.location.clone(),
        is_home: feed.is_home,
        tv_network: feed.tv_network.clone(),
        status: GameStatus::Unplanned,
        is_bowl_game: true,
        bowl_name: feed.bowl_name.clone(),
        home_score: None,
        away_score: None,
        result: None,
        espn_game_id: Some(feed.espn_game_id.clone()),
        expected_attendance: Some(0),
        created_at: Some(now),
        updated_at: Some(now),
        last_synced_at: Some(now),
    }
}
