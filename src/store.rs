pub mod firebase;
pub mod memory;

pub use firebase::FirebaseStore;
pub use memory::MemoryStore;

use std::sync::Arc;

use chrono::NaiveDate;

use crate::config::{StoreBackend, StoreCredentials};
use crate::model::game::{GamePatch, GameRecord, StoredGame};
use crate::model::sync_log::SyncSummary;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The record disappeared between the read and the write.
    #[error("game {0} no longer exists")]
    NotFound(String),
    #[error("store request failed: {0}")]
    Transport(String),
    #[error("store returned status {0}")]
    Status(u16),
    #[error("store data could not be decoded: {0}")]
    Decode(String),
}

/// A stored record that exists but does not parse as a game.
#[derive(Debug, Clone, PartialEq)]
pub struct UnreadableGame {
    pub key: String,
    /// `(opponent, date)` when those two fields could still be read.
    pub natural_key: Option<(String, NaiveDate)>,
    pub reason: String,
}

/// Result of listing the `games` collection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GameListing {
    pub games: Vec<StoredGame>,
    pub unreadable: Vec<UnreadableGame>,
}

impl From<Vec<StoredGame>> for GameListing {
    fn from(games: Vec<StoredGame>) -> Self {
        Self { games, unreadable: Vec::new() }
    }
}

/// Point operations on the `games` and `syncLogs` collections.
pub trait GameStore {
    /// Every stored game with its key, in no particular order. Records that
    /// do not parse are reported in `unreadable` rather than dropped.
    fn list_games(&self) -> Result<GameListing, StoreError>;

    /// Merge `patch` into the game at `key`.
    fn update_game(&self, key: &str, patch: &GamePatch) -> Result<(), StoreError>;

    /// Create a game and return its new key.
    fn insert_game(&self, record: &GameRecord) -> Result<String, StoreError>;

    fn append_log(&self, entry: &SyncSummary) -> Result<(), StoreError>;

    /// Up to `limit` log entries, newest first.
    fn recent_logs(&self, limit: usize) -> Result<Vec<SyncSummary>, StoreError>;
}

/// Store handle shared between the trigger surfaces and blocking sync tasks.
pub type SharedStore = Arc<dyn GameStore + Send + Sync>;

impl<T: GameStore + ?Sized> GameStore for Arc<T> {
    fn list_games(&self) -> Result<GameListing, StoreError> {
        (**self).list_games()
    }

    fn update_game(&self, key: &str, patch: &GamePatch) -> Result<(), StoreError> {
        (**self).update_game(key, patch)
    }

    fn insert_game(&self, record: &GameRecord) -> Result<String, StoreError> {
        (**self).insert_game(record)
    }

    fn append_log(&self, entry: &SyncSummary) -> Result<(), StoreError> {
        (**self).append_log(entry)
    }

    fn recent_logs(&self, limit: usize) -> Result<Vec<SyncSummary>, StoreError> {
        (**self).recent_logs(limit)
    }
}

/// Open the backend named by the credentials.
pub fn open_store(credentials: &StoreCredentials) -> Result<SharedStore, StoreError> {
    let store: SharedStore = match credentials.backend {
        StoreBackend::Firebase => Arc::new(FirebaseStore::from_credentials(credentials)?),
        StoreBackend::Memory => Arc::new(MemoryStore::new()),
    };
    Ok(store)
}
