use std::collections::BTreeMap;
use std::sync::Mutex;

use crate::model::game::{GamePatch, GameRecord, StoredGame};
use crate::model::sync_log::SyncSummary;
use crate::store::{GameListing, GameStore, StoreError};

#[derive(Debug, Default)]
struct Inner {
    games: BTreeMap<String, GameRecord>,
    logs: Vec<SyncSummary>,
    next_id: u64,
}

/// In-process store with the same semantics as the Firebase one. Keys are
/// `g1`, `g2`, ...
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a store with existing games.
    pub fn with_games<I>(games: I) -> Self
    where
        I: IntoIterator<Item = GameRecord>,
    {
        let store = Self::new();
        for game in games {
            // Memory inserts cannot fail.
            let _ = store.insert_game(&game);
        }
        store
    }

    pub fn get(&self, key: &str) -> Option<GameRecord> {
        self.lock().games.get(key).cloned()
    }

    pub fn remove(&self, key: &str) -> Option<GameRecord> {
        self.lock().games.remove(key)
    }

    pub fn games(&self) -> Vec<StoredGame> {
        self.lock()
            .games
            .iter()
            .map(|(key, record)| StoredGame { key: key.clone(), record: record.clone() })
            .collect()
    }

    pub fn logs(&self) -> Vec<SyncSummary> {
        self.lock().logs.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // A panic while holding the lock leaves plain data behind; keep using it.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl GameStore for MemoryStore {
    fn list_games(&self) -> Result<GameListing, StoreError> {
        Ok(self.games().into())
    }

    fn update_game(&self, key: &str, patch: &GamePatch) -> Result<(), StoreError> {
        let mut inner = self.lock();
        let record = inner.games.get_mut(key).ok_or_else(|| StoreError::NotFound(key.to_string()))?;
        record.apply(patch);
        Ok(())
    }

    fn insert_game(&self, record: &GameRecord) -> Result<String, StoreError> {
        let mut inner = self.lock();
        inner.next_id += 1;
        let key = format!("g{}", inner.next_id);
        inner.games.insert(key.clone(), record.clone());
        Ok(key)
    }

    fn append_log(&self, entry: &SyncSummary) -> Result<(), StoreError> {
        self.lock().logs.push(entry.clone());
        Ok(())
    }

    fn recent_logs(&self, limit: usize) -> Result<Vec<SyncSummary>, StoreError> {
        Ok(self.lock().logs.iter().rev().take(limit).cloned().collect())
    }
}
