use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{error, info, info_span, warn};

use crate::config::StoreCredentials;
use crate::model::game::{GamePatch, GameRecord, StoredGame};
use crate::model::sync_log::SyncSummary;
use crate::store::{GameListing, GameStore, StoreError, UnreadableGame};

const GAMES: &str = "games";
const SYNC_LOGS: &str = "syncLogs";

/// Firebase Realtime Database accessed through its REST API.
#[derive(Debug, Clone)]
pub struct FirebaseStore {
    agent: ureq::Agent,
    database_url: String,
    auth: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PushResponse {
    name: String,
}

impl FirebaseStore {
    pub fn new(database_url: impl Into<String>, auth: Option<String>) -> Self {
        let database_url: String = database_url.into();
        Self {
            agent: ureq::Agent::new_with_defaults(),
            database_url: database_url.trim_end_matches('/').to_string(),
            auth,
        }
    }

    pub fn from_credentials(credentials: &StoreCredentials) -> Result<Self, StoreError> {
        let url = credentials
            .database_url
            .as_deref()
            .ok_or_else(|| StoreError::Transport("no Firebase database URL configured".to_string()))?;
        Ok(Self::new(url, credentials.auth.clone()))
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}.json", self.database_url, path)
    }

    fn authed<B>(&self, request: ureq::RequestBuilder<B>) -> ureq::RequestBuilder<B> {
        match &self.auth {
            Some(token) => request.query("auth", token),
            None => request,
        }
    }

    /// GET a path and decode its JSON. Firebase answers `null` for missing paths.
    fn get_json<T>(&self, path: &str, query: &[(&str, String)]) -> Result<Option<T>, StoreError>
    where
        T: serde::de::DeserializeOwned,
    {
        let url = self.url(path);
        let mut request = self.authed(self.agent.get(&url));
        for (key, value) in query {
            request = request.query(*key, value);
        }
        let response = {
            let _span = info_span!("firebase_get", path = %path).entered();
            request.call().map_err(transport_error)?
        };
        response
            .into_body()
            .read_json::<Option<T>>()
            .map_err(|e| StoreError::Decode(e.to_string()))
    }

    fn push(&self, collection: &str, value: &impl serde::Serialize) -> Result<String, StoreError> {
        let url = self.url(collection);
        let response = {
            let _span = info_span!("firebase_push", collection = %collection).entered();
            self.authed(self.agent.post(&url)).send_json(value).map_err(transport_error)?
        };
        let pushed: PushResponse = response
            .into_body()
            .read_json()
            .map_err(|e| StoreError::Decode(e.to_string()))?;
        Ok(pushed.name)
    }
}

fn transport_error(e: ureq::Error) -> StoreError {
    match e {
        ureq::Error::StatusCode(code) => StoreError::Status(code),
        other => StoreError::Transport(other.to_string()),
    }
}

/// `(opponent, date)` of a record that failed to parse as a whole.
fn partial_natural_key(value: &serde_json::Value) -> Option<(String, NaiveDate)> {
    let opponent = value.get("opponent")?.as_str()?.trim();
    let date = NaiveDate::parse_from_str(value.get("date")?.as_str()?, "%Y-%m-%d").ok()?;
    (!opponent.is_empty()).then(|| (opponent.to_string(), date))
}

impl GameStore for FirebaseStore {
    fn list_games(&self) -> Result<GameListing, StoreError> {
        let raw: BTreeMap<String, serde_json::Value> = self.get_json(GAMES, &[])?.unwrap_or_default();
        let total = raw.len();
        let mut listing = GameListing::default();
        for (key, value) in raw {
            match serde_json::from_value::<GameRecord>(value.clone()) {
                Ok(record) => listing.games.push(StoredGame { key, record }),
                Err(e) => {
                    warn!(key = %key, error = %e, "Stored game does not parse");
                    listing.unreadable.push(UnreadableGame {
                        natural_key: partial_natural_key(&value),
                        key,
                        reason: e.to_string(),
                    });
                }
            }
        }
        info!(total, parsed = listing.games.len(), unreadable = listing.unreadable.len(), "Loaded stored games");
        Ok(listing)
    }

    fn update_game(&self, key: &str, patch: &GamePatch) -> Result<(), StoreError> {
        let path = format!("{}/{}", GAMES, key);
        // PATCH on a missing path would recreate it, so check first.
        let exists: Option<serde_json::Value> = self.get_json(&path, &[("shallow", "true".to_string())])?;
        if exists.is_none() {
            return Err(StoreError::NotFound(key.to_string()));
        }
        let url = self.url(&path);
        let _span = info_span!("firebase_patch", key = %key).entered();
        match self.authed(self.agent.patch(&url)).send_json(patch) {
            Ok(_) => Ok(()),
            Err(e) => {
                error!(key = %key, error = %e, "Failed to patch game");
                Err(transport_error(e))
            }
        }
    }

    fn insert_game(&self, record: &GameRecord) -> Result<String, StoreError> {
        self.push(GAMES, record)
    }

    fn append_log(&self, entry: &SyncSummary) -> Result<(), StoreError> {
        self.push(SYNC_LOGS, entry).map(|_| ())
    }

    fn recent_logs(&self, limit: usize) -> Result<Vec<SyncSummary>, StoreError> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let query = [("orderBy", "\"$key\"".to_string()), ("limitToLast", limit.to_string())];
        let raw: BTreeMap<String, serde_json::Value> = self.get_json(SYNC_LOGS, &query)?.unwrap_or_default();
        // Push keys sort chronologically.
        Ok(raw
            .into_iter()
            .rev()
            .filter_map(|(_, value)| serde_json::from_value::<SyncSummary>(value).ok())
            .take(limit)
            .collect())
    }
}
