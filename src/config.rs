use std::env;

use chrono_tz::Tz;

pub const DEFAULT_FEED_BASE_URL: &str =
    "https://site.api.espn.com/apis/site/v2/sports/football/college-football";
/// ESPN id of the Texas Longhorns.
pub const DEFAULT_TEAM_ID: &str = "251";
pub const DEFAULT_TIME_ZONE: Tz = chrono_tz::America::Chicago;
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has an invalid value {value:?}: {reason}")]
    Invalid { name: &'static str, value: String, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Firebase,
    Memory,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoreCredentials {
    pub backend: StoreBackend,
    /// Realtime Database root, e.g. `https://texas-tailgaters-default-rtdb.firebaseio.com`.
    pub database_url: Option<String>,
    /// Database secret or ID token, sent as the `auth` query parameter.
    pub auth: Option<String>,
}

/// Everything a sync run needs, injected at construction time.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncConfig {
    pub feed_base_url: String,
    pub team_id: String,
    /// Season to fetch; the current local year when unset.
    pub season: Option<i32>,
    pub store: StoreCredentials,
    /// Bearer token the manual trigger expects.
    pub auth_token: Option<String>,
    pub time_zone: Tz,
    pub bind_addr: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            feed_base_url: DEFAULT_FEED_BASE_URL.to_string(),
            team_id: DEFAULT_TEAM_ID.to_string(),
            season: None,
            store: StoreCredentials { backend: StoreBackend::Memory, database_url: None, auth: None },
            auth_token: None,
            time_zone: DEFAULT_TIME_ZONE,
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
        }
    }
}

impl SyncConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable lookup. Empty values are
    /// treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let backend = match get("STORE_BACKEND").as_deref() {
            None | Some("firebase") => StoreBackend::Firebase,
            Some("memory") => StoreBackend::Memory,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: "STORE_BACKEND",
                    value: other.to_string(),
                    reason: "expected firebase or memory".to_string(),
                });
            }
        };
        let database_url = get("FIREBASE_DATABASE_URL").map(|url| url.trim_end_matches('/').to_string());
        if backend == StoreBackend::Firebase && database_url.is_none() {
            return Err(ConfigError::Missing("FIREBASE_DATABASE_URL"));
        }

        let season = match get("SEASON") {
            Some(raw) => Some(raw.parse::<i32>().map_err(|e| ConfigError::Invalid {
                name: "SEASON",
                value: raw.clone(),
                reason: e.to_string(),
            })?),
            None => None,
        };

        let time_zone = match get("SYNC_TIME_ZONE") {
            Some(raw) => raw.parse::<Tz>().map_err(|e| ConfigError::Invalid {
                name: "SYNC_TIME_ZONE",
                value: raw.clone(),
                reason: e.to_string(),
            })?,
            None => DEFAULT_TIME_ZONE,
        };

        Ok(Self {
            feed_base_url: get("FEED_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_FEED_BASE_URL.to_string()),
            team_id: get("TEAM_ID").unwrap_or_else(|| DEFAULT_TEAM_ID.to_string()),
            season,
            store: StoreCredentials { backend, database_url, auth: get("FIREBASE_AUTH") },
            auth_token: get("SYNC_AUTH_TOKEN"),
            time_zone,
            bind_addr: get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
        })
    }
}
