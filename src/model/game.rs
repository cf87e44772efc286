use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Clock string used by the feed and the store when kickoff or TV is unknown.
pub const TBD: &str = "TBD";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    Unplanned,
    Planned,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameResult {
    #[serde(rename = "W")]
    Win,
    #[serde(rename = "L")]
    Loss,
    #[serde(rename = "T")]
    Tie,
}

impl GameResult {
    /// Result from the tracked team's point of view.
    pub fn from_points(ours: u32, theirs: u32) -> Self {
        match ours.cmp(&theirs) {
            std::cmp::Ordering::Greater => GameResult::Win,
            std::cmp::Ordering::Less => GameResult::Loss,
            std::cmp::Ordering::Equal => GameResult::Tie,
        }
    }
}

/// Final score of a completed game, in home/away orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FinalScore {
    pub home_score: u32,
    pub away_score: u32,
    pub result: GameResult,
}

/// One game as persisted under `games/<key>`.
///
/// Always written in camelCase. Reading goes through a private legacy shape so
/// records touched by older snake_case writers still load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "LegacyGameFields")]
pub struct GameRecord {
    pub date: NaiveDate,
    pub time: String,
    pub opponent: String,
    pub location: String,
    pub is_home: bool,
    pub tv_network: String,
    pub status: GameStatus,
    pub is_bowl_game: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bowl_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub home_score: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub away_score: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<GameResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub espn_game_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_attendance: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_synced_at: Option<DateTime<Utc>>,
}

/// Raw stored shape. Both spellings of a field may be present at once (some
/// scripts wrote `home_score` and `homeScore` side by side); camelCase wins.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyGameFields {
    date: NaiveDate,
    #[serde(default)]
    time: Option<String>,
    opponent: String,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    is_home: Option<bool>,
    #[serde(default, rename = "is_home")]
    is_home_legacy: Option<bool>,
    #[serde(default)]
    tv_network: Option<String>,
    #[serde(default, rename = "tv_network")]
    tv_network_legacy: Option<String>,
    #[serde(default, deserialize_with = "lenient_status")]
    status: Option<GameStatus>,
    #[serde(default)]
    is_bowl_game: Option<bool>,
    #[serde(default, rename = "is_bowl_game")]
    is_bowl_game_legacy: Option<bool>,
    #[serde(default)]
    bowl_name: Option<String>,
    #[serde(default, rename = "bowl_name")]
    bowl_name_legacy: Option<String>,
    #[serde(default, deserialize_with = "lenient_score")]
    home_score: Option<u32>,
    #[serde(default, rename = "home_score", deserialize_with = "lenient_score")]
    home_score_legacy: Option<u32>,
    #[serde(default, deserialize_with = "lenient_score")]
    away_score: Option<u32>,
    #[serde(default, rename = "away_score", deserialize_with = "lenient_score")]
    away_score_legacy: Option<u32>,
    #[serde(default)]
    result: Option<GameResult>,
    #[serde(default)]
    espn_game_id: Option<String>,
    #[serde(default, rename = "espn_game_id")]
    espn_game_id_legacy: Option<String>,
    #[serde(default, deserialize_with = "lenient_score")]
    expected_attendance: Option<u32>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    last_synced_at: Option<DateTime<Utc>>,
}

impl From<LegacyGameFields> for GameRecord {
    fn from(raw: LegacyGameFields) -> Self {
        GameRecord {
            date: raw.date,
            time: raw.time.unwrap_or_else(tbd),
            opponent: raw.opponent,
            location: raw.location.unwrap_or_default(),
            is_home: raw.is_home.or(raw.is_home_legacy).unwrap_or(false),
            tv_network: raw.tv_network.or(raw.tv_network_legacy).unwrap_or_else(tbd),
            status: raw.status.unwrap_or(GameStatus::Unplanned),
            is_bowl_game: raw.is_bowl_game.or(raw.is_bowl_game_legacy).unwrap_or(false),
            bowl_name: raw.bowl_name.or(raw.bowl_name_legacy),
            home_score: raw.home_score.or(raw.home_score_legacy),
            away_score: raw.away_score.or(raw.away_score_legacy),
            result: raw.result,
            espn_game_id: raw.espn_game_id.or(raw.espn_game_id_legacy),
            expected_attendance: raw.expected_attendance,
            created_at: raw.created_at,
            updated_at: raw.updated_at,
            last_synced_at: raw.last_synced_at,
        }
    }
}

fn tbd() -> String {
    TBD.to_string()
}

/// Older writers used `scheduled`, `in-progress` and `final`. Anything that is
/// not finished or planned reads as unplanned.
fn lenient_status<'de, D>(deserializer: D) -> Result<Option<GameStatus>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.map(|s| match s.trim().to_ascii_lowercase().as_str() {
        "completed" | "final" => GameStatus::Completed,
        "planned" => GameStatus::Planned,
        _ => GameStatus::Unplanned,
    }))
}

fn lenient_score<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
        Other(serde_json::Value),
    }
    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Number(v)) if v.is_finite() && v >= 0.0 => Some(v as u32),
        Some(Raw::Text(s)) => s.trim().parse::<u32>().ok(),
        _ => None,
    })
}

impl GameRecord {
    /// Natural key used to match feed entries against stored games.
    pub fn natural_key(&self) -> (String, NaiveDate) {
        (self.opponent.clone(), self.date)
    }

    pub fn is_completed(&self) -> bool {
        self.status == GameStatus::Completed
    }

    /// Stored final score; `None` unless the game is completed and fully scored.
    pub fn final_score(&self) -> Option<FinalScore> {
        if !self.is_completed() {
            return None;
        }
        match (self.home_score, self.away_score, self.result) {
            (Some(home_score), Some(away_score), Some(result)) => Some(FinalScore { home_score, away_score, result }),
            _ => None,
        }
    }

    /// Merge a partial update into this record the same way the store does.
    pub fn apply(&mut self, patch: &GamePatch) {
        if let Some(time) = &patch.time {
            self.time = time.clone();
        }
        if let Some(tv) = &patch.tv_network {
            self.tv_network = tv.clone();
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(home) = patch.home_score {
            self.home_score = Some(home);
        }
        if let Some(away) = patch.away_score {
            self.away_score = Some(away);
        }
        if let Some(result) = patch.result {
            self.result = Some(result);
        }
        if let Some(ts) = patch.updated_at {
            self.updated_at = Some(ts);
        }
        if let Some(ts) = patch.last_synced_at {
            self.last_synced_at = Some(ts);
        }
    }
}

/// Partial update for a stored game. Only the `Some` fields are written.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GamePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tv_network: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<GameStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home_score: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub away_score: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<GameResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_synced_at: Option<DateTime<Utc>>,
}

impl GamePatch {
    /// True when no game field is staged. Timestamps alone don't count.
    pub fn is_empty(&self) -> bool {
        self.time.is_none()
            && self.tv_network.is_none()
            && self.status.is_none()
            && self.home_score.is_none()
            && self.away_score.is_none()
            && self.result.is_none()
    }

    pub fn set_final_score(&mut self, score: FinalScore) {
        self.home_score = Some(score.home_score);
        self.away_score = Some(score.away_score);
        self.result = Some(score.result);
    }

    /// Names of the staged fields, for logging.
    pub fn changed_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.time.is_some() {
            fields.push("time");
        }
        if self.tv_network.is_some() {
            fields.push("tvNetwork");
        }
        if self.status.is_some() {
            fields.push("status");
        }
        if self.home_score.is_some() || self.away_score.is_some() || self.result.is_some() {
            fields.push("score");
        }
        fields
    }
}

/// A stored game together with its storage-assigned key.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredGame {
    pub key: String,
    pub record: GameRecord,
}
