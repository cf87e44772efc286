use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;
use tracing::{error, info, info_span, instrument};

use crate::config::SyncConfig;
use crate::model::feed_game::FeedGame;
use crate::model::game::{FinalScore, GameResult, TBD};
use crate::model::schedule::{Competition, Competitor, Event, ScheduleDocument};

#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("ESPN request failed: {0}")]
    Transport(String),
    #[error("ESPN API error: {0}")]
    Status(u16),
    #[error("ESPN response could not be decoded: {0}")]
    Decode(String),
}

/// Source of the authoritative season schedule.
pub trait ScheduleFeed {
    fn fetch_schedule(&self, season: i32) -> Result<Vec<FeedGame>, FeedError>;
}

/// Client for the ESPN team schedule endpoint.
#[derive(Debug, Clone)]
pub struct EspnFeed {
    agent: ureq::Agent,
    base_url: String,
    team_id: String,
    time_zone: Tz,
}

impl EspnFeed {
    pub fn new(base_url: impl Into<String>, team_id: impl Into<String>, time_zone: Tz) -> Self {
        Self {
            agent: ureq::Agent::new_with_defaults(),
            base_url: base_url.into(),
            team_id: team_id.into(),
            time_zone,
        }
    }

    pub fn from_config(config: &SyncConfig) -> Self {
        Self::new(config.feed_base_url.clone(), config.team_id.clone(), config.time_zone)
    }

    pub fn schedule_url(&self) -> String {
        format!("{}/teams/{}/schedule", self.base_url, self.team_id)
    }

    /// Parse a raw schedule response body (no network).
    pub fn parse_schedule(&self, body: &str) -> Result<Vec<FeedGame>, FeedError> {
        let doc = deserialize_schedule(body).map_err(|e| FeedError::Decode(e.to_string()))?;
        Ok(normalize_events(&doc, &self.team_id, self.time_zone).collect())
    }
}

impl ScheduleFeed for EspnFeed {
    #[instrument(level = "info", skip(self), fields(team_id = %self.team_id))]
    fn fetch_schedule(&self, season: i32) -> Result<Vec<FeedGame>, FeedError> {
        let url = self.schedule_url();
        let response_result = {
            let _span = info_span!("espn_fetch", url = %url, season).entered();
            self.agent.get(&url).query("season", season.to_string()).call()
        };
        let response = match response_result {
            Ok(response) => response,
            Err(ureq::Error::StatusCode(code)) => {
                error!(status = code, url = %url, "ESPN returned a non-success status");
                return Err(FeedError::Status(code));
            }
            Err(e) => {
                error!(error = %e, url = %url, "ESPN request failed");
                return Err(FeedError::Transport(e.to_string()));
            }
        };

        let mut body_reader = response.into_body();
        let body = body_reader.read_to_string().map_err(|e| {
            error!(error = %e, "Failed to read ESPN response body");
            FeedError::Transport(e.to_string())
        })?;
        let games = self.parse_schedule(&body)?;
        info!(games = games.len(), "Fetched ESPN schedule");
        Ok(games)
    }
}

#[instrument(level = "info", skip(body), fields(bytes = body.len()))]
fn deserialize_schedule(body: &str) -> Result<ScheduleDocument, serde_json::Error> {
    serde_json::from_str::<ScheduleDocument>(body)
}

/// Lazily turn raw events into [`FeedGame`]s. Events without a competition,
/// without the tracked team, or without an opponent are dropped.
pub fn normalize_events<'a>(
    doc: &'a ScheduleDocument,
    team_id: &'a str,
    time_zone: Tz,
) -> impl Iterator<Item = FeedGame> + 'a {
    doc.events.iter().filter_map(move |event| normalize_event(event, team_id, time_zone))
}

fn normalize_event(event: &Event, team_id: &str, time_zone: Tz) -> Option<FeedGame> {
    let competition = event.competitions.first()?;
    let ours = competition.competitors.iter().find(|c| c.team.id == team_id)?;
    let theirs = competition.competitors.iter().find(|c| c.team.id != team_id)?;
    let opponent = theirs
        .team
        .short_display_name
        .as_deref()
        .or(theirs.team.display_name.as_deref())
        .filter(|s| !s.trim().is_empty())?
        .trim()
        .to_string();

    let (start, has_time) = competition.date.as_deref().or(event.date.as_deref()).and_then(parse_kickoff)?;
    let time_valid = has_time && competition.time_valid.or(event.time_valid).unwrap_or(true);
    let (date, time) = if time_valid {
        let local = start.with_timezone(&time_zone);
        (local.date_naive(), local.format("%-I:%M %p").to_string())
    } else {
        // Unannounced kickoffs are published as midnight Eastern; the UTC date is the game day.
        (start.date_naive(), TBD.to_string())
    };

    let is_home = ours.home_away.as_deref().map(|s| s.eq_ignore_ascii_case("home")).unwrap_or(false);
    let completed = competition
        .status
        .as_ref()
        .and_then(|s| s.type_field.as_ref())
        .map(|t| t.completed)
        .unwrap_or(false);
    let score = completed.then(|| final_score(ours, theirs, is_home));

    let (is_bowl_game, bowl_name) = match post_season_name(event, competition, date) {
        Some(name) => (true, Some(name)),
        None => (false, None),
    };

    Some(FeedGame {
        espn_game_id: event.id.clone(),
        date,
        time,
        opponent,
        is_home,
        location: venue_label(competition),
        tv_network: broadcaster(competition),
        final_score: score,
        is_bowl_game,
        bowl_name,
    })
}

/// Kickoff instant, and whether the feed gave a clock time at all.
fn parse_kickoff(raw: &str) -> Option<(DateTime<Utc>, bool)> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some((dt.with_timezone(&Utc), true));
    }
    // ESPN usually omits seconds: 2025-10-11T19:30Z
    let s = raw.strip_suffix('Z').unwrap_or(raw);
    for pat in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, pat) {
            return Some((naive.and_utc(), true));
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| (naive.and_utc(), false))
}

fn final_score(ours: &Competitor, theirs: &Competitor, is_home: bool) -> FinalScore {
    let our_points = ours.score.as_ref().map(|s| s.points()).unwrap_or(0);
    let their_points = theirs.score.as_ref().map(|s| s.points()).unwrap_or(0);
    let (home_score, away_score) = if is_home { (our_points, their_points) } else { (their_points, our_points) };
    FinalScore { home_score, away_score, result: GameResult::from_points(our_points, their_points) }
}

fn broadcaster(competition: &Competition) -> String {
    let Some(broadcast) = competition.broadcasts.first() else {
        return TBD.to_string();
    };
    let names: Vec<&str> = broadcast.names.iter().map(|n| n.trim()).filter(|n| !n.is_empty()).collect();
    if !names.is_empty() {
        return names.join(", ");
    }
    broadcast
        .media
        .as_ref()
        .and_then(|m| m.short_name.as_deref())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| TBD.to_string())
}

fn venue_label(competition: &Competition) -> String {
    let Some(venue) = &competition.venue else {
        return String::new();
    };
    let mut label = venue.full_name.clone().unwrap_or_default();
    if let Some(address) = &venue.address {
        if let (Some(city), Some(state)) = (&address.city, &address.state) {
            label.push_str(&format!(", {}, {}", city, state));
        }
    }
    label
}

/// Name of the bowl or playoff game when the event is post-season: played in
/// November through January with "bowl" or "playoff" in its name or headline.
fn post_season_name(event: &Event, competition: &Competition, date: NaiveDate) -> Option<String> {
    if !matches!(date.month(), 11 | 12 | 1) {
        return None;
    }
    let is_post_season = |s: &str| {
        let lower = s.to_lowercase();
        lower.contains("bowl") || lower.contains("playoff")
    };
    let headline = competition.notes.first().and_then(|n| n.headline.as_deref());
    if let Some(headline) = headline.filter(|&h| is_post_season(h)) {
        return Some(headline.to_string());
    }
    event.name.as_deref().filter(|&n| is_post_season(n)).map(str::to_string)
}
