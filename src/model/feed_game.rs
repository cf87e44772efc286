use chrono::NaiveDate;

use crate::model::game::FinalScore;

/// A schedule entry after normalization, ready for the diff engine.
#[derive(Clone, Debug, PartialEq)]
pub struct FeedGame {
    pub espn_game_id: String,
    pub date: NaiveDate,
    /// Local kickoff such as `"2:30 PM"`, or `"TBD"`.
    pub time: String,
    pub opponent: String,
    pub is_home: bool,
    pub location: String,
    /// Broadcaster names, or `"TBD"`.
    pub tv_network: String,
    pub final_score: Option<FinalScore>,
    pub is_bowl_game: bool,
    pub bowl_name: Option<String>,
}

impl FeedGame {
    pub fn natural_key(&self) -> (String, NaiveDate) {
        (self.opponent.clone(), self.date)
    }

    pub fn is_completed(&self) -> bool {
        self.final_score.is_some()
    }
}
