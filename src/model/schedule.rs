use serde::{Deserialize, Serialize};

/// Top level document returned by the ESPN team schedule endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct ScheduleDocument {
    #[serde(default)]
    pub events: Vec<Event>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub time_valid: Option<bool>,
    #[serde(default)]
    pub competitions: Vec<Competition>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Competition {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub time_valid: Option<bool>,
    #[serde(default)]
    pub venue: Option<Venue>,
    #[serde(default)]
    pub competitors: Vec<Competitor>,
    #[serde(default)]
    pub broadcasts: Vec<Broadcast>,
    #[serde(default)]
    pub notes: Vec<Note>,
    #[serde(default)]
    pub status: Option<Status>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Venue {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub address: Option<Address>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Address {
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Competitor {
    #[serde(default)]
    pub home_away: Option<String>,
    pub team: CompetitorTeam,
    #[serde(default)]
    pub score: Option<Score>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompetitorTeam {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub short_display_name: Option<String>,
}

/// The schedule endpoint sends `{"value": 45.0, "displayValue": "45"}`, the
/// scoreboard endpoint sends a bare string. Anything else is noise.
#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Score {
    Text(String),
    Number(f64),
    Detailed {
        #[serde(default)]
        value: Option<f64>,
        #[serde(default, rename = "displayValue")]
        display_value: Option<String>,
    },
    Other(serde_json::Value),
}

impl Score {
    /// Points as a whole number; unparseable or negative values count as zero.
    pub fn points(&self) -> u32 {
        fn from_f64(v: f64) -> u32 {
            if v.is_finite() && v >= 0.0 { v as u32 } else { 0 }
        }
        fn from_text(s: &str) -> u32 {
            s.trim().parse::<u32>().unwrap_or(0)
        }
        match self {
            Score::Text(s) => from_text(s),
            Score::Number(v) => from_f64(*v),
            Score::Detailed { value: Some(v), .. } => from_f64(*v),
            Score::Detailed { display_value: Some(s), .. } => from_text(s),
            _ => 0,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Broadcast {
    #[serde(default)]
    pub names: Vec<String>,
    #[serde(default)]
    pub media: Option<BroadcastMedia>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BroadcastMedia {
    #[serde(default)]
    pub short_name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Note {
    #[serde(default)]
    pub headline: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Status {
    #[serde(rename = "type", default)]
    pub type_field: Option<StatusType>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusType {
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub name: Option<String>,
}
