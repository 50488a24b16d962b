use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of the polling endpoint. Entries are kept as raw JSON so a single
/// malformed match can be rejected without failing the whole payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawPayload {
    #[serde(default)]
    pub matches: Option<Vec<Value>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMatch {
    #[serde(default)]
    pub id: Value,
    pub team_a: Option<RawTeam>,
    pub team_b: Option<RawTeam>,
    pub match_data: Option<RawMatchData>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawTeam {
    pub players: Option<Vec<RawPlayer>>,
    pub seed: Option<Value>,
    pub points: Option<Value>,
    pub sets: Option<Vec<RawSet>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPlayer {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub country: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSet {
    pub score: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMatchData {
    pub court_name: Option<Value>,
    pub type_label: Option<Value>,
    pub round_label: Option<Value>,
    pub status: Option<Value>,
    pub end_timestamp: Option<Value>,
    pub not_before: Option<Value>,
    pub duration_in_minutes: Option<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    InProgress,
    Finished,
    NotStarted,
    Interrupted,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Round {
    R1,
    R2,
    R3,
    R4,
    #[serde(rename = "QF")]
    Quarterfinal,
    #[serde(rename = "SF")]
    Semifinal,
    #[serde(rename = "F")]
    Final,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerSummary {
    pub name: String,
    pub country: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SideScore<T> {
    pub home: T,
    pub away: T,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Score {
    pub current: SideScore<Value>,
    pub sets: SideScore<Vec<Value>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedMatch {
    pub id: Value,
    pub court: String,
    pub type_label: Option<String>,
    pub home: String,
    pub away: String,
    pub players_a: Vec<PlayerSummary>,
    pub players_b: Vec<PlayerSummary>,
    pub seed_a: Option<Value>,
    pub seed_b: Option<Value>,
    pub status: MatchStatus,
    pub start_time: Option<String>,
    pub end_time: Option<Value>,
    pub not_before: Option<Value>,
    #[serde(rename = "notBeforeAEST")]
    pub not_before_aest: Option<String>,
    pub round: Option<Round>,
    pub score: Score,
    pub duration: u64,
}
