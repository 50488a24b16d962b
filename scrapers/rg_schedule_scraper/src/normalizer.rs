use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::time_convert::paris_to_sydney;
use crate::types::{
    MatchStatus, NormalizedMatch, PlayerSummary, RawMatch, RawPayload, RawPlayer, RawTeam, Round,
    Score, SideScore,
};

pub const UNKNOWN_COURT: &str = "Unknown Court";
const PLAYER_SEPARATOR: &str = " / ";

// Checked in order, so "quarterfinal" and "semifinal" win over "final".
const ROUND_KEYWORDS: [(&str, Round); 7] = [
    ("first", Round::R1),
    ("second", Round::R2),
    ("third", Round::R3),
    ("fourth", Round::R4),
    ("quarter", Round::Quarterfinal),
    ("semi", Round::Semifinal),
    ("final", Round::Final),
];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NormalizeError {
    #[error("match has no team {team}")]
    MissingTeam { team: &'static str },
    #[error("team {team} has no player roster")]
    MissingPlayers { team: &'static str },
    #[error("player {index} of team {team} has no first name")]
    EmptyFirstName { team: &'static str, index: usize },
    #[error("malformed match record: {0}")]
    Malformed(String),
}

/// A match that was dropped from a cycle, with the reason it was dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedMatch {
    pub index: usize,
    pub id: Value,
    pub error: NormalizeError,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedBatch {
    pub matches: Vec<NormalizedMatch>,
    pub rejected: Vec<RejectedMatch>,
}

pub fn round_to_short_label(round_label: Option<&str>) -> Option<Round> {
    let label = round_label?.to_lowercase();
    ROUND_KEYWORDS
        .iter()
        .find(|(keyword, _)| label.contains(keyword))
        .map(|(_, round)| *round)
}

pub fn normalize_status(status: Option<&str>) -> MatchStatus {
    match status.map(str::to_lowercase).as_deref() {
        Some("in_progress") => MatchStatus::InProgress,
        Some("finished") => MatchStatus::Finished,
        Some("not_started") => MatchStatus::NotStarted,
        Some("interrupted") => MatchStatus::Interrupted,
        _ => MatchStatus::Unknown,
    }
}

/// Drops JSON values the upstream uses to mean "nothing here".
fn present(value: Option<&Value>) -> Option<Value> {
    match value? {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        other => Some(other.clone()),
    }
}

fn non_empty(value: Option<&String>) -> Option<String> {
    value.filter(|s| !s.is_empty()).cloned()
}

/// Label fields are only meaningful as strings; any other JSON type reads as absent.
fn label(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str)
}

fn player_summary(
    player: &RawPlayer,
    team: &'static str,
    index: usize,
) -> Result<PlayerSummary, NormalizeError> {
    let initial = player
        .first_name
        .as_deref()
        .and_then(|name| name.trim().chars().next())
        .ok_or(NormalizeError::EmptyFirstName { team, index })?;
    let last_name = player.last_name.as_deref().unwrap_or_default().trim();

    Ok(PlayerSummary {
        name: format!("{initial}. {last_name}").trim_end().to_string(),
        country: non_empty(player.country.as_ref()),
    })
}

fn team_players(
    team: &RawTeam,
    side: &'static str,
) -> Result<Vec<PlayerSummary>, NormalizeError> {
    team.players
        .as_ref()
        .ok_or(NormalizeError::MissingPlayers { team: side })?
        .iter()
        .enumerate()
        .map(|(index, player)| player_summary(player, side, index))
        .collect()
}

fn display_names(players: &[PlayerSummary]) -> String {
    players
        .iter()
        .map(|p| p.name.as_str())
        .collect::<Vec<_>>()
        .join(PLAYER_SEPARATOR)
}

fn set_scores(team: &RawTeam) -> Vec<Value> {
    team.sets
        .iter()
        .flatten()
        .map(|set| set.score.clone().unwrap_or(Value::Null))
        .collect()
}

fn current_points(team: &RawTeam) -> Value {
    present(team.points.as_ref()).unwrap_or_else(|| Value::String("0".to_string()))
}

/// Map one upstream match onto the published schema.
///
/// `reference` is the instant whose Paris calendar date anchors the
/// `notBefore` conversion; callers pass the same value for every match in a
/// cycle.
pub fn normalize_match(
    raw: &RawMatch,
    reference: DateTime<Utc>,
) -> Result<NormalizedMatch, NormalizeError> {
    let team_a = raw.team_a.as_ref().ok_or(NormalizeError::MissingTeam { team: "A" })?;
    let team_b = raw.team_b.as_ref().ok_or(NormalizeError::MissingTeam { team: "B" })?;
    let players_a = team_players(team_a, "A")?;
    let players_b = team_players(team_b, "B")?;

    let data = raw.match_data.clone().unwrap_or_default();
    let not_before = present(data.not_before.as_ref());
    let not_before_aest = not_before
        .as_ref()
        .and_then(Value::as_str)
        .and_then(|time| paris_to_sydney(time, reference));

    Ok(NormalizedMatch {
        id: raw.id.clone(),
        court: label(data.court_name.as_ref())
            .filter(|court| !court.is_empty())
            .map_or_else(|| UNKNOWN_COURT.to_string(), str::to_string),
        type_label: label(data.type_label.as_ref())
            .filter(|type_label| !type_label.is_empty())
            .map(str::to_string),
        home: display_names(&players_a),
        away: display_names(&players_b),
        players_a,
        players_b,
        seed_a: present(team_a.seed.as_ref()),
        seed_b: present(team_b.seed.as_ref()),
        status: normalize_status(label(data.status.as_ref())),
        start_time: None,
        end_time: present(data.end_timestamp.as_ref()),
        not_before,
        not_before_aest,
        round: round_to_short_label(label(data.round_label.as_ref())),
        score: Score {
            current: SideScore {
                home: current_points(team_a),
                away: current_points(team_b),
            },
            sets: SideScore {
                home: set_scores(team_a),
                away: set_scores(team_b),
            },
        },
        duration: data
            .duration_in_minutes
            .as_ref()
            .and_then(Value::as_u64)
            .unwrap_or(0),
    })
}

/// Normalize every entry of a payload, keeping payload order. Entries that fail
/// to decode or validate are reported in `rejected` and left out.
pub fn normalize_payload(payload: &RawPayload, reference: DateTime<Utc>) -> NormalizedBatch {
    let mut batch = NormalizedBatch::default();

    for (index, entry) in payload.matches.iter().flatten().enumerate() {
        let result = RawMatch::deserialize(entry)
            .map_err(|e| NormalizeError::Malformed(e.to_string()))
            .and_then(|raw| normalize_match(&raw, reference));

        match result {
            Ok(normalized) => batch.matches.push(normalized),
            Err(error) => {
                let id = entry.get("id").cloned().unwrap_or(Value::Null);
                warn!("Skipping match {} (id {}): {}", index, id, error);
                batch.rejected.push(RejectedMatch { index, id, error });
            }
        }
    }

    batch
}
