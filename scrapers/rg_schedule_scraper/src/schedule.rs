use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::{
    collections::HashMap,
    ffi::OsString,
    path::{Path, PathBuf},
};
use tokio::fs;
use tracing::{debug, warn};

use crate::normalizer::{normalize_payload, RejectedMatch};
use crate::polling::PollingSource;
use crate::types::{NormalizedMatch, RawPayload};

#[derive(Debug, Clone, PartialEq)]
pub struct CourtSchedule {
    pub court: String,
    pub matches: Vec<NormalizedMatch>,
}

/// Matches grouped by court. Courts keep the order they were first seen in,
/// and serialize as a JSON object in that order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScheduleSnapshot {
    courts: Vec<CourtSchedule>,
}

impl ScheduleSnapshot {
    pub fn group_by_court(matches: impl IntoIterator<Item = NormalizedMatch>) -> Self {
        let mut courts: Vec<CourtSchedule> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();

        for m in matches {
            match positions.get(&m.court) {
                Some(&pos) => courts[pos].matches.push(m),
                None => {
                    positions.insert(m.court.clone(), courts.len());
                    courts.push(CourtSchedule {
                        court: m.court.clone(),
                        matches: vec![m],
                    });
                }
            }
        }

        Self { courts }
    }

    pub fn courts(&self) -> &[CourtSchedule] {
        &self.courts
    }

    pub fn court(&self, name: &str) -> Option<&[NormalizedMatch]> {
        self.courts
            .iter()
            .find(|c| c.court == name)
            .map(|c| c.matches.as_slice())
    }

    pub fn match_count(&self) -> usize {
        self.courts.iter().map(|c| c.matches.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.courts.is_empty()
    }

    pub fn to_pretty_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl Serialize for ScheduleSnapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.courts.len()))?;
        for court in &self.courts {
            map.serialize_entry(&court.court, &court.matches)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BuiltSchedule {
    pub snapshot: ScheduleSnapshot,
    pub rejected: Vec<RejectedMatch>,
}

/// Normalize a payload against one reference instant and group it by court.
pub fn build_snapshot(payload: &RawPayload, reference: DateTime<Utc>) -> BuiltSchedule {
    let batch = normalize_payload(payload, reference);
    BuiltSchedule {
        snapshot: ScheduleSnapshot::group_by_court(batch.matches),
        rejected: batch.rejected,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CycleReport {
    pub matches: usize,
    pub courts: usize,
    pub rejected: usize,
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("schedule.json"));
    name.push(".tmp");
    path.with_file_name(name)
}

/// Write the snapshot next to `path` and rename it into place, so readers see
/// either the previous file or the complete new one.
pub async fn persist_snapshot(snapshot: &ScheduleSnapshot, path: &Path) -> Result<()> {
    let json = snapshot
        .to_pretty_json()
        .context("Failed to serialize schedule")?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create directory {:?}", parent))?;
    }

    let tmp = temp_path(path);
    if let Err(e) = fs::write(&tmp, json.as_bytes()).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(e).with_context(|| format!("Failed to write {:?}", tmp));
    }
    if let Err(e) = fs::rename(&tmp, path).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(e).with_context(|| format!("Failed to replace {:?}", path));
    }

    debug!("Wrote {} bytes to {:?}", json.len(), path);
    Ok(())
}

/// One refresh: fetch, normalize with `now` as the shared reference instant,
/// group, and persist. Any error leaves the file at `output_path` untouched.
pub async fn run_cycle<S>(
    source: &S,
    output_path: &Path,
    now: DateTime<Utc>,
) -> Result<CycleReport>
where
    S: PollingSource + ?Sized,
{
    let payload = source
        .fetch_payload()
        .await
        .context("Failed to fetch polling data")?;

    let built = build_snapshot(&payload, now);
    if !built.rejected.is_empty() {
        warn!("{} match(es) rejected this cycle", built.rejected.len());
    }

    persist_snapshot(&built.snapshot, output_path).await?;

    Ok(CycleReport {
        matches: built.snapshot.match_count(),
        courts: built.snapshot.courts().len(),
        rejected: built.rejected.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::normalize_match;
    use crate::types::RawMatch;
    use serde_json::json;

    fn reference() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-06-05T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn on_court(id: &str, court: &str) -> NormalizedMatch {
        let raw: RawMatch = serde_json::from_value(json!({
            "id": id,
            "teamA": { "players": [{ "firstName": "Home", "lastName": id }] },
            "teamB": { "players": [{ "firstName": "Away", "lastName": id }] },
            "matchData": { "courtName": court }
        }))
        .unwrap();
        normalize_match(&raw, reference()).unwrap()
    }

    #[test]
    fn test_grouping_preserves_first_seen_order() {
        let snapshot = ScheduleSnapshot::group_by_court(vec![
            on_court("m1", "A"),
            on_court("m2", "B"),
            on_court("m3", "A"),
        ]);

        let courts: Vec<_> = snapshot.courts().iter().map(|c| c.court.as_str()).collect();
        assert_eq!(courts, vec!["A", "B"]);

        let a_ids: Vec<_> = snapshot.court("A").unwrap().iter().map(|m| m.id.clone()).collect();
        assert_eq!(a_ids, vec![json!("m1"), json!("m3")]);
        assert_eq!(snapshot.match_count(), 3);
    }

    #[test]
    fn test_serialized_keys_follow_court_order() {
        let snapshot = ScheduleSnapshot::group_by_court(vec![
            on_court("m1", "Court Simonne-Mathieu"),
            on_court("m2", "Court 14"),
            on_court("m3", "Court Simonne-Mathieu"),
        ]);

        let json = snapshot.to_pretty_json().unwrap();
        let simonne = json.find("\"Court Simonne-Mathieu\"").unwrap();
        let fourteen = json.find("\"Court 14\"").unwrap();
        assert!(simonne < fourteen);
        assert!(json.contains("\n  \"Court 14\": [\n"));
    }

    #[test]
    fn test_empty_snapshot_serializes_to_empty_object() {
        let snapshot = ScheduleSnapshot::default();
        assert!(snapshot.is_empty());
        assert_eq!(snapshot.to_pretty_json().unwrap(), "{}");
    }

    #[test]
    fn test_temp_path_sits_next_to_output() {
        assert_eq!(
            temp_path(Path::new("public/schedule.json")),
            PathBuf::from("public/schedule.json.tmp")
        );
    }

    #[tokio::test]
    async fn test_persist_creates_parent_and_replaces() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("schedule.json");

        let first = ScheduleSnapshot::group_by_court(vec![on_court("m1", "A")]);
        persist_snapshot(&first, &path).await.unwrap();

        let second = ScheduleSnapshot::group_by_court(vec![on_court("m2", "B")]);
        persist_snapshot(&second, &path).await.unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert!(written.get("A").is_none());
        assert_eq!(written["B"][0]["id"], json!("m2"));
        assert!(!temp_path(&path).exists());
    }

    #[tokio::test]
    async fn test_failed_write_keeps_previous_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schedule.json");

        let first = ScheduleSnapshot::group_by_court(vec![on_court("m1", "A")]);
        persist_snapshot(&first, &path).await.unwrap();
        let before = std::fs::read(&path).unwrap();

        // a directory in the temp file's place makes the write fail
        std::fs::create_dir(temp_path(&path)).unwrap();

        let second = ScheduleSnapshot::group_by_court(vec![on_court("m2", "B")]);
        let err = persist_snapshot(&second, &path).await.unwrap_err();

        assert!(format!("{:#}", err).contains("Failed to write"));
        assert_eq!(std::fs::read(&path).unwrap(), before);
    }
}
