use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use ria_core::{JobKind, JobSnapshot};
use ria_engine::{ensure_output_dir, AtomicFileWriter};
use ria_logging::{ria_error, ria_info, ria_warn};
use serde::{Deserialize, Serialize};

const HISTORY_FILENAME: &str = ".ria_history.ron";
const MAX_ENTRIES: usize = 50;

/// Job kind as stored in the history file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryKind {
    Scrape,
    Predict,
}

impl From<JobKind> for HistoryKind {
    fn from(kind: JobKind) -> Self {
        match kind {
            JobKind::Scrape => HistoryKind::Scrape,
            JobKind::Predict => HistoryKind::Predict,
        }
    }
}

impl fmt::Display for HistoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            HistoryKind::Scrape => "scrape",
            HistoryKind::Predict => "predict",
        })
    }
}

/// One job that reached `done`, as remembered between runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub kind: HistoryKind,
    pub job_id: String,
    pub count: Option<u64>,
    pub filename: Option<String>,
    /// RFC 3339 timestamp.
    pub completed_at: String,
}

impl HistoryEntry {
    pub fn completed(kind: JobKind, snapshot: &JobSnapshot, now: DateTime<Utc>) -> Self {
        Self {
            kind: kind.into(),
            job_id: snapshot.id().to_string(),
            count: snapshot.count,
            filename: snapshot.filename.clone(),
            completed_at: now.to_rfc3339(),
        }
    }

    pub fn is_kind(&self, kind: JobKind) -> bool {
        self.kind == HistoryKind::from(kind)
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct PersistedHistory {
    completed: Vec<HistoryEntry>,
}

pub(crate) fn history_path(output_dir: &Path) -> PathBuf {
    output_dir.join(HISTORY_FILENAME)
}

pub(crate) fn load_history(output_dir: &Path) -> Vec<HistoryEntry> {
    let path = history_path(output_dir);
    let content = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
        Err(err) => {
            ria_warn!("Failed to read job history from {:?}: {}", path, err);
            return Vec::new();
        }
    };

    match ron::from_str::<PersistedHistory>(&content) {
        Ok(history) => history.completed,
        Err(err) => {
            ria_warn!("Failed to parse job history from {:?}: {}", path, err);
            Vec::new()
        }
    }
}

pub(crate) fn save_history(output_dir: &Path, completed: &[HistoryEntry]) {
    if let Err(err) = ensure_output_dir(output_dir) {
        ria_error!("Failed to ensure output dir {:?}: {}", output_dir, err);
        return;
    }

    let history = PersistedHistory {
        completed: completed.to_vec(),
    };
    let content = match ron::ser::to_string_pretty(&history, ron::ser::PrettyConfig::new()) {
        Ok(text) => text,
        Err(err) => {
            ria_error!("Failed to serialize job history: {}", err);
            return;
        }
    };

    let writer = AtomicFileWriter::new(output_dir.to_path_buf());
    if let Err(err) = writer.write(HISTORY_FILENAME, &content) {
        ria_error!("Failed to write job history to {:?}: {}", output_dir, err);
    }
}

/// Append `entry`, replacing an older record of the same job, and keep only
/// the most recent entries.
pub(crate) fn record(output_dir: &Path, entry: HistoryEntry) {
    let mut completed = load_history(output_dir);
    completed.retain(|existing| existing.job_id != entry.job_id);
    ria_info!("Recording {} job {} in history", entry.kind, entry.job_id);
    completed.push(entry);
    if completed.len() > MAX_ENTRIES {
        let excess = completed.len() - MAX_ENTRIES;
        completed.drain(..excess);
    }
    save_history(output_dir, &completed);
}

/// Most recent entry, optionally restricted to one job kind.
pub(crate) fn latest(entries: &[HistoryEntry], kind: Option<JobKind>) -> Option<&HistoryEntry> {
    entries
        .iter()
        .rev()
        .find(|entry| kind.map_or(true, |kind| entry.is_kind(kind)))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use ria_core::{JobId, JobStatus, StatusUpdate};
    use tempfile::tempdir;

    use super::*;

    fn entry(kind: JobKind, id: &str) -> HistoryEntry {
        let mut snapshot = JobSnapshot::queued(JobId::from(id));
        let mut update = StatusUpdate::new(JobStatus::Done);
        update.count = Some(3);
        snapshot.apply(update);
        let at = Utc.with_ymd_and_hms(2024, 2, 1, 12, 0, 0).unwrap();
        HistoryEntry::completed(kind, &snapshot, at)
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempdir().unwrap();
        assert!(load_history(dir.path()).is_empty());
    }

    #[test]
    fn corrupt_file_loads_empty() {
        let dir = tempdir().unwrap();
        fs::write(history_path(dir.path()), "not ron at all (").unwrap();
        assert!(load_history(dir.path()).is_empty());
    }

    #[test]
    fn unknown_kind_is_rejected_at_load() {
        let dir = tempdir().unwrap();
        fs::write(
            history_path(dir.path()),
            r#"(completed: [(kind: classify, job_id: "x", count: None, filename: None, completed_at: "2024-02-01T12:00:00+00:00")])"#,
        )
        .unwrap();
        assert!(load_history(dir.path()).is_empty());

        fs::write(
            history_path(dir.path()),
            r#"(completed: [(kind: predict, job_id: "p1", count: None, filename: None, completed_at: "2024-02-01T12:00:00+00:00")])"#,
        )
        .unwrap();
        let loaded = load_history(dir.path());
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].kind, HistoryKind::Predict);
    }

    #[test]
    fn records_survive_a_reload() {
        let dir = tempdir().unwrap();
        record(dir.path(), entry(JobKind::Scrape, "abc"));
        record(dir.path(), entry(JobKind::Predict, "p1"));
        record(dir.path(), entry(JobKind::Scrape, "abc"));

        let loaded = load_history(dir.path());
        let ids: Vec<&str> = loaded.iter().map(|entry| entry.job_id.as_str()).collect();
        assert_eq!(ids, vec!["p1", "abc"]);
        assert_eq!(loaded[0].kind, HistoryKind::Predict);
        assert_eq!(loaded[1].count, Some(3));
        assert_eq!(loaded[1].completed_at, "2024-02-01T12:00:00+00:00");
    }

    #[test]
    fn latest_filters_by_kind() {
        let entries = vec![
            entry(JobKind::Scrape, "s1"),
            entry(JobKind::Predict, "p1"),
            entry(JobKind::Scrape, "s2"),
            entry(JobKind::Predict, "p2"),
        ];
        assert_eq!(latest(&entries, Some(JobKind::Scrape)).unwrap().job_id, "s2");
        assert_eq!(latest(&entries, None).unwrap().job_id, "p2");
        assert_eq!(latest(&[], None), None);
    }

    #[test]
    fn history_is_capped() {
        let dir = tempdir().unwrap();
        for n in 0..(MAX_ENTRIES + 5) {
            record(dir.path(), entry(JobKind::Scrape, &format!("job-{n}")));
        }
        let loaded = load_history(dir.path());
        assert_eq!(loaded.len(), MAX_ENTRIES);
        assert_eq!(loaded[0].job_id, "job-5");
    }
}
