use crate::state::DownloadState;
use crate::{JobKind, JobSnapshot, JobStatus, PreviewRow};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub start_date: String,
    pub end_date: String,
    pub doc_type: String,
    pub doc_types: Vec<String>,
    pub scrape: Option<JobView>,
    pub predict: Option<JobView>,
    pub preview: Option<PreviewView>,
    pub preview_error: Option<String>,
    pub downloads: Vec<DownloadView>,
    pub can_scrape: bool,
    pub can_predict: bool,
    pub notice: Option<String>,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobView {
    pub kind: JobKind,
    pub job_id: Option<String>,
    pub status: Option<JobStatus>,
    pub status_label: String,
    /// Percentage in `0..=100`, only while the job is still running.
    pub progress: Option<u8>,
    pub progress_text: Option<String>,
    pub error: Option<String>,
    pub count: Option<u64>,
    pub active: bool,
    /// Polling was cancelled before a terminal state.
    pub stopped: bool,
}

impl JobView {
    pub(crate) fn submitting(kind: JobKind) -> Self {
        Self {
            kind,
            job_id: None,
            status: None,
            status_label: "Submitting".to_string(),
            progress: None,
            progress_text: None,
            error: None,
            count: None,
            active: true,
            stopped: false,
        }
    }

    pub(crate) fn rejected(kind: JobKind, message: &str) -> Self {
        Self {
            kind,
            job_id: None,
            status: Some(JobStatus::Error),
            status_label: JobStatus::Error.label().to_string(),
            progress: None,
            progress_text: None,
            error: Some(message.to_string()),
            count: None,
            active: false,
            stopped: false,
        }
    }

    pub(crate) fn from_snapshot(kind: JobKind, snapshot: &JobSnapshot, polling: bool) -> Self {
        let terminal = snapshot.is_terminal();
        let active = polling && !terminal;
        Self {
            kind,
            job_id: Some(snapshot.id().to_string()),
            status: Some(snapshot.status.clone()),
            status_label: snapshot.status.label().to_string(),
            progress: active.then(|| snapshot.progress.unwrap_or(0).min(100)),
            progress_text: snapshot.progress_text.clone(),
            error: match snapshot.status {
                JobStatus::Error => snapshot.error.clone(),
                _ => None,
            },
            count: snapshot.count,
            active,
            stopped: !polling && !terminal,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewView {
    pub rows: Vec<PreviewRow>,
    pub total: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadView {
    pub kind: JobKind,
    pub state: DownloadState,
}
