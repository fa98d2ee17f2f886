use std::fmt;

/// Opaque identifier the server assigns to a job at submission time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobId(String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for JobId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for JobId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum JobKind {
    Scrape,
    Predict,
}

impl JobKind {
    pub fn label(self) -> &'static str {
        match self {
            JobKind::Scrape => "scrape",
            JobKind::Predict => "predict",
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Lifecycle state reported by the server.
///
/// `Scraping` and `Running` are the same semantic state; scrape jobs use the
/// former label. Values the client does not know are kept verbatim in
/// `Other` and are never terminal.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum JobStatus {
    #[default]
    Queued,
    Scraping,
    Running,
    Done,
    Error,
    Other(String),
}

impl JobStatus {
    pub fn from_wire(raw: &str) -> Self {
        match raw {
            "queued" => JobStatus::Queued,
            "scraping" => JobStatus::Scraping,
            "running" => JobStatus::Running,
            "done" => JobStatus::Done,
            "error" => JobStatus::Error,
            other => JobStatus::Other(other.to_string()),
        }
    }

    pub fn as_wire(&self) -> &str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Scraping => "scraping",
            JobStatus::Running => "running",
            JobStatus::Done => "done",
            JobStatus::Error => "error",
            JobStatus::Other(raw) => raw,
        }
    }

    /// Display label; unknown states are rendered as-is.
    pub fn label(&self) -> &str {
        match self {
            JobStatus::Queued => "Queued",
            JobStatus::Scraping => "Scraping",
            JobStatus::Running => "Running",
            JobStatus::Done => "Done",
            JobStatus::Error => "Error",
            JobStatus::Other(raw) => raw,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Done | JobStatus::Error)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}

/// One polling response, already decoded. `None` fields were absent on the
/// wire and leave the previous snapshot value untouched.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StatusUpdate {
    pub status: JobStatus,
    pub progress: Option<u8>,
    pub progress_text: Option<String>,
    pub error: Option<String>,
    pub count: Option<u64>,
    pub filename: Option<String>,
}

impl StatusUpdate {
    pub fn new(status: JobStatus) -> Self {
        Self {
            status,
            ..Self::default()
        }
    }

    /// Clamp a raw server percentage into `0..=100`.
    pub fn percent(raw: i64) -> u8 {
        raw.clamp(0, 100) as u8
    }

    pub fn with_progress(mut self, raw: i64) -> Self {
        self.progress = Some(Self::percent(raw));
        self
    }

    pub fn with_progress_text(mut self, text: impl Into<String>) -> Self {
        self.progress_text = Some(text.into());
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

/// Client-side view of one remote job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSnapshot {
    id: JobId,
    pub status: JobStatus,
    pub progress: Option<u8>,
    pub progress_text: Option<String>,
    pub error: Option<String>,
    pub count: Option<u64>,
    pub filename: Option<String>,
}

impl JobSnapshot {
    /// Snapshot assigned the instant a submission is accepted.
    pub fn queued(id: JobId) -> Self {
        Self {
            id,
            status: JobStatus::Queued,
            progress: Some(0),
            progress_text: None,
            error: None,
            count: None,
            filename: None,
        }
    }

    pub fn id(&self) -> &JobId {
        &self.id
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Merge a polling response. The id is preserved, provided fields
    /// overwrite, and nothing changes once the job is terminal.
    pub fn apply(&mut self, update: StatusUpdate) -> bool {
        if self.is_terminal() {
            return false;
        }
        self.status = update.status;
        if let Some(progress) = update.progress {
            self.progress = Some(progress);
        }
        if let Some(text) = update.progress_text {
            self.progress_text = Some(text);
        }
        if let Some(error) = update.error {
            self.error = Some(error);
        }
        if let Some(count) = update.count {
            self.count = Some(count);
        }
        if let Some(filename) = update.filename {
            self.filename = Some(filename);
        }
        true
    }

    pub(crate) fn fail(&mut self, message: String) {
        self.status = JobStatus::Error;
        self.error = Some(message);
    }
}

/// Read-only projection of one scraped document.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PreviewRow {
    pub ref_number: String,
    pub pub_date: String,
    pub short_text: String,
    pub url: String,
}

/// First page of a finished scrape plus the total number of documents.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Preview {
    pub rows: Vec<PreviewRow>,
    pub total: u64,
}
