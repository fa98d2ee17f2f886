use std::path::PathBuf;

use crate::{JobId, JobKind, Preview, StatusUpdate};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// App started; ask the server for document types.
    Started,
    /// Server answered the document type query.
    DocumentTypesLoaded(Vec<String>),
    /// User edited the start date input.
    StartDateChanged(String),
    /// User edited the end date input.
    EndDateChanged(String),
    /// User picked a document type.
    DocTypeSelected(String),
    /// User asked to scrape with the current form.
    ScrapeClicked,
    /// User asked to classify the current scrape results.
    PredictClicked,
    /// User asked to classify an earlier scrape job by id.
    PredictForJob(JobId),
    /// User stopped following a job.
    CancelClicked(JobKind),
    /// User asked for the result file of a finished job.
    DownloadClicked(JobKind),
    /// Server accepted a submission.
    JobSubmitted {
        kind: JobKind,
        generation: u64,
        job_id: JobId,
    },
    /// Submission request failed.
    SubmitFailed {
        kind: JobKind,
        generation: u64,
        message: String,
    },
    /// One polling response.
    StatusReceived {
        kind: JobKind,
        generation: u64,
        job_id: JobId,
        update: StatusUpdate,
    },
    /// One polling request failed; polling continues.
    PollFailed {
        kind: JobKind,
        generation: u64,
        job_id: JobId,
        attempt: u32,
        message: String,
    },
    /// Polling gave up after repeated failures.
    PollAbandoned {
        kind: JobKind,
        generation: u64,
        job_id: JobId,
        message: String,
    },
    /// Preview page of a finished scrape.
    PreviewLoaded {
        generation: u64,
        job_id: JobId,
        preview: Preview,
    },
    PreviewFailed {
        generation: u64,
        job_id: JobId,
        message: String,
    },
    /// Artifact written to disk.
    ArtifactSaved {
        kind: JobKind,
        job_id: JobId,
        path: PathBuf,
    },
    DownloadFailed {
        kind: JobKind,
        job_id: JobId,
        message: String,
    },
    /// UI/render tick to coalesce rendering.
    Tick,
}
