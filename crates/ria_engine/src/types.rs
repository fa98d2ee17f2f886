use std::fmt;
use std::path::PathBuf;

use ria_core::{JobId, JobKind, Preview, StatusUpdate};

use crate::persist::PersistError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    DocumentTypes(Result<Vec<String>, ApiError>),
    Submitted {
        kind: JobKind,
        generation: u64,
        job_id: JobId,
    },
    SubmitFailed {
        kind: JobKind,
        generation: u64,
        error: ApiError,
    },
    Status {
        kind: JobKind,
        generation: u64,
        job_id: JobId,
        update: StatusUpdate,
    },
    PollFailed {
        kind: JobKind,
        generation: u64,
        job_id: JobId,
        attempt: u32,
        error: ApiError,
    },
    /// Polling stopped after too many consecutive failures. `message` is
    /// the synthetic error the job now carries.
    PollAbandoned {
        kind: JobKind,
        generation: u64,
        job_id: JobId,
        message: String,
    },
    PreviewLoaded {
        generation: u64,
        job_id: JobId,
        preview: Preview,
    },
    PreviewFailed {
        generation: u64,
        job_id: JobId,
        error: ApiError,
    },
    Downloaded {
        kind: Option<JobKind>,
        job_id: JobId,
        result: Result<PathBuf, ApiError>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct ApiError {
    pub kind: FailureKind,
    pub message: String,
}

impl ApiError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl From<PersistError> for ApiError {
    fn from(err: PersistError) -> Self {
        ApiError::new(FailureKind::Io, err.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    Network,
    Decode,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    /// Request did not match the tracker it was handed to.
    InvalidRequest,
    /// A newer submission of the same kind replaced this one.
    Superseded,
    Io,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::Decode => write!(f, "invalid response"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FailureKind::InvalidRequest => write!(f, "invalid request"),
            FailureKind::Superseded => write!(f, "superseded"),
            FailureKind::Io => write!(f, "io error"),
        }
    }
}
