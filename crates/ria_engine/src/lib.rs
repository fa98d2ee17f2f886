//! RIA engine: HTTP client, job trackers and artifact persistence.
mod api;
mod download;
mod engine;
mod filename;
mod persist;
mod tracker;
mod types;
mod wire;

pub use api::{ApiSettings, Artifact, ReqwestApi, RiaApi, DEFAULT_BASE_URL};
pub use download::download_artifact;
pub use engine::{EngineHandle, EngineSettings};
pub use filename::{artifact_filename, disposition_filename};
pub use persist::{ensure_output_dir, AtomicFileWriter, PersistError};
pub use tracker::{
    ChannelEventSink, EventSink, JobRequest, JobTracker, PendingSubmission, PollSettings,
    POLL_INTERVAL,
};
pub use types::{ApiError, EngineEvent, FailureKind};
