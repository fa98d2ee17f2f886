//! RIA core: pure job-tracking state machine and view-model helpers.
mod effect;
mod form;
mod job;
mod msg;
mod state;
mod tracker;
mod update;
mod view_model;

pub use effect::Effect;
pub use form::{FormError, ScrapeForm, ScrapeParams, DATE_FORMAT, DEFAULT_DOC_TYPE};
pub use job::{JobId, JobKind, JobSnapshot, JobStatus, Preview, PreviewRow, StatusUpdate};
pub use msg::Msg;
pub use state::{AppState, DownloadState, PreviewState};
pub use tracker::{StatusOutcome, TrackerPhase, TrackerState};
pub use update::update;
pub use view_model::{AppViewModel, DownloadView, JobView, PreviewView};
