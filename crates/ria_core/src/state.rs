use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::view_model::{AppViewModel, DownloadView, JobView, PreviewView};
use crate::{JobKind, Preview, ScrapeForm, TrackerPhase, TrackerState, DEFAULT_DOC_TYPE};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PreviewState {
    #[default]
    NotLoaded,
    Loaded(Preview),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadState {
    Pending,
    Saved(PathBuf),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    form: ScrapeForm,
    doc_types: Vec<String>,
    scrape: TrackerState,
    predict: TrackerState,
    preview: PreviewState,
    downloads: BTreeMap<JobKind, DownloadState>,
    notice: Option<String>,
    dirty: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            form: ScrapeForm::default(),
            doc_types: vec![DEFAULT_DOC_TYPE.to_string()],
            scrape: TrackerState::new(JobKind::Scrape),
            predict: TrackerState::new(JobKind::Predict),
            preview: PreviewState::NotLoaded,
            downloads: BTreeMap::new(),
            notice: None,
            dirty: false,
        }
    }
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn form(&self) -> &ScrapeForm {
        &self.form
    }

    pub fn doc_types(&self) -> &[String] {
        &self.doc_types
    }

    pub fn tracker(&self, kind: JobKind) -> &TrackerState {
        match kind {
            JobKind::Scrape => &self.scrape,
            JobKind::Predict => &self.predict,
        }
    }

    pub fn preview(&self) -> &PreviewState {
        &self.preview
    }

    pub fn download(&self, kind: JobKind) -> Option<&DownloadState> {
        self.downloads.get(&kind)
    }

    /// Total documents reported by the preview, zero until it is loaded.
    pub fn total(&self) -> u64 {
        match &self.preview {
            PreviewState::Loaded(preview) => preview.total,
            _ => 0,
        }
    }

    /// Scrape finished and its preview request has been answered.
    pub fn scrape_settled(&self) -> bool {
        if !self.scrape.is_settled() {
            return false;
        }
        !self.scrape.is_done() || self.preview != PreviewState::NotLoaded
    }

    pub fn can_scrape(&self) -> bool {
        self.form.is_complete() && !self.scrape.is_busy()
    }

    pub fn can_predict(&self) -> bool {
        self.scrape.is_done() && self.total() > 0 && !self.predict.is_busy()
    }

    pub fn view(&self) -> AppViewModel {
        AppViewModel {
            start_date: self.form.start_date.clone(),
            end_date: self.form.end_date.clone(),
            doc_type: self.form.doc_type.clone(),
            doc_types: self.doc_types.clone(),
            scrape: job_view(&self.scrape),
            predict: job_view(&self.predict),
            preview: match &self.preview {
                PreviewState::Loaded(preview) => Some(PreviewView {
                    rows: preview.rows.clone(),
                    total: preview.total,
                }),
                _ => None,
            },
            preview_error: match &self.preview {
                PreviewState::Failed(message) => Some(message.clone()),
                _ => None,
            },
            downloads: self
                .downloads
                .iter()
                .map(|(kind, state)| DownloadView {
                    kind: *kind,
                    state: state.clone(),
                })
                .collect(),
            can_scrape: self.can_scrape(),
            can_predict: self.can_predict(),
            notice: self.notice.clone(),
            dirty: self.dirty,
        }
    }

    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn form_mut(&mut self) -> &mut ScrapeForm {
        &mut self.form
    }

    pub(crate) fn set_doc_types(&mut self, types: Vec<String>) {
        if types.is_empty() {
            return;
        }
        if !types.contains(&self.form.doc_type) {
            self.form.doc_type = types[0].clone();
        }
        self.doc_types = types;
    }

    pub(crate) fn tracker_mut(&mut self, kind: JobKind) -> &mut TrackerState {
        match kind {
            JobKind::Scrape => &mut self.scrape,
            JobKind::Predict => &mut self.predict,
        }
    }

    pub(crate) fn set_preview(&mut self, preview: PreviewState) {
        self.preview = preview;
    }

    pub(crate) fn set_download(&mut self, kind: JobKind, state: DownloadState) {
        self.downloads.insert(kind, state);
    }

    pub(crate) fn clear_download(&mut self, kind: JobKind) {
        self.downloads.remove(&kind);
    }

    pub(crate) fn set_notice(&mut self, notice: Option<String>) {
        self.notice = notice;
    }
}

fn job_view(tracker: &TrackerState) -> Option<JobView> {
    match tracker.phase() {
        TrackerPhase::Idle => None,
        TrackerPhase::Submitting => Some(JobView::submitting(tracker.kind())),
        TrackerPhase::Rejected { message } => Some(JobView::rejected(tracker.kind(), message)),
        TrackerPhase::Tracking(snapshot) => {
            Some(JobView::from_snapshot(tracker.kind(), snapshot, tracker.is_polling()))
        }
    }
}
