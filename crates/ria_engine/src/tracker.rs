use std::sync::{mpsc, Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use ria_core::{JobId, JobKind, JobSnapshot, ScrapeParams, StatusOutcome, TrackerState};
use ria_logging::{ria_debug, ria_info, ria_warn};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::{ApiError, EngineEvent, FailureKind, RiaApi};

/// Fixed delay between two status requests of one polling cycle.
pub const POLL_INTERVAL: Duration = Duration::from_millis(2000);

#[derive(Debug, Clone)]
pub struct PollSettings {
    pub interval: Duration,
    /// Failed status requests in a row before the job is given up as
    /// unreachable. A successful request resets the count.
    pub max_consecutive_failures: u32,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: POLL_INTERVAL,
            max_consecutive_failures: 3,
        }
    }
}

pub trait EventSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

pub struct ChannelEventSink {
    tx: mpsc::Sender<EngineEvent>,
}

impl ChannelEventSink {
    pub fn new(tx: mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobRequest {
    Scrape(ScrapeParams),
    Predict { scrape_job_id: JobId },
}

impl JobRequest {
    pub fn kind(&self) -> JobKind {
        match self {
            JobRequest::Scrape(_) => JobKind::Scrape,
            JobRequest::Predict { .. } => JobKind::Predict,
        }
    }
}

pub struct PendingSubmission {
    generation: u64,
    request: JobRequest,
    token: CancellationToken,
}

impl PendingSubmission {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

struct Shared {
    state: TrackerState,
    cycle: Option<CancellationToken>,
    task: Option<JoinHandle<()>>,
}

pub struct JobTracker {
    kind: JobKind,
    api: Arc<dyn RiaApi>,
    sink: Arc<dyn EventSink>,
    settings: PollSettings,
    shared: Arc<Mutex<Shared>>,
}

impl JobTracker {
    pub fn new(
        kind: JobKind,
        api: Arc<dyn RiaApi>,
        sink: Arc<dyn EventSink>,
        settings: PollSettings,
    ) -> Self {
        Self {
            kind,
            api,
            sink,
            settings,
            shared: Arc::new(Mutex::new(Shared {
                state: TrackerState::new(kind),
                cycle: None,
                task: None,
            })),
        }
    }

    pub fn snapshot(&self) -> Option<JobSnapshot> {
        lock(&self.shared).state.snapshot().cloned()
    }

    pub fn is_polling(&self) -> bool {
        lock(&self.shared).state.is_polling()
    }

    pub async fn submit(&self, request: JobRequest) -> Result<JobId, ApiError> {
        let generation = lock(&self.shared).state.next_generation();
        self.submit_as(generation, request).await
    }

    /// Submit with a caller-chosen generation, so events can be matched
    /// against state kept elsewhere. Must be called inside a tokio runtime.
    pub async fn submit_as(&self, generation: u64, request: JobRequest) -> Result<JobId, ApiError> {
        let pending = self.prepare(generation, request)?;
        self.send(pending).await
    }

    /// Reserve `generation` for `request` without touching the network.
    ///
    /// The running cycle is cancelled and the tracker enters `Submitting`
    /// before this returns, so a [`JobTracker::cancel`] issued afterwards
    /// also stops the submission handed to [`JobTracker::send`].
    pub fn prepare(
        &self,
        generation: u64,
        request: JobRequest,
    ) -> Result<PendingSubmission, ApiError> {
        if request.kind() != self.kind {
            return Err(ApiError::new(
                FailureKind::InvalidRequest,
                format!("{} request sent to the {} tracker", request.kind(), self.kind),
            ));
        }

        let mut shared = lock(&self.shared);
        if let Some(previous) = shared.cycle.take() {
            previous.cancel();
        }
        if !shared.state.begin_submit(generation) {
            return Err(ApiError::new(
                FailureKind::Superseded,
                format!(
                    "generation {generation} is not newer than {}",
                    shared.state.generation()
                ),
            ));
        }
        let token = CancellationToken::new();
        shared.cycle = Some(token.clone());
        Ok(PendingSubmission {
            generation,
            request,
            token,
        })
    }

    /// Post a prepared submission and start polling the accepted job.
    /// Must be called inside a tokio runtime.
    pub async fn send(&self, pending: PendingSubmission) -> Result<JobId, ApiError> {
        let PendingSubmission {
            generation,
            request,
            token,
        } = pending;
        if token.is_cancelled() {
            ria_debug!(
                "{} submission generation={} cancelled before sending",
                self.kind,
                generation
            );
            return Err(superseded());
        }

        ria_info!("Submitting {} job generation={}", self.kind, generation);
        let result = match &request {
            JobRequest::Scrape(params) => self.api.submit_scrape(params).await,
            JobRequest::Predict { scrape_job_id } => self.api.submit_predict(scrape_job_id).await,
        };

        match result {
            Ok(job_id) => {
                {
                    let mut shared = lock(&self.shared);
                    if token.is_cancelled()
                        || !shared.state.accept_submission(generation, job_id.clone())
                    {
                        ria_debug!(
                            "Dropping {} submission generation={} job_id={}",
                            self.kind,
                            generation,
                            job_id
                        );
                        return Err(superseded());
                    }
                }
                ria_info!("{} job accepted job_id={}", self.kind, job_id);
                self.sink.emit(EngineEvent::Submitted {
                    kind: self.kind,
                    generation,
                    job_id: job_id.clone(),
                });

                let cycle = PollCycle {
                    kind: self.kind,
                    generation,
                    job_id: job_id.clone(),
                    api: self.api.clone(),
                    sink: self.sink.clone(),
                    settings: self.settings.clone(),
                    shared: self.shared.clone(),
                };
                let task = tokio::spawn(cycle.run(token));
                lock(&self.shared).task = Some(task);
                Ok(job_id)
            }
            Err(error) => {
                if token.is_cancelled() {
                    return Err(superseded());
                }
                let rejected = lock(&self.shared)
                    .state
                    .reject_submission(generation, format!("could not submit job: {error}"));
                if rejected {
                    ria_warn!("{} submission failed: {}", self.kind, error);
                    self.sink.emit(EngineEvent::SubmitFailed {
                        kind: self.kind,
                        generation,
                        error: error.clone(),
                    });
                }
                Err(error)
            }
        }
    }

    /// Stop the running cycle, if any. Already fetched data is kept.
    pub fn cancel(&self) -> bool {
        let mut shared = lock(&self.shared);
        if let Some(token) = shared.cycle.take() {
            token.cancel();
        }
        let was_active = shared.state.cancel();
        if was_active {
            ria_info!("Cancelled {} polling", self.kind);
        }
        was_active
    }

    /// Wait until the current polling cycle has finished.
    pub async fn join(&self) {
        let task = lock(&self.shared).task.take();
        if let Some(task) = task {
            let _ = task.await;
        }
    }
}

impl Drop for JobTracker {
    fn drop(&mut self) {
        if let Some(token) = lock(&self.shared).cycle.take() {
            token.cancel();
        }
    }
}

struct PollCycle {
    kind: JobKind,
    generation: u64,
    job_id: JobId,
    api: Arc<dyn RiaApi>,
    sink: Arc<dyn EventSink>,
    settings: PollSettings,
    shared: Arc<Mutex<Shared>>,
}

impl PollCycle {
    async fn run(self, token: CancellationToken) {
        let max_failures = self.settings.max_consecutive_failures.max(1);
        let mut failures = 0u32;

        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    ria_debug!("{} polling for {} cancelled", self.kind, self.job_id);
                    return;
                }
                _ = tokio::time::sleep(self.settings.interval) => {}
            }

            let result = self.api.job_status(&self.job_id).await;
            if token.is_cancelled() {
                return;
            }

            match result {
                Ok(update) => {
                    failures = 0;
                    let outcome = lock(&self.shared).state.apply_status(
                        self.generation,
                        &self.job_id,
                        update.clone(),
                    );
                    let Some(outcome) = outcome else {
                        return;
                    };
                    ria_debug!(
                        "{} job {} status={} progress={:?}",
                        self.kind,
                        self.job_id,
                        update.status,
                        update.progress
                    );
                    self.sink.emit(EngineEvent::Status {
                        kind: self.kind,
                        generation: self.generation,
                        job_id: self.job_id.clone(),
                        update,
                    });
                    match outcome {
                        StatusOutcome::Continue => {}
                        StatusOutcome::Done => {
                            ria_info!("{} job {} done", self.kind, self.job_id);
                            if self.kind == JobKind::Scrape {
                                self.fetch_preview(&token).await;
                            }
                            return;
                        }
                        StatusOutcome::Failed => {
                            ria_warn!("{} job {} reported an error", self.kind, self.job_id);
                            return;
                        }
                    }
                }
                Err(error) => {
                    failures += 1;
                    if failures >= max_failures {
                        let message = format!("could not reach server: {error}");
                        let abandoned =
                            lock(&self.shared)
                                .state
                                .abandon(self.generation, &self.job_id, message.clone());
                        if abandoned {
                            ria_warn!(
                                "Giving up on {} job {} after {} failed status checks",
                                self.kind,
                                self.job_id,
                                failures
                            );
                            self.sink.emit(EngineEvent::PollAbandoned {
                                kind: self.kind,
                                generation: self.generation,
                                job_id: self.job_id.clone(),
                                message,
                            });
                        }
                        return;
                    }
                    ria_warn!(
                        "Status check {} for {} job {} failed: {}",
                        failures,
                        self.kind,
                        self.job_id,
                        error
                    );
                    self.sink.emit(EngineEvent::PollFailed {
                        kind: self.kind,
                        generation: self.generation,
                        job_id: self.job_id.clone(),
                        attempt: failures,
                        error,
                    });
                }
            }
        }
    }

    async fn fetch_preview(&self, token: &CancellationToken) {
        let result = self.api.preview(&self.job_id).await;
        if token.is_cancelled() {
            return;
        }
        match result {
            Ok(preview) => {
                ria_info!(
                    "Preview for {}: {} rows of {}",
                    self.job_id,
                    preview.rows.len(),
                    preview.total
                );
                self.sink.emit(EngineEvent::PreviewLoaded {
                    generation: self.generation,
                    job_id: self.job_id.clone(),
                    preview,
                });
            }
            Err(error) => {
                ria_warn!("Preview for {} failed: {}", self.job_id, error);
                self.sink.emit(EngineEvent::PreviewFailed {
                    generation: self.generation,
                    job_id: self.job_id.clone(),
                    error,
                });
            }
        }
    }
}

fn lock(shared: &Mutex<Shared>) -> MutexGuard<'_, Shared> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

fn superseded() -> ApiError {
    ApiError::new(FailureKind::Superseded, "a newer submission replaced this one")
}
