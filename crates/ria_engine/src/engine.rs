use std::path::PathBuf;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use ria_core::{JobId, JobKind};
use ria_logging::{ria_debug, ria_info, ria_warn};

use crate::api::{ApiSettings, ReqwestApi, RiaApi};
use crate::download::download_artifact;
use crate::tracker::{ChannelEventSink, EventSink, JobRequest, JobTracker, PollSettings};
use crate::{ApiError, EngineEvent};

enum EngineCommand {
    LoadDocumentTypes,
    Submit {
        generation: u64,
        request: JobRequest,
    },
    Cancel {
        kind: JobKind,
    },
    Download {
        kind: Option<JobKind>,
        job_id: JobId,
        output_dir: PathBuf,
    },
}

#[derive(Debug, Clone, Default)]
pub struct EngineSettings {
    pub api: ApiSettings,
    pub poll: PollSettings,
}

struct Trackers {
    scrape: Arc<JobTracker>,
    predict: Arc<JobTracker>,
}

impl Trackers {
    fn get(&self, kind: JobKind) -> &Arc<JobTracker> {
        match kind {
            JobKind::Scrape => &self.scrape,
            JobKind::Predict => &self.predict,
        }
    }
}

/// Runs the trackers on a background tokio runtime and reports back through
/// a channel the caller drains with [`EngineHandle::try_recv`].
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl EngineHandle {
    pub fn new(settings: EngineSettings) -> Result<Self, ApiError> {
        let api: Arc<dyn RiaApi> = Arc::new(ReqwestApi::new(settings.api)?);
        Ok(Self::with_api(api, settings.poll))
    }

    pub fn with_api(api: Arc<dyn RiaApi>, poll: PollSettings) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let sink: Arc<dyn EventSink> = Arc::new(ChannelEventSink::new(event_tx));

        thread::spawn(move || {
            let runtime = tokio::runtime::Runtime::new().expect("tokio runtime");
            let trackers = Trackers {
                scrape: Arc::new(JobTracker::new(
                    JobKind::Scrape,
                    api.clone(),
                    sink.clone(),
                    poll.clone(),
                )),
                predict: Arc::new(JobTracker::new(
                    JobKind::Predict,
                    api.clone(),
                    sink.clone(),
                    poll,
                )),
            };

            while let Ok(command) = cmd_rx.recv() {
                match command {
                    EngineCommand::Cancel { kind } => {
                        trackers.get(kind).cancel();
                    }
                    EngineCommand::Submit {
                        generation,
                        request,
                    } => {
                        // Reserve in command order so a following Cancel sees it.
                        let tracker = trackers.get(request.kind()).clone();
                        let pending = match tracker.prepare(generation, request) {
                            Ok(pending) => pending,
                            Err(err) => {
                                ria_debug!("Submission generation={} refused: {}", generation, err);
                                continue;
                            }
                        };
                        runtime.spawn(async move {
                            let generation = pending.generation();
                            if let Err(err) = tracker.send(pending).await {
                                ria_debug!("Submission generation={} ended: {}", generation, err);
                            }
                        });
                    }
                    EngineCommand::LoadDocumentTypes => {
                        let api = api.clone();
                        let sink = sink.clone();
                        runtime.spawn(async move {
                            let result = api.document_types().await;
                            if let Err(err) = &result {
                                report_health(api.as_ref(), err).await;
                            }
                            sink.emit(EngineEvent::DocumentTypes(result));
                        });
                    }
                    EngineCommand::Download {
                        kind,
                        job_id,
                        output_dir,
                    } => {
                        let api = api.clone();
                        let sink = sink.clone();
                        runtime.spawn(async move {
                            let result = download_artifact(api.as_ref(), &job_id, &output_dir).await;
                            sink.emit(EngineEvent::Downloaded {
                                kind,
                                job_id,
                                result,
                            });
                        });
                    }
                }
            }

            trackers.scrape.cancel();
            trackers.predict.cancel();
        });

        Self { cmd_tx, event_rx }
    }

    pub fn load_document_types(&self) {
        let _ = self.cmd_tx.send(EngineCommand::LoadDocumentTypes);
    }

    pub fn submit(&self, generation: u64, request: JobRequest) {
        let _ = self.cmd_tx.send(EngineCommand::Submit {
            generation,
            request,
        });
    }

    pub fn cancel(&self, kind: JobKind) {
        let _ = self.cmd_tx.send(EngineCommand::Cancel { kind });
    }

    /// `kind` is echoed back in the resulting event; `None` for downloads
    /// not tied to a tracked job.
    pub fn download(&self, kind: Option<JobKind>, job_id: JobId, output_dir: impl Into<PathBuf>) {
        let _ = self.cmd_tx.send(EngineCommand::Download {
            kind,
            job_id,
            output_dir: output_dir.into(),
        });
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }
}

/// Tell an unreachable server apart from a failing endpoint in the log.
async fn report_health(api: &dyn RiaApi, cause: &ApiError) {
    match api.health().await {
        Ok(true) => ria_info!("Document types failed on a healthy server: {}", cause),
        Ok(false) => ria_warn!("Server reports itself unhealthy; document types: {}", cause),
        Err(err) => ria_warn!("Server unreachable ({}); document types: {}", err, cause),
    }
}
