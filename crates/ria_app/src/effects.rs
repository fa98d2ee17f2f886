use std::path::PathBuf;
use std::time::Duration;

use ria_core::{Effect, JobId, Msg};
use ria_engine::{EngineEvent, EngineHandle, JobRequest};
use ria_logging::{ria_debug, ria_info, ria_warn};

/// Hands core effects to the engine and turns engine events back into
/// messages.
pub struct EffectRunner {
    engine: EngineHandle,
    output_dir: PathBuf,
}

impl EffectRunner {
    pub fn new(engine: EngineHandle, output_dir: PathBuf) -> Self {
        Self { engine, output_dir }
    }

    pub fn enqueue(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::LoadDocumentTypes => self.engine.load_document_types(),
                Effect::SubmitScrape { generation, params } => {
                    ria_info!(
                        "SubmitScrape generation={} start={} end={} doc_types={:?}",
                        generation,
                        params.start_date,
                        params.end_date,
                        params.doc_types
                    );
                    self.engine.submit(generation, JobRequest::Scrape(params));
                }
                Effect::SubmitPredict {
                    generation,
                    scrape_job_id,
                } => {
                    ria_info!(
                        "SubmitPredict generation={} scrape_job_id={}",
                        generation,
                        scrape_job_id
                    );
                    self.engine
                        .submit(generation, JobRequest::Predict { scrape_job_id });
                }
                Effect::CancelPolling { kind } => {
                    ria_debug!("CancelPolling kind={}", kind);
                    self.engine.cancel(kind);
                }
                Effect::Download { kind, job_id } => {
                    self.engine
                        .download(Some(kind), job_id, self.output_dir.clone());
                }
            }
        }
    }

    /// Download a job the core is not tracking, e.g. one from history.
    pub fn download_untracked(&self, job_id: JobId) {
        self.engine.download(None, job_id, self.output_dir.clone());
    }

    pub fn next_event(&self, timeout: Duration) -> Option<EngineEvent> {
        self.engine.recv_timeout(timeout)
    }
}

/// `None` for events the core has no message for.
pub fn event_to_msg(event: EngineEvent) -> Option<Msg> {
    let msg = match event {
        EngineEvent::DocumentTypes(Ok(types)) => Msg::DocumentTypesLoaded(types),
        EngineEvent::DocumentTypes(Err(err)) => {
            ria_warn!("Could not load document types: {}", err);
            return None;
        }
        EngineEvent::Submitted {
            kind,
            generation,
            job_id,
        } => Msg::JobSubmitted {
            kind,
            generation,
            job_id,
        },
        EngineEvent::SubmitFailed {
            kind,
            generation,
            error,
        } => Msg::SubmitFailed {
            kind,
            generation,
            message: error.to_string(),
        },
        EngineEvent::Status {
            kind,
            generation,
            job_id,
            update,
        } => Msg::StatusReceived {
            kind,
            generation,
            job_id,
            update,
        },
        EngineEvent::PollFailed {
            kind,
            generation,
            job_id,
            attempt,
            error,
        } => Msg::PollFailed {
            kind,
            generation,
            job_id,
            attempt,
            message: error.to_string(),
        },
        EngineEvent::PollAbandoned {
            kind,
            generation,
            job_id,
            message,
        } => Msg::PollAbandoned {
            kind,
            generation,
            job_id,
            message,
        },
        EngineEvent::PreviewLoaded {
            generation,
            job_id,
            preview,
        } => Msg::PreviewLoaded {
            generation,
            job_id,
            preview,
        },
        EngineEvent::PreviewFailed {
            generation,
            job_id,
            error,
        } => Msg::PreviewFailed {
            generation,
            job_id,
            message: error.to_string(),
        },
        EngineEvent::Downloaded {
            kind: Some(kind),
            job_id,
            result,
        } => match result {
            Ok(path) => Msg::ArtifactSaved { kind, job_id, path },
            Err(err) => Msg::DownloadFailed {
                kind,
                job_id,
                message: err.to_string(),
            },
        },
        EngineEvent::Downloaded { kind: None, .. } => return None,
    };
    Some(msg)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use ria_core::JobKind;
    use ria_engine::{ApiError, FailureKind};

    use super::*;

    #[test]
    fn failures_carry_readable_messages() {
        let msg = event_to_msg(EngineEvent::SubmitFailed {
            kind: JobKind::Scrape,
            generation: 2,
            error: ApiError::new(FailureKind::HttpStatus(400), "end_date must be after start_date"),
        });
        assert_eq!(
            msg,
            Some(Msg::SubmitFailed {
                kind: JobKind::Scrape,
                generation: 2,
                message: "http status 400: end_date must be after start_date".to_string(),
            })
        );
    }

    #[test]
    fn untracked_downloads_and_type_errors_have_no_message() {
        assert_eq!(
            event_to_msg(EngineEvent::Downloaded {
                kind: None,
                job_id: JobId::from("abc"),
                result: Ok(PathBuf::from("abc.xlsx")),
            }),
            None
        );
        assert_eq!(
            event_to_msg(EngineEvent::DocumentTypes(Err(ApiError::new(
                FailureKind::Network,
                "connection refused"
            )))),
            None
        );
    }

    #[test]
    fn tracked_download_result_maps_to_saved() {
        assert_eq!(
            event_to_msg(EngineEvent::Downloaded {
                kind: Some(JobKind::Predict),
                job_id: JobId::from("p1"),
                result: Ok(PathBuf::from("output/p1.xlsx")),
            }),
            Some(Msg::ArtifactSaved {
                kind: JobKind::Predict,
                job_id: JobId::from("p1"),
                path: PathBuf::from("output/p1.xlsx"),
            })
        );
    }
}
