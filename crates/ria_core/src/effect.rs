use crate::{JobId, JobKind, ScrapeParams};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    LoadDocumentTypes,
    SubmitScrape {
        generation: u64,
        params: ScrapeParams,
    },
    SubmitPredict {
        generation: u64,
        scrape_job_id: JobId,
    },
    CancelPolling {
        kind: JobKind,
    },
    Download {
        kind: JobKind,
        job_id: JobId,
    },
}
