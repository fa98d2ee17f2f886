use std::path::PathBuf;
use std::sync::Once;

use ria_core::{
    update, AppState, DownloadState, Effect, JobId, JobKind, JobStatus, Msg, Preview, PreviewRow,
    StatusUpdate,
};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(ria_logging::initialize_for_tests);
}

fn apply(state: AppState, msgs: Vec<Msg>) -> (AppState, Vec<Effect>) {
    let mut all = Vec::new();
    let mut state = state;
    for msg in msgs {
        let (next, effects) = update(state, msg);
        state = next;
        all.extend(effects);
    }
    (state, all)
}

/// A finished scrape job "abc" with `total` documents and a loaded preview.
fn scraped(total: u64) -> AppState {
    let (state, _) = apply(
        AppState::new(),
        vec![
            Msg::StartDateChanged("2024-01-01".into()),
            Msg::EndDateChanged("2024-01-31".into()),
            Msg::ScrapeClicked,
            Msg::JobSubmitted {
                kind: JobKind::Scrape,
                generation: 1,
                job_id: JobId::from("abc"),
            },
            Msg::StatusReceived {
                kind: JobKind::Scrape,
                generation: 1,
                job_id: JobId::from("abc"),
                update: StatusUpdate::new(JobStatus::Done).with_progress(100),
            },
            Msg::PreviewLoaded {
                generation: 1,
                job_id: JobId::from("abc"),
                preview: Preview {
                    rows: vec![PreviewRow::default(); total.min(10) as usize],
                    total,
                },
            },
        ],
    );
    state
}

fn predict_status(generation: u64, job_id: &str, status: JobStatus) -> Msg {
    Msg::StatusReceived {
        kind: JobKind::Predict,
        generation,
        job_id: JobId::from(job_id),
        update: StatusUpdate::new(status),
    }
}

#[test]
fn predict_requires_finished_scrape() {
    init_logging();
    let (state, effects) = update(AppState::new(), Msg::PredictClicked);
    assert!(effects.is_empty());
    assert!(state.view().predict.is_none());
    assert!(state.view().notice.is_some());
}

#[test]
fn predict_uses_scrape_job_id_and_runs_to_done() {
    init_logging();
    let (state, effects) = update(scraped(12), Msg::PredictClicked);
    assert_eq!(
        effects,
        vec![Effect::SubmitPredict {
            generation: 1,
            scrape_job_id: JobId::from("abc"),
        }]
    );
    assert!(!state.view().can_predict);

    let (state, effects) = apply(
        state,
        vec![
            Msg::JobSubmitted {
                kind: JobKind::Predict,
                generation: 1,
                job_id: JobId::from("p-1"),
            },
            predict_status(1, "p-1", JobStatus::Running),
        ],
    );
    assert!(effects.is_empty());
    let predict = state.view().predict.unwrap();
    assert_eq!(predict.status_label, "Running");
    assert!(predict.active);

    let (state, _) = update(state, predict_status(1, "p-1", JobStatus::Done));
    let predict = state.view().predict.unwrap();
    assert_eq!(predict.status, Some(JobStatus::Done));
    assert!(!predict.active);
    // The scrape tracker is untouched by the prediction cycle.
    assert_eq!(
        state.tracker(JobKind::Scrape).job_id(),
        Some(&JobId::from("abc"))
    );
    assert!(state.view().can_predict);
}

#[test]
fn prediction_failure_is_reported() {
    init_logging();
    let (state, _) = apply(
        scraped(3),
        vec![
            Msg::PredictClicked,
            Msg::JobSubmitted {
                kind: JobKind::Predict,
                generation: 1,
                job_id: JobId::from("p-1"),
            },
            Msg::StatusReceived {
                kind: JobKind::Predict,
                generation: 1,
                job_id: JobId::from("p-1"),
                update: StatusUpdate::new(JobStatus::Error)
                    .with_error("Scrape job is not complete"),
            },
        ],
    );
    let predict = state.view().predict.unwrap();
    assert_eq!(predict.error.as_deref(), Some("Scrape job is not complete"));
}

#[test]
fn explicit_scrape_job_can_be_classified_without_local_scrape() {
    init_logging();
    let (state, effects) = update(AppState::new(), Msg::PredictForJob(JobId::from("old-run")));
    assert_eq!(
        effects,
        vec![Effect::SubmitPredict {
            generation: 1,
            scrape_job_id: JobId::from("old-run"),
        }]
    );
    assert_eq!(state.view().predict.unwrap().status_label, "Submitting");
}

#[test]
fn new_scrape_discards_previous_prediction() {
    init_logging();
    let (state, _) = apply(
        scraped(3),
        vec![
            Msg::PredictClicked,
            Msg::JobSubmitted {
                kind: JobKind::Predict,
                generation: 1,
                job_id: JobId::from("p-1"),
            },
        ],
    );
    let (state, effects) = update(state, Msg::ScrapeClicked);
    assert_eq!(
        effects[0],
        Effect::CancelPolling {
            kind: JobKind::Predict
        }
    );
    assert!(matches!(effects[1], Effect::SubmitScrape { generation: 2, .. }));
    let view = state.view();
    assert!(view.predict.is_none());
    assert!(view.preview.is_none());

    // The superseded prediction no longer applies.
    let (state, _) = update(state, predict_status(1, "p-1", JobStatus::Done));
    assert!(state.view().predict.is_none());
}

#[test]
fn download_follows_finished_jobs_only() {
    init_logging();
    let (state, effects) = update(scraped(3), Msg::DownloadClicked(JobKind::Predict));
    assert!(effects.is_empty());

    let (state, effects) = update(state, Msg::DownloadClicked(JobKind::Scrape));
    assert_eq!(
        effects,
        vec![Effect::Download {
            kind: JobKind::Scrape,
            job_id: JobId::from("abc"),
        }]
    );
    assert_eq!(state.download(JobKind::Scrape), Some(&DownloadState::Pending));

    let path = PathBuf::from("output/2024-01-01_2024-01-31_scraping_results.xlsx");
    let (state, _) = update(
        state,
        Msg::ArtifactSaved {
            kind: JobKind::Scrape,
            job_id: JobId::from("abc"),
            path: path.clone(),
        },
    );
    let view = state.view();
    assert_eq!(view.downloads.len(), 1);
    assert_eq!(view.downloads[0].state, DownloadState::Saved(path));
}
