use crate::state::{DownloadState, PreviewState};
use crate::{AppState, Effect, JobId, JobKind, Msg};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::Started => vec![Effect::LoadDocumentTypes],
        Msg::DocumentTypesLoaded(types) => {
            state.set_doc_types(types);
            state.mark_dirty();
            Vec::new()
        }
        Msg::StartDateChanged(value) => {
            state.form_mut().start_date = value;
            state.set_notice(None);
            state.mark_dirty();
            Vec::new()
        }
        Msg::EndDateChanged(value) => {
            state.form_mut().end_date = value;
            state.set_notice(None);
            state.mark_dirty();
            Vec::new()
        }
        Msg::DocTypeSelected(value) => {
            state.form_mut().doc_type = value;
            state.set_notice(None);
            state.mark_dirty();
            Vec::new()
        }
        Msg::ScrapeClicked => submit_scrape(&mut state),
        Msg::PredictClicked => match state.tracker(JobKind::Scrape).job_id().cloned() {
            Some(scrape_job_id) if state.can_predict() => submit_predict(&mut state, scrape_job_id),
            _ => {
                state.set_notice(Some("no finished scrape with documents to classify".into()));
                state.mark_dirty();
                Vec::new()
            }
        },
        Msg::PredictForJob(scrape_job_id) => submit_predict(&mut state, scrape_job_id),
        Msg::CancelClicked(kind) => {
            if state.tracker_mut(kind).cancel() {
                state.mark_dirty();
                vec![Effect::CancelPolling { kind }]
            } else {
                Vec::new()
            }
        }
        Msg::DownloadClicked(kind) => {
            let tracker = state.tracker(kind);
            match tracker.job_id().cloned() {
                Some(job_id) if tracker.is_done() => {
                    state.set_download(kind, DownloadState::Pending);
                    state.mark_dirty();
                    vec![Effect::Download { kind, job_id }]
                }
                _ => {
                    state.set_notice(Some(format!("no finished {kind} job to download")));
                    state.mark_dirty();
                    Vec::new()
                }
            }
        }
        Msg::JobSubmitted {
            kind,
            generation,
            job_id,
        } => {
            if state.tracker_mut(kind).accept_submission(generation, job_id) {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::SubmitFailed {
            kind,
            generation,
            message,
        } => {
            let message = format!("could not submit job: {message}");
            if state.tracker_mut(kind).reject_submission(generation, message) {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::StatusReceived {
            kind,
            generation,
            job_id,
            update,
        } => {
            if state
                .tracker_mut(kind)
                .apply_status(generation, &job_id, update)
                .is_some()
            {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::PollFailed {
            kind,
            generation,
            job_id,
            attempt,
            message,
        } => {
            let tracker = state.tracker(kind);
            if tracker.is_polling()
                && tracker.generation() == generation
                && tracker.job_id() == Some(&job_id)
            {
                state.set_notice(Some(format!(
                    "{kind} status check failed (attempt {attempt}): {message}"
                )));
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::PollAbandoned {
            kind,
            generation,
            job_id,
            message,
        } => {
            if state.tracker_mut(kind).abandon(generation, &job_id, message) {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::PreviewLoaded {
            generation,
            job_id,
            preview,
        } => {
            if is_current_scrape(&state, generation, &job_id) {
                state.set_preview(PreviewState::Loaded(preview));
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::PreviewFailed {
            generation,
            job_id,
            message,
        } => {
            if is_current_scrape(&state, generation, &job_id) {
                state.set_preview(PreviewState::Failed(message));
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::ArtifactSaved { kind, job_id, path } => {
            if state.tracker(kind).job_id() == Some(&job_id) {
                state.set_download(kind, DownloadState::Saved(path));
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::DownloadFailed {
            kind,
            job_id,
            message,
        } => {
            if state.tracker(kind).job_id() == Some(&job_id) {
                state.set_download(kind, DownloadState::Failed(message));
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::Tick => Vec::new(),
    };

    (state, effects)
}

fn submit_scrape(state: &mut AppState) -> Vec<Effect> {
    let params = match state.form().validate() {
        Ok(params) => params,
        Err(err) => {
            state.set_notice(Some(err.to_string()));
            state.mark_dirty();
            return Vec::new();
        }
    };

    let mut effects = Vec::with_capacity(3);
    // A new scrape invalidates everything downstream of the previous one.
    for kind in [JobKind::Scrape, JobKind::Predict] {
        if state.tracker(kind).is_busy() {
            effects.push(Effect::CancelPolling { kind });
        }
        state.clear_download(kind);
    }
    state.tracker_mut(JobKind::Predict).clear();
    state.set_preview(PreviewState::NotLoaded);
    state.set_notice(None);

    let scrape = state.tracker_mut(JobKind::Scrape);
    let generation = scrape.next_generation();
    scrape.begin_submit(generation);
    state.mark_dirty();

    effects.push(Effect::SubmitScrape { generation, params });
    effects
}

fn submit_predict(state: &mut AppState, scrape_job_id: JobId) -> Vec<Effect> {
    let mut effects = Vec::with_capacity(2);
    if state.tracker(JobKind::Predict).is_busy() {
        effects.push(Effect::CancelPolling {
            kind: JobKind::Predict,
        });
    }
    state.clear_download(JobKind::Predict);
    state.set_notice(None);

    let predict = state.tracker_mut(JobKind::Predict);
    let generation = predict.next_generation();
    predict.begin_submit(generation);
    state.mark_dirty();

    effects.push(Effect::SubmitPredict {
        generation,
        scrape_job_id,
    });
    effects
}

fn is_current_scrape(state: &AppState, generation: u64, job_id: &JobId) -> bool {
    let scrape = state.tracker(JobKind::Scrape);
    scrape.generation() == generation && scrape.job_id() == Some(job_id) && scrape.is_done()
}
