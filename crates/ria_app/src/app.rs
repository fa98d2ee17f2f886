use std::io::Write;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{anyhow, bail, Context};
use chrono::Utc;
use ria_core::{update, AppState, DownloadState, JobId, JobKind, Msg};
use ria_engine::{EngineEvent, EngineHandle};
use ria_logging::{ria_info, ria_warn};

use crate::cli::{Command, DownloadArgs, PredictArgs, ScrapeArgs};
use crate::effects::{event_to_msg, EffectRunner};
use crate::history::{self, HistoryEntry};
use crate::render::{history_lines, preview_table, Renderer};

const EVENT_WAIT: Duration = Duration::from_millis(100);

/// Drives one command: feeds messages through `update`, runs the effects
/// and renders whenever the state changed.
pub struct App<W: Write> {
    state: AppState,
    runner: EffectRunner,
    renderer: Renderer<W>,
    output_dir: PathBuf,
    max_wait: Duration,
}

impl<W: Write> App<W> {
    pub fn new(engine: EngineHandle, output_dir: PathBuf, max_wait: Duration, out: W) -> Self {
        Self {
            state: AppState::new(),
            runner: EffectRunner::new(engine, output_dir.clone()),
            renderer: Renderer::new(out),
            output_dir,
            max_wait,
        }
    }

    pub fn run(&mut self, command: Command) -> anyhow::Result<()> {
        match command {
            Command::DocTypes => self.doc_types(),
            Command::Scrape(args) => self.scrape(args),
            Command::Predict(args) => self.predict(args),
            Command::Download(args) => self.download(args),
            Command::History => {
                let entries = history::load_history(&self.output_dir);
                self.renderer.lines(history_lines(&entries))?;
                Ok(())
            }
        }
    }

    #[cfg(test)]
    pub fn into_output(self) -> W {
        self.renderer.into_inner()
    }

    fn dispatch(&mut self, msg: Msg) -> anyhow::Result<()> {
        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        let was_dirty = state.consume_dirty();
        self.state = state;
        if was_dirty {
            self.renderer.render(&self.state.view())?;
        }
        self.runner.enqueue(effects);
        Ok(())
    }

    fn handle_event(&mut self, event: EngineEvent) -> anyhow::Result<()> {
        match event_to_msg(event) {
            Some(msg) => self.dispatch(msg),
            None => Ok(()),
        }
    }

    /// Pump engine events until `done` holds. On timeout the job of `kind`
    /// is cancelled.
    fn wait_until(
        &mut self,
        kind: JobKind,
        done: impl Fn(&AppState) -> bool,
    ) -> anyhow::Result<()> {
        let deadline = Instant::now() + self.max_wait;
        while !done(&self.state) {
            if Instant::now() >= deadline {
                self.dispatch(Msg::CancelClicked(kind))?;
                bail!(
                    "gave up waiting for the {kind} job after {}s",
                    self.max_wait.as_secs()
                );
            }
            match self.runner.next_event(EVENT_WAIT) {
                Some(event) => self.handle_event(event)?,
                None => self.dispatch(Msg::Tick)?,
            }
        }
        Ok(())
    }

    fn doc_types(&mut self) -> anyhow::Result<()> {
        self.dispatch(Msg::Started)?;
        let deadline = Instant::now() + self.max_wait;
        while Instant::now() < deadline {
            match self.runner.next_event(EVENT_WAIT) {
                Some(EngineEvent::DocumentTypes(result)) => {
                    if result.is_err() {
                        self.renderer
                            .lines(["! server unreachable, showing the default type"])?;
                    }
                    self.handle_event(EngineEvent::DocumentTypes(result))?;
                    break;
                }
                Some(other) => self.handle_event(other)?,
                None => {}
            }
        }
        let types = self.state.doc_types().to_vec();
        self.renderer.lines(types)?;
        Ok(())
    }

    fn scrape(&mut self, args: ScrapeArgs) -> anyhow::Result<()> {
        self.dispatch(Msg::StartDateChanged(args.start))?;
        self.dispatch(Msg::EndDateChanged(args.end))?;
        if let Some(doc_type) = args.doc_type {
            self.dispatch(Msg::DocTypeSelected(doc_type))?;
        }
        self.dispatch(Msg::ScrapeClicked)?;
        if !self.state.tracker(JobKind::Scrape).is_busy() {
            let notice = self.state.view().notice.unwrap_or_default();
            bail!("scrape not started: {notice}");
        }

        self.wait_until(JobKind::Scrape, AppState::scrape_settled)?;
        self.finish_job(JobKind::Scrape)?;

        if let Some(preview) = self.state.view().preview {
            self.renderer.lines(preview_table(&preview))?;
        }

        if args.download {
            self.download_tracked(JobKind::Scrape)?;
        }

        if args.predict {
            if !self.state.can_predict() {
                self.renderer.lines(["Nothing to classify."])?;
                return Ok(());
            }
            self.dispatch(Msg::PredictClicked)?;
            self.wait_until(JobKind::Predict, |state| {
                state.tracker(JobKind::Predict).is_settled()
            })?;
            self.finish_job(JobKind::Predict)?;
            if args.download {
                self.download_tracked(JobKind::Predict)?;
            }
        }
        Ok(())
    }

    fn predict(&mut self, args: PredictArgs) -> anyhow::Result<()> {
        let scrape_job_id = match args.scrape_job_id {
            Some(id) => JobId::new(id),
            None => {
                let entries = history::load_history(&self.output_dir);
                let entry = history::latest(&entries, Some(JobKind::Scrape))
                    .ok_or_else(|| anyhow!("no completed scrape job in history; pass a job id"))?;
                JobId::new(entry.job_id.clone())
            }
        };
        ria_info!("Classifying scrape job {}", scrape_job_id);

        self.dispatch(Msg::PredictForJob(scrape_job_id))?;
        self.wait_until(JobKind::Predict, |state| {
            state.tracker(JobKind::Predict).is_settled()
        })?;
        self.finish_job(JobKind::Predict)?;
        if args.download {
            self.download_tracked(JobKind::Predict)?;
        }
        Ok(())
    }

    fn download(&mut self, args: DownloadArgs) -> anyhow::Result<()> {
        let job_id = match args.job_id {
            Some(id) => JobId::new(id),
            None => {
                let entries = history::load_history(&self.output_dir);
                let entry = history::latest(&entries, None)
                    .ok_or_else(|| anyhow!("no completed job in history; pass a job id"))?;
                JobId::new(entry.job_id.clone())
            }
        };

        self.runner.download_untracked(job_id.clone());
        let deadline = Instant::now() + self.max_wait;
        while Instant::now() < deadline {
            match self.runner.next_event(EVENT_WAIT) {
                Some(EngineEvent::Downloaded {
                    kind: None,
                    job_id: done,
                    result,
                }) if done == job_id => {
                    let path = result.with_context(|| format!("download of {job_id} failed"))?;
                    self.renderer
                        .lines([format!("Saved {} to {}", job_id, path.display())])?;
                    return Ok(());
                }
                Some(other) => self.handle_event(other)?,
                None => {}
            }
        }
        bail!("gave up waiting for the download of {job_id}")
    }

    /// Fail unless the job of `kind` ended `done`; record it in history
    /// when it did.
    fn finish_job(&mut self, kind: JobKind) -> anyhow::Result<()> {
        let tracker = self.state.tracker(kind);
        if !tracker.is_done() {
            let view = self.state.view();
            let job = match kind {
                JobKind::Scrape => view.scrape,
                JobKind::Predict => view.predict,
            };
            let reason = job
                .and_then(|job| job.error)
                .unwrap_or_else(|| "job did not finish".to_string());
            bail!("{kind} failed: {reason}");
        }
        if let Some(snapshot) = tracker.snapshot() {
            history::record(
                &self.output_dir,
                HistoryEntry::completed(kind, snapshot, Utc::now()),
            );
        }
        Ok(())
    }

    fn download_tracked(&mut self, kind: JobKind) -> anyhow::Result<()> {
        self.dispatch(Msg::DownloadClicked(kind))?;
        self.wait_until(kind, |state| {
            !matches!(state.download(kind), Some(DownloadState::Pending))
        })?;
        match self.state.download(kind) {
            Some(DownloadState::Saved(_)) => Ok(()),
            Some(DownloadState::Failed(message)) => {
                ria_warn!("{} download failed: {}", kind, message);
                bail!("{kind} download failed: {message}")
            }
            _ => bail!("no finished {kind} job to download"),
        }
    }
}
