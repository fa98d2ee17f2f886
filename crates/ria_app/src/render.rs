use std::io::{self, Write};

use ria_core::{AppViewModel, DownloadState, JobStatus, JobView, PreviewView};

use crate::history::HistoryEntry;

const SHORT_TEXT_WIDTH: usize = 60;

/// Prints view models as plain lines, skipping lines already shown by the
/// previous render.
pub struct Renderer<W: Write> {
    out: W,
    shown: Vec<String>,
}

impl<W: Write> Renderer<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            shown: Vec::new(),
        }
    }

    pub fn render(&mut self, view: &AppViewModel) -> io::Result<()> {
        let lines = status_lines(view);
        for line in &lines {
            if !self.shown.contains(line) {
                writeln!(self.out, "{line}")?;
            }
        }
        self.shown = lines;
        self.out.flush()
    }

    pub fn lines<I>(&mut self, lines: I) -> io::Result<()>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        for line in lines {
            writeln!(self.out, "{}", line.as_ref())?;
        }
        self.out.flush()
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }
}

pub fn status_lines(view: &AppViewModel) -> Vec<String> {
    let mut lines = Vec::new();
    lines.extend(view.scrape.as_ref().map(job_line));
    lines.extend(view.predict.as_ref().map(job_line));
    if let Some(error) = &view.preview_error {
        lines.push(format!("preview unavailable: {error}"));
    }
    for download in &view.downloads {
        match &download.state {
            DownloadState::Pending => {}
            DownloadState::Saved(path) => {
                lines.push(format!("{} file saved to {}", download.kind, path.display()))
            }
            DownloadState::Failed(message) => {
                lines.push(format!("{} download failed: {message}", download.kind))
            }
        }
    }
    if let Some(notice) = &view.notice {
        lines.push(format!("! {notice}"));
    }
    lines
}

pub fn job_line(job: &JobView) -> String {
    let mut line = match &job.job_id {
        Some(id) => format!("{} {}: {}", job.kind, id, job.status_label),
        None => format!("{}: {}", job.kind, job.status_label),
    };
    if let Some(progress) = job.progress {
        line.push_str(&format!(" {progress}%"));
    }
    if job.active {
        if let Some(text) = &job.progress_text {
            line.push_str(&format!(" ({text})"));
        }
    }
    if job.status == Some(JobStatus::Done) {
        if let Some(count) = job.count {
            line.push_str(&format!(" ({count} documents)"));
        }
    }
    if let Some(error) = &job.error {
        line.push_str(&format!(": {error}"));
    }
    if job.stopped {
        line.push_str(" [stopped]");
    }
    line
}

pub fn preview_table(preview: &PreviewView) -> Vec<String> {
    if preview.total == 0 {
        return vec!["No documents found.".to_string()];
    }
    let mut lines = vec![format!(
        "Showing first {} of {} documents",
        preview.rows.len(),
        preview.total
    )];
    for row in &preview.rows {
        lines.push(format!(
            "  {:<12} {:<10}  {}  {}",
            row.ref_number,
            row.pub_date,
            truncate(&row.short_text, SHORT_TEXT_WIDTH),
            row.url
        ));
    }
    lines
}

pub fn history_lines(entries: &[HistoryEntry]) -> Vec<String> {
    if entries.is_empty() {
        return vec!["No completed jobs yet.".to_string()];
    }
    entries
        .iter()
        .rev()
        .map(|entry| {
            let mut line = format!("{}  {:<8} {}", entry.completed_at, entry.kind, entry.job_id);
            if let Some(count) = entry.count {
                line.push_str(&format!("  {count} documents"));
            }
            if let Some(filename) = &entry.filename {
                line.push_str(&format!("  {filename}"));
            }
            line
        })
        .collect()
}

fn truncate(text: &str, width: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= width {
        return text.to_string();
    }
    let cut: String = text.chars().take(width.saturating_sub(3)).collect();
    format!("{}...", cut.trim_end())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use ria_core::{JobKind, PreviewRow};

    use super::*;

    fn job(status: JobStatus) -> JobView {
        JobView {
            kind: JobKind::Scrape,
            job_id: Some("abc".to_string()),
            status_label: status.label().to_string(),
            status: Some(status),
            progress: None,
            progress_text: None,
            error: None,
            count: None,
            active: false,
            stopped: false,
        }
    }

    #[test]
    fn running_job_shows_progress_and_text() {
        let view = JobView {
            progress: Some(40),
            progress_text: Some("page 2 of 5".to_string()),
            active: true,
            ..job(JobStatus::Scraping)
        };
        assert_eq!(job_line(&view), "scrape abc: Scraping 40% (page 2 of 5)");
    }

    #[test]
    fn terminal_jobs_show_count_or_error() {
        let done = JobView {
            count: Some(12),
            ..job(JobStatus::Done)
        };
        assert_eq!(job_line(&done), "scrape abc: Done (12 documents)");

        let failed = JobView {
            error: Some("site unreachable".to_string()),
            ..job(JobStatus::Error)
        };
        assert_eq!(job_line(&failed), "scrape abc: Error: site unreachable");

        let stopped = JobView {
            stopped: true,
            ..job(JobStatus::Other("paused".to_string()))
        };
        assert_eq!(job_line(&stopped), "scrape abc: paused [stopped]");
    }

    #[test]
    fn preview_header_counts_rows_and_total() {
        let rows = (0..10)
            .map(|n| PreviewRow {
                ref_number: format!("2024{n:03}"),
                pub_date: "2024-01-02".to_string(),
                short_text: "x".repeat(80),
                url: format!("https://example.test/{n}"),
            })
            .collect();
        let lines = preview_table(&PreviewView { rows, total: 42 });
        assert_eq!(lines.len(), 11);
        assert_eq!(lines[0], "Showing first 10 of 42 documents");
        assert!(lines[1].contains(&format!("{}...", "x".repeat(57))));
        assert!(lines[1].ends_with("https://example.test/0"));
    }

    #[test]
    fn renderer_prints_only_changed_lines() {
        let mut renderer = Renderer::new(Vec::new());
        let mut view = AppViewModel {
            scrape: Some(job(JobStatus::Queued)),
            ..AppViewModel::default()
        };
        renderer.render(&view).unwrap();
        renderer.render(&view).unwrap();
        view.notice = Some("end_date must be after start_date".to_string());
        renderer.render(&view).unwrap();

        let output = String::from_utf8(renderer.into_inner()).unwrap();
        assert_eq!(
            output,
            "scrape abc: Queued\n! end_date must be after start_date\n"
        );
    }
}
