use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::logging::LogDestination;

/// Client for the Staatsblad RIA scraping and classification server.
#[derive(Debug, Parser)]
#[command(name = "ria", version, about)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Args)]
pub struct GlobalArgs {
    /// Server base url; overrides RIA_API_URL.
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Directory for downloads and job history; overrides RIA_OUTPUT_DIR.
    #[arg(long, global = true)]
    pub output_dir: Option<PathBuf>,

    /// terminal, file or both; overrides RIA_LOG.
    #[arg(long, global = true)]
    pub log: Option<LogDestination>,

    /// Log at debug level.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Stop following a job after this many seconds.
    #[arg(long, global = true, default_value_t = 3600)]
    pub wait_secs: u64,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// List the document types the server can scrape.
    DocTypes,
    /// Scrape documents published in a date range.
    Scrape(ScrapeArgs),
    /// Classify the documents of a finished scrape job.
    Predict(PredictArgs),
    /// Save the result file of a finished job.
    Download(DownloadArgs),
    /// Show jobs completed from this machine.
    History,
}

#[derive(Debug, Clone, Args)]
pub struct ScrapeArgs {
    /// First publication date, YYYY-MM-DD.
    #[arg(long)]
    pub start: String,

    /// Last publication date, YYYY-MM-DD.
    #[arg(long)]
    pub end: String,

    /// Document type to scrape.
    #[arg(long)]
    pub doc_type: Option<String>,

    /// Classify the scraped documents when the scrape finishes.
    #[arg(long)]
    pub predict: bool,

    /// Save the result files when the jobs finish.
    #[arg(long)]
    pub download: bool,
}

#[derive(Debug, Clone, Args)]
pub struct PredictArgs {
    /// Scrape job to classify; defaults to the last completed scrape.
    pub scrape_job_id: Option<String>,

    /// Save the predictions file when the job finishes.
    #[arg(long)]
    pub download: bool,
}

#[derive(Debug, Clone, Args)]
pub struct DownloadArgs {
    /// Job whose file to save; defaults to the last completed job.
    pub job_id: Option<String>,
}
