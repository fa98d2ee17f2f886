use std::env;
use std::path::PathBuf;
use std::time::Duration;

use log::LevelFilter;
use ria_engine::{ApiError, ApiSettings, EngineSettings, PollSettings, DEFAULT_BASE_URL};
use thiserror::Error;
use url::Url;

use crate::cli::GlobalArgs;
use crate::logging::LogDestination;

const DEFAULT_OUTPUT_DIR: &str = "./output";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("RIA_API_URL is not a valid url: {0}")]
    InvalidUrl(String),
    #[error("RIA_LOG: {0}")]
    InvalidLogDestination(String),
    #[error("RIA_REQUEST_TIMEOUT_SECS must be a positive number of seconds, got {0:?}")]
    InvalidTimeout(String),
}

/// Runtime configuration: `.env`, then the process environment, then
/// command line flags.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub api_url: Url,
    pub output_dir: PathBuf,
    pub log: LogDestination,
    pub log_level: LevelFilter,
    pub request_timeout: Duration,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_url = parse_url(
            lookup("RIA_API_URL")
                .as_deref()
                .unwrap_or(DEFAULT_BASE_URL),
        )?;

        let output_dir = lookup("RIA_OUTPUT_DIR")
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));

        let log = match lookup("RIA_LOG") {
            Some(value) => value
                .parse()
                .map_err(ConfigError::InvalidLogDestination)?,
            None => LogDestination::default(),
        };

        let request_timeout = match lookup("RIA_REQUEST_TIMEOUT_SECS") {
            Some(value) => parse_timeout(&value)?,
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        Ok(Self {
            api_url,
            output_dir,
            log,
            log_level: LevelFilter::Info,
            request_timeout,
        })
    }

    pub fn apply_overrides(&mut self, args: &GlobalArgs) -> Result<(), ConfigError> {
        if let Some(api_url) = &args.api_url {
            self.api_url = parse_url(api_url)?;
        }
        if let Some(output_dir) = &args.output_dir {
            self.output_dir = output_dir.clone();
        }
        if let Some(log) = args.log {
            self.log = log;
        }
        if args.verbose {
            self.log_level = LevelFilter::Debug;
        }
        Ok(())
    }

    pub fn engine_settings(&self) -> Result<EngineSettings, ApiError> {
        let mut api = ApiSettings::with_base_url(self.api_url.as_str())?;
        api.request_timeout = self.request_timeout;
        Ok(EngineSettings {
            api,
            poll: PollSettings::default(),
        })
    }
}

fn parse_url(value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value.trim()).map_err(|err| ConfigError::InvalidUrl(err.to_string()))?;
    if url.cannot_be_a_base() {
        return Err(ConfigError::InvalidUrl(format!("{url} cannot be a base url")));
    }
    Ok(url)
}

fn parse_timeout(value: &str) -> Result<Duration, ConfigError> {
    match value.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(ConfigError::InvalidTimeout(value.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use pretty_assertions::assert_eq;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.api_url.as_str(), "http://localhost:8000/");
        assert_eq!(config.output_dir, PathBuf::from("./output"));
        assert_eq!(config.log, LogDestination::Terminal);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn environment_values_are_read() {
        let config = config_from(&[
            ("RIA_API_URL", "https://ria.example.test/api-root/"),
            ("RIA_OUTPUT_DIR", "/tmp/ria"),
            ("RIA_LOG", "both"),
            ("RIA_REQUEST_TIMEOUT_SECS", "5"),
        ])
        .unwrap();
        assert_eq!(config.api_url.as_str(), "https://ria.example.test/api-root/");
        assert_eq!(config.output_dir, PathBuf::from("/tmp/ria"));
        assert_eq!(config.log, LogDestination::Both);
        assert_eq!(config.request_timeout, Duration::from_secs(5));
    }

    #[test]
    fn invalid_values_are_reported() {
        assert!(matches!(
            config_from(&[("RIA_API_URL", "localhost:8000")]),
            Err(ConfigError::InvalidUrl(_))
        ));
        assert!(matches!(
            config_from(&[("RIA_LOG", "syslog")]),
            Err(ConfigError::InvalidLogDestination(_))
        ));
        assert_eq!(
            config_from(&[("RIA_REQUEST_TIMEOUT_SECS", "0")]),
            Err(ConfigError::InvalidTimeout("0".to_string()))
        );
    }

    #[test]
    fn flags_override_environment() {
        let mut config = config_from(&[("RIA_LOG", "file")]).unwrap();
        let args = GlobalArgs {
            api_url: Some("http://10.0.0.2:9000".to_string()),
            output_dir: Some(PathBuf::from("results")),
            log: Some(LogDestination::Terminal),
            verbose: true,
            wait_secs: 60,
        };
        config.apply_overrides(&args).unwrap();
        assert_eq!(config.api_url.as_str(), "http://10.0.0.2:9000/");
        assert_eq!(config.output_dir, PathBuf::from("results"));
        assert_eq!(config.log, LogDestination::Terminal);
        assert_eq!(config.log_level, LevelFilter::Debug);
    }
}
