use std::time::Duration;

use futures_util::StreamExt;
use reqwest::header::{HeaderName, CONTENT_DISPOSITION, CONTENT_TYPE};
use ria_core::{JobId, Preview, ScrapeParams, StatusUpdate};
use serde::de::DeserializeOwned;
use url::Url;

use crate::wire::{
    DocumentTypesResponse, ErrorBody, PreviewResponse, ScrapeBody, StatusResponse, SubmitResponse,
};
use crate::{ApiError, FailureKind};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub base_url: Url,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub max_download_bytes: u64,
}

impl ApiSettings {
    pub fn with_base_url(base_url: &str) -> Result<Self, ApiError> {
        let base_url = Url::parse(base_url)
            .map_err(|err| ApiError::new(FailureKind::InvalidUrl, err.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::new(
                FailureKind::InvalidUrl,
                format!("{base_url} cannot be used as a base url"),
            ));
        }
        Ok(Self {
            base_url,
            ..Self::default()
        })
    }
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base url is valid"),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            max_download_bytes: 100 * 1024 * 1024,
        }
    }
}

/// Result file of a finished job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Name suggested by the server in `Content-Disposition`.
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// The server operations the job trackers depend on.
#[async_trait::async_trait]
pub trait RiaApi: Send + Sync {
    async fn document_types(&self) -> Result<Vec<String>, ApiError>;

    async fn submit_scrape(&self, params: &ScrapeParams) -> Result<JobId, ApiError>;

    async fn submit_predict(&self, scrape_job_id: &JobId) -> Result<JobId, ApiError>;

    async fn job_status(&self, job_id: &JobId) -> Result<StatusUpdate, ApiError>;

    async fn preview(&self, job_id: &JobId) -> Result<Preview, ApiError>;

    async fn download(&self, job_id: &JobId) -> Result<Artifact, ApiError>;

    /// True when the server answers its health check with `{"status":"ok"}`.
    async fn health(&self) -> Result<bool, ApiError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestApi {
    client: reqwest::Client,
    settings: ApiSettings,
}

impl ReqwestApi {
    pub fn new(settings: ApiSettings) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| ApiError::new(FailureKind::Network, err.to_string()))?;
        Ok(Self { client, settings })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.settings.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::new(FailureKind::InvalidUrl, "base url cannot have paths"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
        let response = self.client.get(url).send().await.map_err(map_reqwest_error)?;
        decode_json(checked(response).await?).await
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        url: Url,
        body: Option<Vec<u8>>,
    ) -> Result<T, ApiError> {
        let mut request = self.client.post(url);
        if let Some(body) = body {
            request = request.header(CONTENT_TYPE, "application/json").body(body);
        }
        let response = request.send().await.map_err(map_reqwest_error)?;
        decode_json(checked(response).await?).await
    }
}

#[async_trait::async_trait]
impl RiaApi for ReqwestApi {
    async fn document_types(&self) -> Result<Vec<String>, ApiError> {
        let url = self.endpoint(&["api", "document-types"])?;
        let body: DocumentTypesResponse = self.get_json(url).await?;
        Ok(body.types)
    }

    async fn submit_scrape(&self, params: &ScrapeParams) -> Result<JobId, ApiError> {
        let url = self.endpoint(&["api", "scrape"])?;
        let body = serde_json::to_vec(&ScrapeBody::new(params))
            .map_err(|err| ApiError::new(FailureKind::InvalidRequest, err.to_string()))?;
        let response: SubmitResponse = self.post_json(url, Some(body)).await?;
        Ok(JobId::new(response.job_id))
    }

    async fn submit_predict(&self, scrape_job_id: &JobId) -> Result<JobId, ApiError> {
        let url = self.endpoint(&["api", "predict", scrape_job_id.as_str()])?;
        let response: SubmitResponse = self.post_json(url, None).await?;
        Ok(JobId::new(response.job_id))
    }

    async fn job_status(&self, job_id: &JobId) -> Result<StatusUpdate, ApiError> {
        let url = self.endpoint(&["api", "jobs", job_id.as_str()])?;
        let body: StatusResponse = self.get_json(url).await?;
        Ok(body.into())
    }

    async fn preview(&self, job_id: &JobId) -> Result<Preview, ApiError> {
        let url = self.endpoint(&["api", "jobs", job_id.as_str(), "preview"])?;
        let body: PreviewResponse = self.get_json(url).await?;
        Ok(body.into())
    }

    async fn download(&self, job_id: &JobId) -> Result<Artifact, ApiError> {
        let url = self.endpoint(&["api", "download", job_id.as_str()])?;
        let response = self.client.get(url).send().await.map_err(map_reqwest_error)?;
        let response = checked(response).await?;

        let max_bytes = self.settings.max_download_bytes;
        if let Some(content_len) = response.content_length() {
            if content_len > max_bytes {
                return Err(ApiError::new(
                    FailureKind::TooLarge {
                        max_bytes,
                        actual: Some(content_len),
                    },
                    "artifact too large",
                ));
            }
        }

        let filename = header_value(&response, CONTENT_DISPOSITION)
            .as_deref()
            .and_then(crate::filename::disposition_filename);
        let content_type = header_value(&response, CONTENT_TYPE);

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = bytes.len() as u64 + chunk.len() as u64;
            if next_len > max_bytes {
                return Err(ApiError::new(
                    FailureKind::TooLarge {
                        max_bytes,
                        actual: Some(next_len),
                    },
                    "artifact too large",
                ));
            }
            bytes.extend_from_slice(&chunk);
        }

        Ok(Artifact {
            filename,
            content_type,
            bytes,
        })
    }

    async fn health(&self) -> Result<bool, ApiError> {
        let url = self.endpoint(&["health"])?;
        let body: serde_json::Value = self.get_json(url).await?;
        Ok(body.get("status").and_then(|s| s.as_str()) == Some("ok"))
    }
}

/// Turn non-success responses into `HttpStatus` errors carrying the
/// server's `detail` message when it sent one.
async fn checked(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.bytes().await.unwrap_or_default();
    let message = serde_json::from_slice::<ErrorBody>(&body)
        .map(|err| err.message())
        .unwrap_or_else(|_| status.to_string());
    Err(ApiError::new(FailureKind::HttpStatus(status.as_u16()), message))
}

async fn decode_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
    let body = response.bytes().await.map_err(map_reqwest_error)?;
    serde_json::from_slice(&body).map_err(|err| ApiError::new(FailureKind::Decode, err.to_string()))
}

fn header_value(response: &reqwest::Response, name: HeaderName) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_string())
}

fn map_reqwest_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        return ApiError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_decode() {
        return ApiError::new(FailureKind::Decode, err.to_string());
    }
    ApiError::new(FailureKind::Network, err.to_string())
}
