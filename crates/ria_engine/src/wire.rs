//! JSON bodies exchanged with the RIA server.

use ria_core::{JobStatus, Preview, PreviewRow, ScrapeParams, StatusUpdate, DATE_FORMAT};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub(crate) struct ScrapeBody<'a> {
    pub start_date: String,
    pub end_date: String,
    pub doc_types: &'a [String],
}

impl<'a> ScrapeBody<'a> {
    pub fn new(params: &'a ScrapeParams) -> Self {
        Self {
            start_date: params.start_date.format(DATE_FORMAT).to_string(),
            end_date: params.end_date.format(DATE_FORMAT).to_string(),
            doc_types: &params.doc_types,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct SubmitResponse {
    pub job_id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DocumentTypesResponse {
    pub types: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StatusResponse {
    pub status: String,
    #[serde(default)]
    pub progress: Option<f64>,
    #[serde(default)]
    pub progress_text: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub count: Option<u64>,
    #[serde(default)]
    pub filename: Option<String>,
}

impl From<StatusResponse> for StatusUpdate {
    fn from(raw: StatusResponse) -> Self {
        StatusUpdate {
            status: JobStatus::from_wire(&raw.status),
            progress: raw
                .progress
                .filter(|value| value.is_finite())
                .map(|value| StatusUpdate::percent(value.round() as i64)),
            progress_text: raw.progress_text.filter(|text| !text.is_empty()),
            error: raw.error,
            count: raw.count,
            filename: raw.filename,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct PreviewResponse {
    #[serde(default)]
    pub data: Vec<RowBody>,
    #[serde(default)]
    pub total: u64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RowBody {
    #[serde(default)]
    pub ref_number: String,
    #[serde(default)]
    pub pub_date: String,
    #[serde(default)]
    pub short_text: String,
    #[serde(default)]
    pub url: String,
}

impl From<PreviewResponse> for Preview {
    fn from(raw: PreviewResponse) -> Self {
        Preview {
            rows: raw
                .data
                .into_iter()
                .map(|row| PreviewRow {
                    ref_number: row.ref_number,
                    pub_date: row.pub_date,
                    short_text: row.short_text,
                    url: row.url,
                })
                .collect(),
            total: raw.total,
        }
    }
}

/// FastAPI error body; `detail` is a string for HTTPException and a list
/// for request validation failures.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub detail: serde_json::Value,
}

impl ErrorBody {
    pub fn message(&self) -> String {
        match &self.detail {
            serde_json::Value::String(text) => text.clone(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn scrape_body_uses_iso_dates() {
        let params = ScrapeParams {
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
            doc_types: vec!["Koninklijk besluit".into()],
        };
        let json = serde_json::to_value(ScrapeBody::new(&params)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "start_date": "2024-01-01",
                "end_date": "2024-01-31",
                "doc_types": ["Koninklijk besluit"],
            })
        );
    }

    #[test]
    fn status_tolerates_nulls_and_extra_fields() {
        let raw: StatusResponse = serde_json::from_str(
            r#"{"status":"scraping","progress":42,"progress_text":"","error":null,"extra":1}"#,
        )
        .unwrap();
        let update = StatusUpdate::from(raw);
        assert_eq!(update.status, JobStatus::Scraping);
        assert_eq!(update.progress, Some(42));
        assert_eq!(update.progress_text, None);
        assert_eq!(update.error, None);
    }

    #[test]
    fn error_detail_accepts_string_and_list() {
        let text: ErrorBody = serde_json::from_str(r#"{"detail":"Job not found"}"#).unwrap();
        assert_eq!(text.message(), "Job not found");
        let list: ErrorBody =
            serde_json::from_str(r#"{"detail":[{"msg":"field required"}]}"#).unwrap();
        assert!(list.message().contains("field required"));
    }
}
