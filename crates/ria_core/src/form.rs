use std::fmt;

use chrono::NaiveDate;

pub const DEFAULT_DOC_TYPE: &str = "Koninklijk besluit";
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Raw form input as the user typed it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeForm {
    pub start_date: String,
    pub end_date: String,
    pub doc_type: String,
}

impl Default for ScrapeForm {
    fn default() -> Self {
        Self {
            start_date: String::new(),
            end_date: String::new(),
            doc_type: DEFAULT_DOC_TYPE.to_string(),
        }
    }
}

/// Validated scrape submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeParams {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub doc_types: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormError {
    MissingDate,
    InvalidDate(String),
    EndBeforeStart,
    MissingDocType,
}

impl fmt::Display for FormError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormError::MissingDate => write!(f, "start and end date are required"),
            FormError::InvalidDate(raw) => write!(f, "invalid date {raw:?}, expected YYYY-MM-DD"),
            FormError::EndBeforeStart => write!(f, "end_date must be after start_date"),
            FormError::MissingDocType => write!(f, "a document type is required"),
        }
    }
}

impl ScrapeForm {
    pub fn is_complete(&self) -> bool {
        !self.start_date.trim().is_empty() && !self.end_date.trim().is_empty()
    }

    pub fn validate(&self) -> Result<ScrapeParams, FormError> {
        if !self.is_complete() {
            return Err(FormError::MissingDate);
        }
        let start_date = parse_date(&self.start_date)?;
        let end_date = parse_date(&self.end_date)?;
        if end_date < start_date {
            return Err(FormError::EndBeforeStart);
        }
        let doc_type = self.doc_type.trim();
        if doc_type.is_empty() {
            return Err(FormError::MissingDocType);
        }
        Ok(ScrapeParams {
            start_date,
            end_date,
            doc_types: vec![doc_type.to_string()],
        })
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate, FormError> {
    let trimmed = raw.trim();
    NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
        .map_err(|_| FormError::InvalidDate(trimmed.to_string()))
}
