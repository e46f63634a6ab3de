use chrono::{DateTime, Utc};
use garde::Validate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::job::JobStatus;
use crate::models::scrape::{ScrapeParams, ScraperKind};

/// Raw body of `POST /scrape`. `params` is decoded once `type` is known.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeRequestBody {
    #[garde(skip)]
    #[serde(rename = "type")]
    pub kind: ScraperKind,

    #[garde(skip)]
    #[serde(default)]
    pub params: serde_json::Value,

    #[garde(url)]
    #[serde(default)]
    pub webhook_url: Option<String>,

    #[garde(length(min = 1, max = 200))]
    pub organization_id: String,
}

/// A fully validated submission, ready to enqueue.
#[derive(Debug, Clone)]
pub struct ScrapeRequest {
    pub params: ScrapeParams,
    pub webhook_url: Option<String>,
    pub organization_id: String,
}

/// One failed validation rule, reported back to the caller.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ValidationIssue {
    pub path: String,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Flatten a garde report, prefixing each path.
    pub fn from_report(prefix: Option<&str>, report: &garde::Report) -> Vec<Self> {
        report
            .iter()
            .map(|(path, error)| {
                let path = path.to_string();
                let path = match prefix {
                    Some(prefix) if path.is_empty() => prefix.to_string(),
                    Some(prefix) => format!("{}.{}", prefix, path),
                    None => path,
                };
                ValidationIssue::new(path, error.to_string())
            })
            .collect()
    }
}

impl ScrapeRequestBody {
    /// Validate the envelope and decode the type-specific params.
    pub fn into_request(self) -> Result<ScrapeRequest, Vec<ValidationIssue>> {
        let mut issues = match self.validate() {
            Ok(()) => Vec::new(),
            Err(report) => ValidationIssue::from_report(None, &report),
        };

        let params = match ScrapeParams::from_value(self.kind, self.params) {
            Ok(params) => {
                if let Err(report) = params.validate() {
                    issues.extend(ValidationIssue::from_report(Some("params"), &report));
                }
                Some(params)
            }
            Err(e) => {
                issues.push(ValidationIssue::new("params", e.to_string()));
                None
            }
        };

        match params {
            Some(params) if issues.is_empty() => Ok(ScrapeRequest {
                params,
                webhook_url: self.webhook_url,
                organization_id: self.organization_id,
            }),
            _ => Err(issues),
        }
    }
}

/// Response after submitting a scrape job.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub job_id: Uuid,
    pub status: JobStatus,
    #[serde(rename = "type")]
    pub kind: ScraperKind,
    pub created_at: DateTime<Utc>,
}
