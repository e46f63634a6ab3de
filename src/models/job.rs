use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::scrape::{ScrapeParams, ScrapeResults, ScraperKind};

/// Lifecycle status of a scrape job.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

/// A scrape job and its stored outcome.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: ScraperKind,
    pub status: JobStatus,
    pub params: ScrapeParams,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,
    pub organization_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<ScrapeResults>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_at: Option<DateTime<Utc>>,
}

/// Rejected lifecycle transition.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum TransitionError {
    #[error("job {id} is already {status:?}")]
    AlreadyTerminal { id: Uuid, status: JobStatus },
}

impl Job {
    /// Create a freshly queued job with a new identifier.
    pub fn queued(params: ScrapeParams, webhook_url: Option<String>, organization_id: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: params.kind(),
            status: JobStatus::Queued,
            params,
            webhook_url,
            organization_id,
            results: None,
            error: None,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            failed_at: None,
        }
    }

    fn ensure_open(&self) -> Result<(), TransitionError> {
        if self.status.is_terminal() {
            return Err(TransitionError::AlreadyTerminal {
                id: self.id,
                status: self.status,
            });
        }
        Ok(())
    }

    pub fn start(&mut self) -> Result<(), TransitionError> {
        self.ensure_open()?;
        self.status = JobStatus::Running;
        self.started_at = Some(Utc::now());
        Ok(())
    }

    pub fn complete(&mut self, results: ScrapeResults) -> Result<(), TransitionError> {
        self.ensure_open()?;
        self.status = JobStatus::Completed;
        self.results = Some(results);
        self.completed_at = Some(Utc::now());
        Ok(())
    }

    pub fn fail(&mut self, error: impl Into<String>) -> Result<(), TransitionError> {
        self.ensure_open()?;
        self.status = JobStatus::Failed;
        self.error = Some(error.into());
        self.failed_at = Some(Utc::now());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::scrape::{AdIntelligenceParams, AdPlatform};

    fn sample_job() -> Job {
        Job::queued(
            ScrapeParams::AdIntelligence(AdIntelligenceParams {
                domain: "acme.com".to_string(),
                platform: AdPlatform::Google,
            }),
            None,
            "org1".to_string(),
        )
    }

    #[test]
    fn test_new_job_is_queued() {
        let job = sample_job();
        assert_eq!(job.status, JobStatus::Queued);
        assert_eq!(job.kind, ScraperKind::AdIntelligence);
        assert!(job.results.is_none() && job.error.is_none());
    }

    #[test]
    fn test_complete_sets_results_only() {
        let mut job = sample_job();
        job.start().unwrap();
        job.complete(ScrapeResults::AdIntelligence(vec![])).unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        assert!(job.results.is_some());
        assert!(job.error.is_none());
        assert!(job.completed_at.is_some() && job.failed_at.is_none());
    }

    #[test]
    fn test_terminal_status_is_final() {
        let mut job = sample_job();
        job.fail("boom").unwrap();
        assert!(job.complete(ScrapeResults::AdIntelligence(vec![])).is_err());
        assert!(job.start().is_err());
        assert!(job.fail("again").is_err());
        assert_eq!(job.error.as_deref(), Some("boom"));
        assert!(job.results.is_none());
    }

    #[test]
    fn test_serialized_record_shape() {
        let job = sample_job();
        let value = serde_json::to_value(&job).unwrap();
        assert_eq!(value["type"], "ad_intelligence");
        assert_eq!(value["status"], "queued");
        assert_eq!(value["organizationId"], "org1");
        assert_eq!(value["params"]["platform"], "google");
        assert!(value.get("results").is_none());
        assert!(value.get("webhookUrl").is_none());
    }
}
