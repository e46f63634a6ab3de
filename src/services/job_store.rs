use std::collections::HashMap;

use serde::Serialize;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::job::{Job, JobStatus, TransitionError};
use crate::models::scrape::ScrapeResults;

/// Per-status job counts, reported by the health endpoint.
#[derive(Debug, Default, Clone, Serialize, PartialEq)]
pub struct StatusCounts {
    pub queued: usize,
    pub running: usize,
    pub completed: usize,
    pub failed: usize,
}

/// In-memory job records keyed by job id.
///
/// Ingress inserts the queued record; only the worker moves a job forward.
#[derive(Default)]
pub struct JobStore {
    jobs: RwLock<HashMap<Uuid, Job>>,
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new queued job.
    pub async fn insert(&self, job: Job) -> Result<(), StoreError> {
        let mut jobs = self.jobs.write().await;
        if jobs.contains_key(&job.id) {
            return Err(StoreError::Duplicate(job.id));
        }
        jobs.insert(job.id, job);
        Ok(())
    }

    pub async fn get(&self, id: Uuid) -> Option<Job> {
        self.jobs.read().await.get(&id).cloned()
    }

    pub async fn mark_running(&self, id: Uuid) -> Result<Job, StoreError> {
        self.update(id, |job| job.start()).await
    }

    pub async fn complete(&self, id: Uuid, results: ScrapeResults) -> Result<Job, StoreError> {
        self.update(id, |job| job.complete(results)).await
    }

    pub async fn fail(&self, id: Uuid, error: &str) -> Result<Job, StoreError> {
        self.update(id, |job| job.fail(error)).await
    }

    pub async fn counts(&self) -> StatusCounts {
        let jobs = self.jobs.read().await;
        let mut counts = StatusCounts::default();
        for job in jobs.values() {
            match job.status {
                JobStatus::Queued => counts.queued += 1,
                JobStatus::Running => counts.running += 1,
                JobStatus::Completed => counts.completed += 1,
                JobStatus::Failed => counts.failed += 1,
            }
        }
        counts
    }

    async fn update<F>(&self, id: Uuid, apply: F) -> Result<Job, StoreError>
    where
        F: FnOnce(&mut Job) -> Result<(), TransitionError>,
    {
        let mut jobs = self.jobs.write().await;
        let job = jobs.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        apply(job)?;
        Ok(job.clone())
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum StoreError {
    #[error("Job {0} not found")]
    NotFound(Uuid),

    #[error("Job {0} already exists")]
    Duplicate(Uuid),

    #[error(transparent)]
    Transition(#[from] TransitionError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::scrape::{EmailFinderParams, ScrapeParams};

    fn sample_job() -> Job {
        Job::queued(
            ScrapeParams::EmailFinder(EmailFinderParams {
                company_name: "Acme Corp".to_string(),
                domain: None,
                first_name: None,
                last_name: None,
            }),
            None,
            "org1".to_string(),
        )
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let store = JobStore::new();
        let job = sample_job();
        let id = job.id;
        store.insert(job.clone()).await.unwrap();
        assert_eq!(store.get(id).await.unwrap().status, JobStatus::Queued);
        assert_eq!(store.insert(job).await, Err(StoreError::Duplicate(id)));
    }

    #[tokio::test]
    async fn test_unknown_id() {
        let store = JobStore::new();
        let id = Uuid::new_v4();
        assert!(store.get(id).await.is_none());
        assert_eq!(store.fail(id, "x").await.unwrap_err(), StoreError::NotFound(id));
    }

    #[tokio::test]
    async fn test_terminal_write_happens_once() {
        let store = JobStore::new();
        let job = sample_job();
        let id = job.id;
        store.insert(job).await.unwrap();
        store.mark_running(id).await.unwrap();
        store.complete(id, ScrapeResults::EmailFinder(vec![])).await.unwrap();

        let err = store.fail(id, "late failure").await.unwrap_err();
        assert!(matches!(err, StoreError::Transition(_)));

        let stored = store.get(id).await.unwrap();
        assert_eq!(stored.status, JobStatus::Completed);
        assert!(stored.error.is_none());
    }

    #[tokio::test]
    async fn test_counts() {
        let store = JobStore::new();
        let a = sample_job();
        let b = sample_job();
        let b_id = b.id;
        store.insert(a).await.unwrap();
        store.insert(b).await.unwrap();
        store.fail(b_id, "nope").await.unwrap();

        let counts = store.counts().await;
        assert_eq!(counts.queued, 1);
        assert_eq!(counts.failed, 1);
        assert_eq!(counts.completed + counts.running, 0);
    }
}
