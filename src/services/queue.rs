use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::models::job::Job;
use crate::models::scrape::ScrapeParams;
use crate::models::submission::ScrapeRequest;
use crate::services::job_store::{JobStore, StoreError};
use crate::services::scrapers::ScraperSet;
use crate::services::webhook::WebhookDispatcher;
use crate::services::worker;

/// Work waiting in the backlog. Removed exactly once, by the worker.
#[derive(Debug, Clone)]
pub struct PendingEntry {
    pub job_id: Uuid,
    pub params: ScrapeParams,
    pub webhook_url: Option<String>,
    pub organization_id: String,
}

#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Longest idle wait before the worker re-checks the backlog.
    pub poll_interval: Duration,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
        }
    }
}

/// How `shutdown` treats entries still in the backlog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownMode {
    /// Finish the in-flight job only.
    Immediate,
    /// Keep processing until the backlog is empty.
    Drain,
}

/// In-process FIFO job queue with a single background worker.
pub struct JobQueue {
    backlog: Mutex<VecDeque<PendingEntry>>,
    wake: Notify,
    pub(crate) store: Arc<JobStore>,
    pub(crate) scrapers: ScraperSet,
    pub(crate) webhooks: WebhookDispatcher,
    config: QueueConfig,
    started: AtomicBool,
    drain: AtomicBool,
    cancel: CancellationToken,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl JobQueue {
    pub fn new(
        store: Arc<JobStore>,
        scrapers: ScraperSet,
        webhooks: WebhookDispatcher,
        config: QueueConfig,
    ) -> Self {
        Self {
            backlog: Mutex::new(VecDeque::new()),
            wake: Notify::new(),
            store,
            scrapers,
            webhooks,
            config,
            started: AtomicBool::new(false),
            drain: AtomicBool::new(false),
            cancel: CancellationToken::new(),
            worker: Mutex::new(None),
        }
    }

    /// Record a queued job and append it to the backlog. Does not wait for processing.
    pub async fn enqueue(&self, request: ScrapeRequest) -> Result<Job, QueueError> {
        let job = Job::queued(request.params, request.webhook_url, request.organization_id);

        // The record exists before the worker can see the entry.
        self.store.insert(job.clone()).await?;

        let depth = {
            let mut backlog = self.backlog();
            backlog.push_back(PendingEntry {
                job_id: job.id,
                params: job.params.clone(),
                webhook_url: job.webhook_url.clone(),
                organization_id: job.organization_id.clone(),
            });
            backlog.len()
        };
        self.wake.notify_one();

        metrics::counter!("scrape_jobs_submitted_total", "type" => job.kind.to_string()).increment(1);
        metrics::gauge!("scrape_queue_depth").set(depth as f64);
        tracing::info!(job_id = %job.id, job_type = %job.kind, queue_depth = depth, "Job enqueued");

        Ok(job)
    }

    /// Remove the oldest pending entry.
    pub(crate) fn pop_front(&self) -> Option<PendingEntry> {
        let mut backlog = self.backlog();
        let entry = backlog.pop_front();
        metrics::gauge!("scrape_queue_depth").set(backlog.len() as f64);
        entry
    }

    /// Get the current queue depth (pending jobs).
    pub fn queue_depth(&self) -> usize {
        self.backlog().len()
    }

    pub fn is_running(&self) -> bool {
        self.started.load(Ordering::SeqCst)
            && self
                .worker
                .lock()
                .map(|w| w.as_ref().is_some_and(|h| !h.is_finished()))
                .unwrap_or(false)
    }

    /// Spawn the worker. Returns `false` if it was already started.
    pub fn start(self: &Arc<Self>) -> bool {
        if self.started.swap(true, Ordering::SeqCst) {
            tracing::debug!("Job worker already running");
            return false;
        }

        let handle = tokio::spawn(worker::run(Arc::clone(self)));
        if let Ok(mut worker) = self.worker.lock() {
            *worker = Some(handle);
        }
        tracing::info!("Job worker started");
        true
    }

    /// Stop the worker and wait for it to exit. The queue cannot be restarted.
    pub async fn shutdown(&self, mode: ShutdownMode) {
        self.started.store(true, Ordering::SeqCst);
        self.drain.store(mode == ShutdownMode::Drain, Ordering::SeqCst);
        self.cancel.cancel();
        self.wake.notify_one();

        let handle = self.worker.lock().ok().and_then(|mut w| w.take());
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "Job worker terminated abnormally");
            }
        }

        let abandoned = self.queue_depth();
        if abandoned > 0 {
            tracing::warn!(abandoned, "Job worker stopped with pending jobs");
        } else {
            tracing::info!("Job worker stopped");
        }
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Whether the worker should exit now rather than take the next entry.
    pub(crate) fn should_stop(&self) -> bool {
        self.is_cancelled() && !(self.drain.load(Ordering::SeqCst) && self.queue_depth() > 0)
    }

    /// Park until an enqueue, the poll interval, or cancellation.
    pub(crate) async fn wait_for_work(&self) {
        tokio::select! {
            _ = self.wake.notified() => {}
            _ = tokio::time::sleep(self.config.poll_interval) => {}
            _ = self.cancel.cancelled() => {}
        }
    }

    // Backlog critical sections never panic, so a poisoned lock still holds a consistent queue.
    fn backlog(&self) -> MutexGuard<'_, VecDeque<PendingEntry>> {
        self.backlog.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("Job store error: {0}")]
    Store(#[from] StoreError),
}
