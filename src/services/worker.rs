//! The single job-processing loop.
//!
//! Takes entries from the head of the backlog one at a time, runs the matching
//! scraper, writes the terminal record and then awaits the webhook before
//! moving on, so notifications go out in completion order.

use std::sync::Arc;
use std::time::Instant;

use crate::models::job::JobStatus;
use crate::services::queue::{JobQueue, PendingEntry};
use crate::services::scrapers::ScraperError;
use crate::services::webhook::{CompletedData, FailedData, ProgressData, WebhookEvent};

/// Worker loop. Runs until the queue is shut down.
pub(crate) async fn run(queue: Arc<JobQueue>) {
    tracing::info!("Worker ready, starting job processing loop");

    loop {
        if queue.should_stop() {
            break;
        }

        match queue.pop_front() {
            Some(entry) => {
                process_job(&queue, entry).await;
                tracing::debug!("Job processed, checking for next job");
            }
            None => {
                if queue.is_cancelled() {
                    break;
                }
                tracing::trace!("No jobs available, waiting");
                queue.wait_for_work().await;
            }
        }
    }

    tracing::info!("Job processing loop exited");
}

/// Run one job to its terminal state and notify the caller.
/// Failures of any kind stay inside this job.
async fn process_job(queue: &JobQueue, entry: PendingEntry) {
    let job_id = entry.job_id;
    let kind = entry.params.kind();

    if let Err(e) = queue.store.mark_running(job_id).await {
        tracing::error!(job_id = %job_id, error = %e, "Failed to mark job running, skipping");
        return;
    }
    tracing::info!(job_id = %job_id, job_type = %kind, "Processing scrape job");

    if let Some(url) = entry.webhook_url.as_deref().filter(|_| queue.webhooks.progress_events()) {
        let event = WebhookEvent::JobProgress(ProgressData {
            job_id,
            status: JobStatus::Running,
        });
        queue.webhooks.notify(url, &event).await;
    }

    let start = Instant::now();

    // Spawned so that a panicking scraper fails this job instead of the loop.
    let scrapers = queue.scrapers.clone();
    let params = entry.params.clone();
    let outcome = match tokio::spawn(async move { scrapers.run(&params).await }).await {
        Ok(result) => result,
        Err(e) => {
            tracing::error!(job_id = %job_id, error = %e, "Scraper task aborted");
            Err(ScraperError::Panicked)
        }
    };

    let elapsed = start.elapsed();
    metrics::histogram!("scrape_job_duration_seconds", "type" => kind.to_string())
        .record(elapsed.as_secs_f64());

    let event = match outcome {
        Ok(results) => {
            let results_count = results.len();
            match queue.store.complete(job_id, results.clone()).await {
                Ok(_) => {
                    metrics::counter!("scrape_jobs_completed_total", "type" => kind.to_string())
                        .increment(1);
                    tracing::info!(
                        job_id = %job_id,
                        job_type = %kind,
                        results_count,
                        duration_ms = elapsed.as_millis() as u64,
                        "Job completed successfully"
                    );
                }
                Err(e) => {
                    tracing::error!(job_id = %job_id, error = %e, "Failed to record job completion");
                    return;
                }
            }

            WebhookEvent::JobCompleted(CompletedData {
                job_id,
                source: kind,
                organization_id: entry.organization_id,
                results_count,
                companies: results,
            })
        }
        Err(e) => {
            let message = e.to_string();
            match queue.store.fail(job_id, &message).await {
                Ok(_) => {
                    metrics::counter!("scrape_jobs_failed_total", "type" => kind.to_string())
                        .increment(1);
                    tracing::warn!(
                        job_id = %job_id,
                        job_type = %kind,
                        error = %message,
                        duration_ms = elapsed.as_millis() as u64,
                        "Job failed"
                    );
                }
                Err(store_err) => {
                    tracing::error!(job_id = %job_id, error = %store_err, "Failed to record job failure");
                    return;
                }
            }

            WebhookEvent::JobFailed(FailedData {
                job_id,
                error: message,
            })
        }
    };

    if let Some(url) = entry.webhook_url.as_deref() {
        queue.webhooks.notify(url, &event).await;
    }
}
