//! Signed webhook delivery.
//!
//! Every notification is serialized once, signed with HMAC-SHA256 over the
//! exact bytes sent, and POSTed with the hex digest in `X-Webhook-Signature`.
//! Delivery is a single attempt: failures are logged and never retried.

use std::time::Duration;

use hmac::{Hmac, Mac};
use reqwest::Client;
use serde::Serialize;
use sha2::Sha256;
use uuid::Uuid;

use crate::models::job::JobStatus;
use crate::models::scrape::{ScrapeResults, ScraperKind};

pub const SIGNATURE_HEADER: &str = "X-Webhook-Signature";

type HmacSha256 = Hmac<Sha256>;

/// Settings for the webhook dispatcher.
#[derive(Debug, Clone)]
pub struct WebhookConfig {
    /// Shared HMAC key. Empty when no secret is configured.
    pub secret: String,
    pub timeout: Duration,
    /// Also announce jobs when they start running.
    pub progress_events: bool,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            timeout: Duration::from_secs(10),
            progress_events: false,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedData {
    pub job_id: Uuid,
    pub source: ScraperKind,
    pub organization_id: String,
    pub results_count: usize,
    pub companies: ScrapeResults,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedData {
    pub job_id: Uuid,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressData {
    pub job_id: Uuid,
    pub status: JobStatus,
}

/// Outbound notification body: `{ "event": ..., "data": ... }`.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data")]
pub enum WebhookEvent {
    #[serde(rename = "job.completed")]
    JobCompleted(CompletedData),
    #[serde(rename = "job.failed")]
    JobFailed(FailedData),
    #[serde(rename = "job.progress")]
    JobProgress(ProgressData),
}

impl WebhookEvent {
    pub fn name(&self) -> &'static str {
        match self {
            WebhookEvent::JobCompleted(_) => "job.completed",
            WebhookEvent::JobFailed(_) => "job.failed",
            WebhookEvent::JobProgress(_) => "job.progress",
        }
    }
}

/// Hex-encoded HMAC-SHA256 of `body` under `secret`.
pub fn sign(secret: &str, body: &[u8]) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts keys of any length");
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

/// Constant-time check of a hex signature against `body`.
pub fn verify_signature(secret: &str, body: &[u8], signature_hex: &str) -> bool {
    let Ok(expected) = hex::decode(signature_hex.trim()) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}

/// Signs and POSTs job notifications to caller-supplied URLs.
pub struct WebhookDispatcher {
    http: Client,
    config: WebhookConfig,
}

impl WebhookDispatcher {
    pub fn new(config: WebhookConfig) -> Result<Self, WebhookError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("lead-scraper/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(WebhookError::Http)?;
        Ok(Self { http, config })
    }

    pub fn progress_events(&self) -> bool {
        self.config.progress_events
    }

    /// Single delivery attempt. Returns an error for transport failures and non-2xx replies.
    pub async fn send(&self, url: &str, event: &WebhookEvent) -> Result<(), WebhookError> {
        let body = serde_json::to_vec(event).map_err(WebhookError::Serialize)?;
        let signature = sign(&self.config.secret, &body);

        let response = self
            .http
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .header(SIGNATURE_HEADER, signature)
            .body(body)
            .send()
            .await
            .map_err(WebhookError::Http)?;

        let status = response.status();
        if !status.is_success() {
            return Err(WebhookError::Rejected(status.as_u16()));
        }
        Ok(())
    }

    /// Deliver an event, logging and swallowing any failure.
    pub async fn notify(&self, url: &str, event: &WebhookEvent) {
        let name = event.name();
        match self.send(url, event).await {
            Ok(()) => {
                metrics::counter!("webhook_deliveries_total", "event" => name, "outcome" => "delivered")
                    .increment(1);
                tracing::debug!(event = name, url = %url, "Webhook delivered");
            }
            Err(e) => {
                metrics::counter!("webhook_deliveries_total", "event" => name, "outcome" => "failed")
                    .increment(1);
                tracing::warn!(event = name, url = %url, error = %e, "Webhook delivery failed");
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    #[error("Webhook HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Webhook receiver returned HTTP {0}")]
    Rejected(u16),

    #[error("Failed to serialize webhook payload: {0}")]
    Serialize(#[from] serde_json::Error),
}
