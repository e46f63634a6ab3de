//! Test helper utilities for driving the router in-process

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use lead_scraper::app_state::AppState;
use lead_scraper::models::scrape::{GoogleMapsParams, MapsListing};
use lead_scraper::routes::create_router;
use lead_scraper::services::job_store::JobStore;
use lead_scraper::services::queue::{JobQueue, QueueConfig};
use lead_scraper::services::scrapers::{
    AdIntelligenceScraper, EmailFinder, LinkedInScraper, MxLookup, Scraper, ScraperError,
    ScraperSet,
};
use lead_scraper::services::webhook::{WebhookConfig, WebhookDispatcher};

pub const API_KEY: &str = "test-api-key";
pub const WEBHOOK_SECRET: &str = "test-webhook-secret";

/// Maps stand-in: fails for queries containing "fail", otherwise returns one
/// listing named after the query.
pub struct FakeMaps;

#[async_trait]
impl Scraper for FakeMaps {
    type Params = GoogleMapsParams;
    type Record = MapsListing;

    async fn scrape(&self, params: &GoogleMapsParams) -> Result<Vec<MapsListing>, ScraperError> {
        if params.query.contains("fail") {
            return Err(ScraperError::FeedMissing("results feed never appeared".to_string()));
        }
        Ok(vec![MapsListing {
            name: params.query.clone(),
            category: Some("Cafe".to_string()),
            address: None,
            phone: None,
            website: None,
            rating: Some(4.5),
            review_count: Some(12),
            maps_url: None,
        }])
    }
}

/// Every domain accepts mail.
pub struct AcceptAllMx;

#[async_trait]
impl MxLookup for AcceptAllMx {
    async fn has_mx(&self, _domain: &str) -> Result<bool, ScraperError> {
        Ok(true)
    }
}

pub struct TestApp {
    pub router: Router,
    pub queue: Arc<JobQueue>,
    pub store: Arc<JobStore>,
}

/// Webhook settings used by most tests: shared secret, short timeout, terminal events only.
pub fn webhook_config() -> WebhookConfig {
    WebhookConfig {
        secret: WEBHOOK_SECRET.to_string(),
        timeout: Duration::from_secs(2),
        progress_events: false,
    }
}

/// Fresh store, queue and router. The worker is only started when asked.
pub fn test_app(start_worker: bool) -> TestApp {
    test_app_with(start_worker, webhook_config())
}

pub fn test_app_with(start_worker: bool, webhook: WebhookConfig) -> TestApp {
    let scrapers = ScraperSet {
        google_maps: Arc::new(FakeMaps),
        linkedin: Arc::new(LinkedInScraper),
        email_finder: Arc::new(EmailFinder::new(AcceptAllMx)),
        ad_intelligence: Arc::new(AdIntelligenceScraper),
    };
    let webhooks = WebhookDispatcher::new(webhook).expect("webhook client");

    let store = Arc::new(JobStore::new());
    let queue = Arc::new(JobQueue::new(
        store.clone(),
        scrapers,
        webhooks,
        QueueConfig {
            poll_interval: Duration::from_millis(20),
        },
    ));
    if start_worker {
        queue.start();
    }

    let state = AppState::new(store.clone(), queue.clone(), API_KEY);
    TestApp {
        router: create_router(state, None),
        queue,
        store,
    }
}

/// Send one request. `token` is the bearer value, if any. Empty bodies decode as `Null`.
pub async fn send(
    router: &Router,
    method: &str,
    uri: &str,
    body: Option<&Value>,
    token: Option<&str>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }
    let request = match body {
        Some(json) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(json.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("request");

    let response = router.clone().oneshot(request).await.expect("router is infallible");
    let status = response.status();
    let bytes = response.into_body().collect().await.expect("body").to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, json)
}

pub async fn get(router: &Router, uri: &str) -> (StatusCode, Value) {
    send(router, "GET", uri, None, Some(API_KEY)).await
}

pub async fn post(router: &Router, uri: &str, body: &Value) -> (StatusCode, Value) {
    send(router, "POST", uri, Some(body), Some(API_KEY)).await
}

/// Submit a job and return its id.
pub async fn submit(router: &Router, body: &Value) -> String {
    let (status, json) = post(router, "/scrape", body).await;
    assert_eq!(status, StatusCode::OK, "submission rejected: {}", json);
    json["jobId"].as_str().expect("jobId").to_string()
}

/// Poll the status endpoint until the job reaches `completed` or `failed`.
pub async fn wait_terminal(router: &Router, job_id: &str) -> Value {
    for _ in 0..300 {
        let (status, job) = get(router, &format!("/jobs/{}", job_id)).await;
        assert_eq!(status, StatusCode::OK);
        if job["status"] == "completed" || job["status"] == "failed" {
            return job;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("job {} never reached a terminal status", job_id);
}

/// Wait until the mock server has seen `count` requests and return them.
pub async fn wait_for_requests(server: &wiremock::MockServer, count: usize) -> Vec<wiremock::Request> {
    for _ in 0..300 {
        let received = server.received_requests().await.unwrap_or_default();
        if received.len() >= count {
            return received;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("webhook receiver never saw {} requests", count);
}

/// Same shape as `^[^\s@]+@[^\s@]+\.[^\s@]+$`.
pub fn looks_like_email(candidate: &str) -> bool {
    let mut parts = candidate.split('@');
    let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };
    if local.is_empty() || candidate.chars().any(char::is_whitespace) {
        return false;
    }
    domain
        .char_indices()
        .filter(|(_, c)| *c == '.')
        .any(|(i, _)| i > 0 && i + 1 < domain.len())
}
