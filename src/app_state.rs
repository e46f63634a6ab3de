use std::sync::Arc;

use crate::services::{job_store::JobStore, queue::JobQueue};

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<JobStore>,
    pub queue: Arc<JobQueue>,
    pub api_key: Arc<str>,
}

impl AppState {
    pub fn new(store: Arc<JobStore>, queue: Arc<JobQueue>, api_key: &str) -> Self {
        Self {
            store,
            queue,
            api_key: Arc::from(api_key),
        }
    }
}
