//! Lead-generation scraping service
//!
//! Accepts scrape requests over HTTP, runs them one at a time on a background
//! worker, stores job state in memory and notifies callers through signed
//! webhooks when a job finishes.

pub mod app_state;
pub mod config;
pub mod models;
pub mod routes;
pub mod services;
