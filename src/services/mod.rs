pub mod job_store;
pub mod queue;
pub mod scrapers;
pub mod webhook;
pub(crate) mod worker;
