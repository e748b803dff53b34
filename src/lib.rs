pub mod config;
pub mod domain;
pub mod email_client;
pub mod extract;
pub mod fetcher;
pub mod marker_store;
pub mod notifier;
pub mod pipeline;
pub mod rate_limiter;
pub mod routes;
pub mod startup;
pub mod submission_store;
pub mod telemetry;
