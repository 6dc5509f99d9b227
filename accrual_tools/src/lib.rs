//! A client for the external accrual system, which decides whether (and how much) an order earns in loyalty points.
//!
//! The client makes one kind of request, `GET {base}/api/orders/{number}`, and retries transient failures a bounded
//! number of times. Rate-limit responses are never retried; they are reported straight away so that the caller can
//! back off.
mod api;
mod config;
mod data_objects;
mod error;

pub use api::AccrualApi;
pub use config::{normalize_base_url, AccrualConfig};
pub use data_objects::AccrualResponse;
pub use error::AccrualApiError;
