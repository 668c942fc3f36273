//! JSON API endpoints.
//!
//! Handlers never answer 5xx for a store or probe failure: the failure is
//! folded into the body (an `error` field, a `no_data` panel, a `DOWN`
//! status) and the next poll simply tries again.

mod health;
mod ingest;
mod stats;
mod status;

pub use health::health;
pub use ingest::ingest_metrics;
pub use stats::{dashboard, stats};
pub use status::status;
