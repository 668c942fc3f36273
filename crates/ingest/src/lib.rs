//! Simulated live traffic: a record generator and the background ticker
//! that appends its output to the shared store.

pub mod generator;
pub mod ticker;

pub use generator::RecordGenerator;
pub use ticker::{IngestionTicker, TickOutcome, TickerMetrics, TickerMetricsSnapshot};
