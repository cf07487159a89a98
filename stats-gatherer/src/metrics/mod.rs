pub mod graph;

// Re-export the main types for easy access
pub use graph::*;
use std::collections::BTreeMap;

/// Metric key (dot separated, e.g. `queue.default.pending`) to value, produced fresh for every run.
pub type MetricSnapshot = BTreeMap<String, f64>;
