use crate::metrics::{
    GraphDefinition,
    MetricSnapshot,
};
use eyre::Result;
use std::{
    future::Future,
    pin::Pin,
};

/// Trait for collecting metrics and describing how they are graphed
pub trait Collector {
    /// Collect a fresh snapshot of all metrics
    fn fetch_metrics(&mut self) -> Pin<Box<dyn Future<Output = Result<MetricSnapshot>> + Send + '_>>;

    /// Graphs the collected metrics belong to
    fn graph_definition(&self) -> GraphDefinition;

    /// Prefix put in front of every graph and metric key
    fn metric_key_prefix(&self) -> &str;

    /// Get the name of this collector
    fn name(&self) -> &'static str;
}
