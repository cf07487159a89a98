//! # Resque Stats Gatherer
//!
//! Collects queue backlog, worker and job counter metrics from the Redis bookkeeping keys of a Resque installation
//! and hands them to mackerel-agent.
//!
//! ## Architecture
//!
//! - **`store`**: Key layout and the Redis reads behind the `ResqueStore` seam
//! - **`metrics`**: Metric snapshot and graph definition types
//! - **`collectors`**: The `Collector` trait and the `ResqueCollector`
//! - **`plugin`**: The mackerel-agent plugin protocol (graph definitions, value lines, counter rates)
//!
//! ## Redis keys
//!
//! With namespace `N`:
//!
//! - `N:queues`: set of queue names
//! - `N:queue:<name>`: list of pending jobs
//! - `N:workers`: set of active workers
//! - `N:stat:failed`, `N:stat:processed`: job counters

pub mod collectors;
pub mod metrics;
pub mod plugin;
pub mod store;

pub use collectors::*;
pub use metrics::*;
pub use plugin::PluginHelper;
pub use store::{
    RedisStore,
    ResqueStore,
    StoreError,
};
