//! # Collectors Module
//!
//! This module contains the data collection logic of the plugin.
//!
//! ## Architecture
//!
//! - **`Collector` trait**: Defines the interface the plugin helper drives
//! - **`ResqueCollector`**: Reads queue backlog, worker count and job counters of a Resque namespace
//!
//! ## Data Sources
//!
//! - **Redis**: the Resque bookkeeping keys, accessed through a `ResqueStore`

pub mod collector;
pub mod resque_collector;

// Re-export the main types for easy access
pub use collector::Collector;
pub use resque_collector::ResqueCollector;
