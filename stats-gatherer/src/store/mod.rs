//! # Store Module
//!
//! Read access to the Resque bookkeeping keys in Redis.
//!
//! - **`ResqueKeys`**: the key layout under a namespace
//! - **`ResqueStore`**: the handful of reads the collector needs
//! - **`RedisStore`**: `ResqueStore` over a live Redis connection

#[cfg(test)]
pub(crate) mod memory;
mod redis_store;

pub use redis_store::RedisStore;
use std::{
    future::Future,
    pin::Pin,
};

pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + Send + 'a>>;

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("Connecting to redis failed: {0}")]
    Connection(#[source] redis::RedisError),
    #[error("Reading {key} failed: {source}")]
    Command {
        key: String,
        #[source]
        source: redis::RedisError,
    },
    #[error("Key {0} does not exist")]
    MissingKey(String),
    #[error("Key {key} holds a {found}, expected a {expected}")]
    WrongType {
        key: String,
        found: String,
        expected: &'static str,
    },
    #[error("Key {key} holds {value:?}, which is not a number")]
    MalformedNumber { key: String, value: String },
}

impl StoreError {
    pub(crate) fn command(key: &str, source: redis::RedisError) -> Self {
        Self::Command {
            key: key.to_string(),
            source,
        }
    }
}

/// Key layout of a Resque installation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResqueKeys {
    namespace: String,
}

impl ResqueKeys {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Set of registered queue names.
    pub fn queues(&self) -> String {
        format!("{}:queues", self.namespace)
    }

    /// List of pending jobs of one queue.
    pub fn queue(&self, name: &str) -> String {
        format!("{}:queue:{}", self.namespace, name)
    }

    /// Set of registered workers.
    pub fn workers(&self) -> String {
        format!("{}:workers", self.namespace)
    }

    pub fn stat_failed(&self) -> String {
        format!("{}:stat:failed", self.namespace)
    }

    pub fn stat_processed(&self) -> String {
        format!("{}:stat:processed", self.namespace)
    }
}

/// Reads used to derive the Resque metrics.
///
/// Absent lists and sets count as empty, like Redis itself treats them. The queue set and the stat counters are
/// required to exist.
pub trait ResqueStore {
    /// Check that the server is reachable.
    fn ping(&mut self) -> StoreFuture<'_, ()>;

    /// Members of the set at `key`. Fails if the key is absent or not a set.
    fn set_members<'a>(&'a mut self, key: &'a str) -> StoreFuture<'a, Vec<String>>;

    /// Length of the list at `key`.
    fn list_len<'a>(&'a mut self, key: &'a str) -> StoreFuture<'a, u64>;

    /// Cardinality of the set at `key`.
    fn set_card<'a>(&'a mut self, key: &'a str) -> StoreFuture<'a, u64>;

    /// The string at `key` parsed as number.
    fn counter<'a>(&'a mut self, key: &'a str) -> StoreFuture<'a, f64>;
}

pub(crate) fn parse_counter(key: &str, value: Option<String>) -> Result<f64, StoreError> {
    let value = value.ok_or_else(|| StoreError::MissingKey(key.to_string()))?;
    match value.parse::<f64>() {
        Ok(number) if number.is_finite() => Ok(number),
        _ => Err(StoreError::MalformedNumber {
            key: key.to_string(),
            value,
        }),
    }
}
