use crate::metrics::MetricSnapshot;
use chrono::{
    DateTime,
    Utc,
};
use eyre::{
    Result,
    WrapErr as _,
};
use serde::{
    Deserialize,
    Serialize,
};
use std::{
    io::ErrorKind,
    path::Path,
};
use tracing::{
    debug,
    warn,
};

/// Values of the previous run, kept in the tempfile between invocations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct State {
    #[serde(rename = "_lastTime", with = "chrono::serde::ts_seconds")]
    pub last_time: DateTime<Utc>,
    #[serde(flatten)]
    pub values: MetricSnapshot,
}

impl State {
    pub fn new(values: MetricSnapshot, last_time: DateTime<Utc>) -> Self {
        Self { last_time, values }
    }

    /// Read the previous state. A missing or unreadable file means there is none.
    pub async fn load(path: &Path) -> Option<Self> {
        let content = match tokio::fs::read(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "No previous state");
                return None;
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read previous state");
                return None;
            }
        };

        match serde_json::from_slice(&content) {
            Ok(state) => Some(state),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Ignoring malformed previous state");
                None
            }
        }
    }

    /// Write the state to a sibling file, then rename it to `path`.
    pub async fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_vec(self).wrap_err("Failed to serialize state")?;

        let mut staging = path.as_os_str().to_owned();
        staging.push(".tmp");
        tokio::fs::write(&staging, content)
            .await
            .wrap_err_with(|| format!("Failed to write state to {:?}", staging))?;
        tokio::fs::rename(&staging, path)
            .await
            .wrap_err_with(|| format!("Failed to move state to {:?}", path))
    }
}
