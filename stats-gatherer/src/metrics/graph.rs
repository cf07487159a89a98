use serde::Serialize;
use std::collections::BTreeMap;
use strum::{
    Display,
    EnumString,
};

/// Graph key to graph, as announced to mackerel-agent.
///
/// A graph key may contain a `#` (or `*`) segment, which matches any single metric key segment.
pub type GraphDefinition = BTreeMap<String, Graph>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Display, EnumString)]
pub enum GraphUnit {
    #[default]
    #[serde(rename = "integer")]
    #[strum(serialize = "integer")]
    Integer,
    #[serde(rename = "float")]
    #[strum(serialize = "float")]
    Float,
    #[serde(rename = "percentage")]
    #[strum(serialize = "percentage")]
    Percentage,
    #[serde(rename = "bytes")]
    #[strum(serialize = "bytes")]
    Bytes,
    #[serde(rename = "bytes/sec")]
    #[strum(serialize = "bytes/sec")]
    BytesPerSecond,
    #[serde(rename = "iops")]
    #[strum(serialize = "iops")]
    Iops,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Graph {
    pub label: String,
    pub unit: GraphUnit,
    pub metrics: Vec<GraphMetric>,
}

impl Graph {
    pub fn new(label: impl Into<String>, unit: GraphUnit, metrics: Vec<GraphMetric>) -> Self {
        Self {
            label: label.into(),
            unit,
            metrics,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphMetric {
    pub name: String,
    pub label: String,
    /// Report the per-minute rate instead of the raw value. Only used locally.
    #[serde(skip)]
    pub diff: bool,
    pub stacked: bool,
}

impl GraphMetric {
    /// A plain gauge.
    pub fn gauge(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            diff: false,
            stacked: false,
        }
    }

    /// A monotonically increasing counter, reported as per-minute rate.
    pub fn counter(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            diff: true,
            ..Self::gauge(name, label)
        }
    }

    pub fn stacked(mut self) -> Self {
        self.stacked = true;
        self
    }
}
