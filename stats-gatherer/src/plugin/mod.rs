//! # Plugin Module
//!
//! Speaks the mackerel-agent plugin protocol on behalf of a [`Collector`].
//!
//! - **Meta mode** (`MACKEREL_AGENT_PLUGIN_META` set): prints the graph definitions as JSON
//! - **Value mode**: prints one `name\tvalue\tepoch` line per metric. Counters are turned into per-minute rates
//!   using the values of the previous run, which are kept in a tempfile.

mod state;

use crate::{
    collectors::Collector,
    metrics::*,
};
use chrono::{
    DateTime,
    Utc,
};
use eyre::{
    Result,
    WrapErr as _,
};
use regex::Regex;
pub use state::State;
use std::{
    collections::BTreeMap,
    env,
    fmt,
    io::Write,
    path::{
        Path,
        PathBuf,
    },
};
use tracing::{
    debug,
    warn,
};

/// Set by mackerel-agent when it asks for graph definitions instead of values.
pub const META_ENV: &str = "MACKEREL_AGENT_PLUGIN_META";
/// Directory for the default tempfile.
pub const WORKDIR_ENV: &str = "MACKEREL_PLUGIN_WORKDIR";

const META_HEADER: &str = "# mackerel-agent-plugin";
/// Rates are not computed against values older than this.
const MAX_RATE_INTERVAL_SECS: i64 = 600;
const WILDCARD_SEGMENT: &str = "[-a-zA-Z0-9_]+";

/// One line of plugin output.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricLine {
    pub name: String,
    pub value: f64,
    pub timestamp: DateTime<Utc>,
}

impl fmt::Display for MetricLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}\t{}", self.name, self.value, self.timestamp.timestamp())
    }
}

pub struct PluginHelper<C> {
    collector: C,
    tempfile: PathBuf,
}

impl<C: Collector> PluginHelper<C> {
    pub fn new(collector: C, tempfile: Option<PathBuf>) -> Self {
        let tempfile = tempfile.unwrap_or_else(|| default_tempfile(collector.metric_key_prefix()));
        Self { collector, tempfile }
    }

    pub fn tempfile(&self) -> &Path {
        &self.tempfile
    }

    /// Print graph definitions or values, depending on what mackerel-agent asked for.
    pub async fn run(&mut self, out: &mut impl Write) -> Result<()> {
        if env::var_os(META_ENV).is_some_and(|v| !v.is_empty()) {
            self.output_definitions(out)
        } else {
            self.output_values(out, Utc::now()).await
        }
    }

    pub fn output_definitions(&self, out: &mut impl Write) -> Result<()> {
        let prefix = self.collector.metric_key_prefix();
        let graphs = self
            .collector
            .graph_definition()
            .into_iter()
            .map(|(key, graph)| (format!("{prefix}.{key}"), graph))
            .collect::<BTreeMap<_, _>>();

        writeln!(out, "{META_HEADER}")?;
        serde_json::to_writer(&mut *out, &serde_json::json!({ "graphs": graphs }))
            .wrap_err("Failed to serialize graph definitions")?;
        writeln!(out)?;
        Ok(())
    }

    /// Fetch, print and remember the current values. Nothing is printed if fetching fails.
    pub async fn output_values(&mut self, out: &mut impl Write, now: DateTime<Utc>) -> Result<()> {
        let last = State::load(&self.tempfile).await;
        let stats = self.collector.fetch_metrics().await?;

        let lines = format_values(
            self.collector.metric_key_prefix(),
            &self.collector.graph_definition(),
            &stats,
            last.as_ref(),
            now,
        )?;
        for line in &lines {
            writeln!(out, "{line}")?;
        }
        debug!(collector = self.collector.name(), lines = lines.len(), "Printed metrics");

        State::new(stats, now).save(&self.tempfile).await
    }
}

/// `mackerel-plugin-<prefix>` in `MACKEREL_PLUGIN_WORKDIR`, or the OS temp directory.
pub fn default_tempfile(prefix: &str) -> PathBuf {
    let dir = env::var_os(WORKDIR_ENV)
        .filter(|dir| !dir.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(env::temp_dir);
    dir.join(format!("mackerel-plugin-{prefix}"))
}

/// Pick the values of `stats` announced by `graphs` and name them the way mackerel-agent expects.
///
/// Metrics of a wildcard graph are looked up by `<graph key>.<metric name>` with the wildcard matching any one key
/// segment, all others by their bare metric name.
pub fn format_values(
    prefix: &str,
    graphs: &GraphDefinition,
    stats: &MetricSnapshot,
    last: Option<&State>,
    now: DateTime<Utc>,
) -> Result<Vec<MetricLine>> {
    let mut lines = Vec::new();
    let mut push = |name: String, key: &str, value: f64, metric: &GraphMetric| {
        let value = if metric.diff {
            match rate(key, value, last, now) {
                Some(rate) => rate,
                None => return,
            }
        } else {
            value
        };
        lines.push(MetricLine {
            name,
            value,
            timestamp: now,
        });
    };

    for (graph_key, graph) in graphs {
        for metric in &graph.metrics {
            if is_wildcard(graph_key) {
                let pattern = wildcard_pattern(graph_key, &metric.name)?;
                for (key, value) in stats.iter().filter(|(key, _)| pattern.is_match(key)) {
                    push(format!("{prefix}.{key}"), key, *value, metric);
                }
            } else if let Some(value) = stats.get(&metric.name) {
                push(
                    format!("{prefix}.{graph_key}.{}", metric.name),
                    &metric.name,
                    *value,
                    metric,
                );
            }
        }
    }

    Ok(lines)
}

fn is_wildcard(graph_key: &str) -> bool {
    graph_key.split('.').any(|segment| segment == "#" || segment == "*")
}

fn wildcard_pattern(graph_key: &str, metric_name: &str) -> Result<Regex> {
    let segments = graph_key
        .split('.')
        .map(|segment| match segment {
            "#" | "*" => WILDCARD_SEGMENT.to_string(),
            literal => regex::escape(literal),
        })
        .collect::<Vec<_>>();
    let pattern = format!("^{}\\.{}$", segments.join("\\."), regex::escape(metric_name));
    Regex::new(&pattern).wrap_err_with(|| format!("Invalid graph key {graph_key:?}"))
}

/// Per-minute increase of a counter since the last run.
fn rate(key: &str, value: f64, last: Option<&State>, now: DateTime<Utc>) -> Option<f64> {
    let Some((last_value, last_time)) = last.and_then(|s| s.values.get(key).map(|v| (*v, s.last_time))) else {
        debug!(key, "No previous value, skipping rate");
        return None;
    };

    let elapsed = (now - last_time).num_seconds();
    if elapsed <= 0 || elapsed > MAX_RATE_INTERVAL_SECS {
        warn!(key, elapsed, "Previous value is too old or from the future, skipping rate");
        return None;
    }
    if value < last_value {
        warn!(key, value, last_value, "Counter seems to have been reset, skipping rate");
        return None;
    }

    Some((value - last_value) * 60.0 / elapsed as f64)
}
