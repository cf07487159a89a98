use crate::{
    collectors::Collector,
    metrics::*,
    store::{
        ResqueKeys,
        ResqueStore,
    },
};
use eyre::{
    Result,
    WrapErr as _,
};
use std::{
    future::Future,
    pin::Pin,
};
use tracing::{
    debug,
    instrument,
};

lazy_static::lazy_static! {
    static ref GRAPHS: GraphDefinition = GraphDefinition::from([
        (
            "queues".to_string(),
            Graph::new(
                "Resque queues",
                GraphUnit::Integer,
                vec![GraphMetric::gauge("pending_sum", "Sum pending count").stacked()],
            ),
        ),
        (
            "queue.#".to_string(),
            Graph::new(
                "Resque queue",
                GraphUnit::Integer,
                vec![GraphMetric::gauge("pending", "Pending").stacked()],
            ),
        ),
        (
            "worker".to_string(),
            Graph::new(
                "Resque worker",
                GraphUnit::Integer,
                vec![GraphMetric::gauge("processes", "Processes")],
            ),
        ),
        (
            "stat".to_string(),
            Graph::new(
                "Resque stat",
                GraphUnit::Integer,
                vec![
                    GraphMetric::counter("processed", "Job processed count"),
                    GraphMetric::counter("failed", "Job failed count"),
                ],
            ),
        ),
    ]);
}

/// Collects backlog, worker and job counter metrics of one Resque namespace.
///
/// The queue set is discovered once in [`ResqueCollector::prepare`]; both the snapshot and the `pending` graph are
/// derived from it.
pub struct ResqueCollector<S> {
    store: S,
    keys: ResqueKeys,
    prefix: String,
    queues: Vec<String>,
}

impl<S: ResqueStore + Send> ResqueCollector<S> {
    /// Check that Redis is reachable and discover the registered queues.
    #[instrument(level = "debug", skip(store))]
    pub async fn prepare(mut store: S, namespace: &str, prefix: &str) -> Result<Self> {
        store.ping().await.wrap_err("Redis is not reachable")?;

        let keys = ResqueKeys::new(namespace);
        let mut queues = store
            .set_members(&keys.queues())
            .await
            .wrap_err_with(|| format!("Failed to discover the queues of namespace {namespace:?}"))?;
        queues.sort();
        debug!(?queues, "Discovered queues");

        Ok(Self {
            store,
            keys,
            prefix: prefix.to_string(),
            queues,
        })
    }

    async fn collect_snapshot(&mut self) -> Result<MetricSnapshot> {
        let mut snapshot = MetricSnapshot::new();

        let mut pending_sum = 0u64;
        for queue in &self.queues {
            let key = self.keys.queue(queue);
            let pending = self.store.list_len(&key).await?;
            snapshot.insert(format!("queue.{queue}.pending"), pending as f64);
            pending_sum += pending;
        }
        snapshot.insert("pending_sum".to_string(), pending_sum as f64);

        let processes = self.store.set_card(&self.keys.workers()).await?;
        snapshot.insert("processes".to_string(), processes as f64);

        let failed = self.store.counter(&self.keys.stat_failed()).await?;
        snapshot.insert("failed".to_string(), failed);

        let processed = self.store.counter(&self.keys.stat_processed()).await?;
        snapshot.insert("processed".to_string(), processed);

        debug!(metrics = snapshot.len(), pending_sum, processes, "Collected resque metrics");
        Ok(snapshot)
    }
}

impl<S: ResqueStore + Send> Collector for ResqueCollector<S> {
    fn fetch_metrics(&mut self) -> Pin<Box<dyn Future<Output = Result<MetricSnapshot>> + Send + '_>> {
        Box::pin(async move {
            self.collect_snapshot()
                .await
                .wrap_err_with(|| format!("Failed to collect metrics of namespace {:?}", self.keys.namespace()))
        })
    }

    fn graph_definition(&self) -> GraphDefinition {
        let mut graphs = GRAPHS.clone();

        let pending = self
            .queues
            .iter()
            .map(|queue| GraphMetric::gauge(queue.as_str(), queue.as_str()).stacked())
            .collect();
        graphs.insert(
            "pending".to_string(),
            Graph::new("Resque queue", GraphUnit::Integer, pending),
        );

        graphs
    }

    fn metric_key_prefix(&self) -> &str {
        let prefix = self.prefix.trim();
        if prefix.is_empty() {
            resque_plugin_config::DEFAULT_METRIC_KEY_PREFIX
        } else {
            prefix
        }
    }

    fn name(&self) -> &'static str {
        "ResqueCollector"
    }
}
