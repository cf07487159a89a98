#[macro_use]
extern crate tracing;

use color_eyre::Result;
use eyre::Context as _;
use resque_plugin_config::Config;
use resque_stats_gatherer::{
    PluginHelper,
    RedisStore,
    ResqueCollector,
};
use std::io::Write as _;
use tracing_subscriber::{
    fmt,
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
    Layer,
};

pub use resque_plugin_config::Args;

pub fn init_errors() -> Result<()> {
    color_eyre::install()
}

/// Logs go to stderr, stdout belongs to mackerel-agent. `RUST_LOG` takes precedence over `verbose`.
pub fn init_logging(verbose: bool) -> Result<()> {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(default_level))?;

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(filter),
        )
        .with(tracing_error::ErrorLayer::default())
        .try_init()
        .context("Failed to initialize tracing subscriber")
}

/// Collect once and print the result for mackerel-agent.
#[instrument(level = "debug", skip_all, fields(address = %config.redacted_address(), namespace = %config.namespace))]
pub async fn run(config: Config) -> Result<()> {
    let store = RedisStore::connect(&config).await?;
    let collector = ResqueCollector::prepare(store, &config.namespace, config.metric_key_prefix()).await?;
    let mut helper = PluginHelper::new(collector, config.tempfile.clone());
    debug!(tempfile = %helper.tempfile().display(), "Collector prepared");

    let mut out = Vec::new();
    helper.run(&mut out).await?;

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(&out).context("Failed to write to stdout")?;
    stdout.flush().context("Failed to flush stdout")
}
