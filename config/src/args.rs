use clap::Parser;
use std::path::PathBuf;

/// Resque metrics plugin for mackerel-agent
#[derive(Parser, Debug, Clone, Default)]
#[command(author, version = version(), about, long_about = None)]
pub struct Args {
    /// Metric key prefix. Falls back to `resque` when empty.
    #[clap(long = "metric-key-prefix", env = "RESQUE_PLUGIN_METRIC_KEY_PREFIX", value_name = "PREFIX")]
    pub metric_key_prefix: Option<String>,

    /// Redis key namespace the Resque bookkeeping keys live under.
    #[clap(long, env = "RESQUE_PLUGIN_NAMESPACE", value_name = "NAMESPACE")]
    pub namespace: Option<String>,

    /// Host of the redis server.
    #[clap(long, env = "RESQUE_PLUGIN_HOST", value_name = "HOST")]
    pub host: Option<String>,

    /// Port of the redis server.
    #[clap(long, env = "RESQUE_PLUGIN_PORT", value_name = "PORT")]
    pub port: Option<u16>,

    /// Password for the redis server.
    #[clap(long, env = "RESQUE_PLUGIN_PASSWORD", value_name = "PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Redis database index.
    #[clap(long, env = "RESQUE_PLUGIN_DB", value_name = "DB")]
    pub db: Option<i64>,

    /// File keeping the previous run's values, used to compute per-minute rates.
    #[clap(long, env = "RESQUE_PLUGIN_TEMPFILE", value_name = "FILE")]
    pub tempfile: Option<PathBuf>,

    /// Optional YAML config file. Defaults to `config.yaml` in the config directory.
    #[clap(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log at debug level (logs go to stderr). Only available as a flag, it is read before the configuration.
    #[clap(short, long, action)]
    pub verbose: bool,
}

mod config_ext {
    use super::*;
    use config::{
        Map,
        Source,
        Value,
    };
    use std::collections::HashMap;

    impl Source for Args {
        fn clone_into_box(&self) -> Box<dyn Source + Send + Sync> {
            Box::new((*self).clone())
        }

        fn collect(&self) -> Result<Map<String, Value>, config::ConfigError> {
            let mut cache = HashMap::<String, Value>::new();
            if let Some(prefix) = &self.metric_key_prefix {
                cache.insert("metric_key_prefix".to_string(), prefix.clone().into());
            }
            if let Some(namespace) = &self.namespace {
                cache.insert("namespace".to_string(), namespace.clone().into());
            }
            if let Some(host) = &self.host {
                cache.insert("host".to_string(), host.clone().into());
            }
            if let Some(port) = self.port {
                cache.insert("port".to_string(), (port as u64).into());
            }
            if let Some(password) = &self.password {
                cache.insert("password".to_string(), password.clone().into());
            }
            if let Some(db) = self.db {
                cache.insert("db".to_string(), db.into());
            }
            if let Some(tempfile) = &self.tempfile {
                cache.insert("tempfile".to_string(), tempfile.display().to_string().into());
            }
            Ok(cache)
        }
    }
}

pub fn version() -> String {
    let version = clap::crate_version!();
    let config_dir_path = crate::get_config_dir().display().to_string();

    format!(
        "\
{version}

Config directory: {config_dir_path}"
    )
}
