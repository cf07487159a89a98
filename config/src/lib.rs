#[macro_use]
extern crate tracing;

mod app_config;
mod args;

pub use app_config::get_config_dir;
pub use args::Args;
use serde::{
    Deserialize,
    Serialize,
};
use std::path::PathBuf;

/// Metric key prefix used when none (or an empty one) is configured.
pub const DEFAULT_METRIC_KEY_PREFIX: &str = "resque";

const DEFAULT_CONFIG: &str = include_str!("default-config.yaml");

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub metric_key_prefix: String,
    pub namespace: String,
    pub host: String,
    pub port: u16,
    #[serde(default, skip_serializing)]
    pub password: String,
    pub db: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tempfile: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        serde_yml::from_str(DEFAULT_CONFIG).expect("Failed to parse default config")
    }
}

impl Config {
    /// Layers the embedded defaults, the YAML config file and the command line arguments (in that order).
    ///
    /// The config file in the config directory is optional; one given with `--config` must exist.
    pub fn new(args: Args) -> Result<Self, config::ConfigError> {
        let (config_file, required) = match &args.config {
            Some(path) => (path.clone(), true),
            None => (get_config_dir().join("config.yaml"), false),
        };
        debug!(path = %config_file.display(), required, "Loading configuration");

        let cfg: Self = config::Config::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Yaml))
            .add_source(
                config::File::from(config_file)
                    .format(config::FileFormat::Yaml)
                    .required(required),
            )
            .add_source(args)
            .build()?
            .try_deserialize()?;

        Ok(cfg)
    }

    /// The configured prefix, or `resque` if it is blank.
    pub fn metric_key_prefix(&self) -> &str {
        let prefix = self.metric_key_prefix.trim();
        if prefix.is_empty() {
            DEFAULT_METRIC_KEY_PREFIX
        } else {
            prefix
        }
    }

    /// Password to authenticate with, `None` when not configured.
    pub fn password(&self) -> Option<&str> {
        (!self.password.is_empty()).then_some(self.password.as_str())
    }

    /// `host:port/db`, safe to log.
    pub fn redacted_address(&self) -> String {
        format!("{}:{}/{}", self.host, self.port, self.db)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use temp_dir::TempDir;

    fn config_file(dir: &TempDir, content: &str) -> PathBuf {
        let path = dir.child("config.yaml");
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn defaults() {
        let dir = TempDir::new().unwrap();
        let args = Args {
            config: Some(config_file(&dir, "namespace: resque\n")),
            ..Default::default()
        };
        let cfg = Config::new(args).unwrap();
        assert_eq!(
            cfg,
            Config {
                metric_key_prefix: "resque".to_string(),
                namespace: "resque".to_string(),
                host: "127.0.0.1".to_string(),
                port: 6379,
                password: String::new(),
                db: 0,
                tempfile: None,
            }
        );
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.password(), None);
        assert_eq!(cfg.redacted_address(), "127.0.0.1:6379/0");
    }

    #[test]
    fn args_override_config_file() {
        let dir = TempDir::new().unwrap();
        let path = config_file(&dir, "namespace: jobs\nhost: redis.internal\nport: 6380\ndb: 2\n");
        let args = Args {
            config: Some(path),
            port: Some(7000),
            password: Some("secret".to_string()),
            tempfile: Some(PathBuf::from("/tmp/resque-state")),
            ..Default::default()
        };
        let cfg = Config::new(args).unwrap();
        assert_eq!(cfg.namespace, "jobs");
        assert_eq!(cfg.host, "redis.internal");
        assert_eq!(cfg.port, 7000);
        assert_eq!(cfg.db, 2);
        assert_eq!(cfg.password(), Some("secret"));
        assert_eq!(cfg.tempfile, Some(PathBuf::from("/tmp/resque-state")));
        assert_eq!(cfg.redacted_address(), "redis.internal:7000/2");
    }

    #[test]
    fn missing_explicit_config_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let args = Args {
            config: Some(dir.child("nope.yaml")),
            ..Default::default()
        };
        assert!(Config::new(args).is_err());
    }

    #[test]
    fn verbose_is_only_a_logging_flag() {
        let dir = TempDir::new().unwrap();
        let args = Args {
            config: Some(config_file(&dir, "namespace: jobs\n")),
            verbose: true,
            ..Default::default()
        };
        let cfg = Config::new(args).unwrap();
        assert_eq!(cfg.namespace, "jobs");
        assert_eq!(
            cfg,
            Config {
                namespace: "jobs".to_string(),
                ..Config::default()
            }
        );
    }

    #[test]
    fn malformed_port_is_an_error() {
        let dir = TempDir::new().unwrap();
        let args = Args {
            config: Some(config_file(&dir, "port: not-a-port\n")),
            ..Default::default()
        };
        assert!(Config::new(args).is_err());
    }

    #[test]
    fn blank_prefix_falls_back_to_resque() {
        let cfg = Config {
            metric_key_prefix: "  ".to_string(),
            ..Config::default()
        };
        assert_eq!(cfg.metric_key_prefix(), "resque");

        let cfg = Config {
            metric_key_prefix: "jobs".to_string(),
            ..Config::default()
        };
        assert_eq!(cfg.metric_key_prefix(), "jobs");
    }
}
