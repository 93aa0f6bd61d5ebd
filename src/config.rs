use log::{debug, warn};
use serde::Deserialize;
use std::fmt::Debug;
use std::path::{Path, PathBuf};

use crate::error::{ExporterError, Result};

/// Environment prefix, matching `RUBRIK_CDM_NODE_IP` and friends
pub const ENV_PREFIX: &str = "RUBRIK_CDM";

/// Exporter configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ExporterConfig {
    /// Address of any node in the cluster
    pub node_ip: String,
    /// API username
    pub username: String,
    /// API password
    pub password: String,
    /// Port the scrape endpoint listens on
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,
    /// Timeout applied to each API call, in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// Accept the self-signed certificates clusters ship with
    #[serde(default = "default_accept_invalid_certs")]
    pub accept_invalid_certs: bool,
    /// Logging level
    #[serde(default)]
    pub log_level: LogLevel,
    /// Per-collector polling intervals
    #[serde(default)]
    pub intervals: Intervals,
}

fn default_listen_port() -> u16 {
    8080
}

fn default_request_timeout() -> u64 {
    60
}

fn default_accept_invalid_certs() -> bool {
    true
}

impl ExporterConfig {
    /// Configuration for a node with every optional setting at its default
    pub fn for_node(node_ip: impl Into<String>, username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            node_ip: node_ip.into(),
            username: username.into(),
            password: password.into(),
            listen_port: default_listen_port(),
            request_timeout_secs: default_request_timeout(),
            accept_invalid_certs: default_accept_invalid_certs(),
            log_level: LogLevel::default(),
            intervals: Intervals::default(),
        }
    }

    /// Reject values that would leave the exporter unable to run
    pub fn validate(&self) -> Result<()> {
        if self.node_ip.trim().is_empty() {
            return Err(ExporterError::Config("node_ip must not be empty".to_string()));
        }
        if self.request_timeout_secs == 0 {
            return Err(ExporterError::Config("request_timeout_secs must be positive".to_string()));
        }
        self.intervals.validate()
    }
}

/// Polling interval per collector, in seconds
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Intervals {
    pub storage_secs: u64,
    pub node_secs: u64,
    pub job_stats_secs: u64,
    pub compliance_secs: u64,
    pub capacity_secs: u64,
    pub relic_secs: u64,
    pub live_mount_secs: u64,
    pub sla_domain_secs: u64,
    pub effective_sla_secs: u64,
    pub failed_jobs_secs: u64,
}

impl Default for Intervals {
    fn default() -> Self {
        Self {
            storage_secs: 60,
            node_secs: 60,
            job_stats_secs: 3600,
            compliance_secs: 3600,
            capacity_secs: 3600,
            relic_secs: 3600,
            live_mount_secs: 3600,
            sla_domain_secs: 3600,
            effective_sla_secs: 3600,
            failed_jobs_secs: 300,
        }
    }
}

impl Intervals {
    fn validate(&self) -> Result<()> {
        let all = [
            ("storage_secs", self.storage_secs),
            ("node_secs", self.node_secs),
            ("job_stats_secs", self.job_stats_secs),
            ("compliance_secs", self.compliance_secs),
            ("capacity_secs", self.capacity_secs),
            ("relic_secs", self.relic_secs),
            ("live_mount_secs", self.live_mount_secs),
            ("sla_domain_secs", self.sla_domain_secs),
            ("effective_sla_secs", self.effective_sla_secs),
            ("failed_jobs_secs", self.failed_jobs_secs),
        ];
        match all.iter().find(|(_, secs)| *secs == 0) {
            Some((name, _)) => Err(ExporterError::Config(format!("intervals.{} must be positive", name))),
            None => Ok(()),
        }
    }
}

/// Logging level
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Error level
    Error,
    /// Warning level
    Warn,
    /// Info level
    #[default]
    Info,
    /// Debug level
    Debug,
    /// Trace level
    Trace,
}

impl std::str::FromStr for LogLevel {
    type Err = ExporterError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "error" => Ok(LogLevel::Error),
            "warn" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            other => Err(ExporterError::Config(format!("Unknown log level: {}", other))),
        }
    }
}

/// Source of configuration
#[derive(Debug, Clone)]
pub enum ConfigSource {
    /// File path (TOML format)
    File(PathBuf),
    /// Environment variables with a prefix
    Environment(String),
    /// TOML string
    Toml(String),
}

/// Load configuration from the given sources; later sources override earlier ones
pub fn load_config<T>(sources: Vec<ConfigSource>) -> Result<T>
where
    T: for<'de> Deserialize<'de> + Debug,
{
    let mut builder = config::Config::builder();

    for source in sources {
        match source {
            ConfigSource::File(path) => {
                if !path.exists() {
                    warn!("Configuration file not found: {}", path.display());
                    continue;
                }

                debug!("Loading TOML configuration from file: {}", path.display());
                builder = builder.add_source(
                    config::File::with_name(&path.to_string_lossy()).format(config::FileFormat::Toml),
                );
            }
            ConfigSource::Environment(prefix) => {
                debug!("Loading configuration from environment with prefix: {}", prefix);
                builder = builder.add_source(
                    config::Environment::with_prefix(&prefix)
                        .prefix_separator("_")
                        .separator("__"),
                );
            }
            ConfigSource::Toml(toml_str) => {
                debug!("Loading configuration from TOML string");
                builder = builder.add_source(config::File::from_str(&toml_str, config::FileFormat::Toml));
            }
        }
    }

    let config = builder
        .build()
        .map_err(|e| ExporterError::Config(format!("Failed to build configuration: {}", e)))?;

    config
        .try_deserialize()
        .map_err(|e| ExporterError::Config(format!("Failed to deserialize configuration: {}", e)))
}

/// Configuration builder
pub struct ConfigBuilder<T: for<'de> Deserialize<'de>> {
    sources: Vec<ConfigSource>,
    _marker: std::marker::PhantomData<T>,
}

impl<T: for<'de> Deserialize<'de> + Debug> ConfigBuilder<T> {
    /// Create a new config builder
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
            _marker: std::marker::PhantomData,
        }
    }

    /// Add a TOML file source
    pub fn add_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.sources.push(ConfigSource::File(path.as_ref().to_path_buf()));
        self
    }

    /// Add environment variables
    pub fn add_env(mut self, prefix: impl Into<String>) -> Self {
        self.sources.push(ConfigSource::Environment(prefix.into()));
        self
    }

    /// Add TOML string
    pub fn add_toml(mut self, toml: impl Into<String>) -> Self {
        self.sources.push(ConfigSource::Toml(toml.into()));
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<T> {
        load_config::<T>(self.sources)
    }
}

impl<T: for<'de> Deserialize<'de> + Debug> Default for ConfigBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Load the exporter configuration from an optional file plus the environment
pub fn load_exporter_config(path: Option<&Path>) -> Result<ExporterConfig> {
    let mut builder = ConfigBuilder::<ExporterConfig>::new();
    if let Some(path) = path {
        builder = builder.add_file(path);
    }
    let config = builder.add_env(ENV_PREFIX).build()?;
    config.validate()?;
    Ok(config)
}
