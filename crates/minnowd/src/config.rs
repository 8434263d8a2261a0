//! TOML configuration for the Minnow daemon.
//!
//! Every section is optional. When no config file is given, the daemon looks
//! for `minnow/minnowd.toml` under the user's config directory and falls back
//! to built-in defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use minnow_registry::RetryPolicy;
use minnow_types::{DEFAULT_CONTAINER, NodeDescriptor};
use serde::Deserialize;

/// Top-level configuration, parsed from TOML.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// HTTP server settings.
    pub server: ServerSection,
    /// Storage backend selection.
    pub storage: StorageSection,
    /// Node initialization tuning.
    pub registry: RegistrySection,
    /// Where the node set comes from.
    pub discovery: DiscoverySection,
    /// Logging configuration.
    pub log: LogSection,
}

/// `[server]` section.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    /// Address for the HTTP API.
    pub listen_addr: String,
    /// How long in-flight requests may run after a shutdown signal.
    pub shutdown_timeout_secs: u64,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:3000".to_string(),
            shutdown_timeout_secs: 10,
        }
    }
}

/// Which kind of backend the storage nodes are.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// S3-compatible servers (MinIO).
    #[default]
    S3,
    /// In-process memory nodes; data is lost on exit.
    Memory,
}

/// `[storage]` section.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct StorageSection {
    /// Backend type: `"s3"` (default) or `"memory"`.
    pub backend: Backend,
    /// Container (bucket) objects are stored in on every node.
    pub container: String,
    /// Region sent with S3 requests.
    pub region: String,
    /// Nodes synthesized for the memory backend when none are listed.
    pub memory_nodes: usize,
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            backend: Backend::S3,
            container: DEFAULT_CONTAINER.to_string(),
            region: minnow_store::DEFAULT_REGION.to_string(),
            memory_nodes: 3,
        }
    }
}

/// `[registry]` section.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RegistrySection {
    /// Initialization attempts per node.
    pub max_attempts: u32,
    /// Pause between attempts, in seconds.
    pub retry_delay_secs: u64,
    /// Upper bound on one attempt, in seconds.
    pub attempt_timeout_secs: u64,
    /// Refuse to start unless every node initializes.
    pub require_all_nodes: bool,
}

impl Default for RegistrySection {
    fn default() -> Self {
        Self {
            max_attempts: RetryPolicy::DEFAULT_MAX_ATTEMPTS,
            retry_delay_secs: RetryPolicy::DEFAULT_DELAY.as_secs(),
            attempt_timeout_secs: RetryPolicy::DEFAULT_ATTEMPT_TIMEOUT.as_secs(),
            require_all_nodes: false,
        }
    }
}

/// How storage nodes are discovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscoveryMode {
    /// Nodes listed under `[[discovery.nodes]]`.
    #[default]
    Static,
    /// Running containers found through the Docker daemon.
    Docker,
}

/// `[discovery]` section.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DiscoverySection {
    /// `"static"` (default) or `"docker"`.
    pub mode: DiscoveryMode,
    /// Substring container names must contain (docker mode).
    pub container_name: String,
    /// Storage API port inside discovered containers (docker mode).
    pub api_port: u16,
    /// TCP connect timeout for reachability probes, in milliseconds.
    pub probe_timeout_ms: u64,
    /// Statically configured nodes, in placement order.
    pub nodes: Vec<NodeDescriptor>,
}

impl Default for DiscoverySection {
    fn default() -> Self {
        Self {
            mode: DiscoveryMode::Static,
            container_name: "amazin-object-storage-node".to_string(),
            api_port: 9000,
            probe_timeout_ms: minnow_discovery::DEFAULT_PROBE_TIMEOUT.as_millis() as u64,
            nodes: Vec::new(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

/// `[log]` section.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LogSection {
    /// Log level filter (e.g. `"info"`, `"debug"`, `"warn"`).
    pub level: String,
    /// Output format.
    pub format: LogFormat,
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
        }
    }
}

impl CliConfig {
    /// Load config from a TOML file, or from the default location if no path
    /// is given and a file exists there.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(p) => Self::from_file(p),
            None => match default_config_path().filter(|p| p.is_file()) {
                Some(p) => Self::from_file(&p),
                None => Ok(Self::default()),
            },
        }
    }

    fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_toml(&content).with_context(|| format!("invalid config {}", path.display()))
    }

    /// Parse config from a TOML string.
    pub fn from_toml(s: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Effective retry policy for node initialization.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::fixed(
            self.registry.max_attempts,
            Duration::from_secs(self.registry.retry_delay_secs),
        )
        .with_attempt_timeout(Duration::from_secs(self.registry.attempt_timeout_secs))
    }

    /// Effective graceful shutdown bound.
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.server.shutdown_timeout_secs)
    }

    /// Effective reachability probe timeout.
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.discovery.probe_timeout_ms)
    }
}

/// `<config dir>/minnow/minnowd.toml`, if the platform has a config dir.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("minnow").join("minnowd.toml"))
}
