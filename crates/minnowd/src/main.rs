//! Minnow gateway daemon.
//!
//! Discovers the storage nodes, initializes a client for each, and serves the
//! object API over HTTP until SIGINT or SIGTERM.

mod config;
mod telemetry;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use minnow_discovery::{Discovery, StaticDiscovery};
use minnow_gateway::StorageGateway;
use minnow_http::ApiServer;
use minnow_registry::NodeRegistry;
use minnow_store::{BackendConnector, MemoryConnector, S3Connector};
use minnow_types::NodeDescriptor;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tracing::{error, info, warn};

use config::{Backend, CliConfig, DiscoveryMode};

// -----------------------------------------------------------------------
// CLI definition
// -----------------------------------------------------------------------

#[derive(Parser)]
#[command(
    name = "minnowd",
    version,
    about = "Minnow object storage gateway"
)]
struct Cli {
    /// Path to TOML config file.
    #[arg(short, long, global = true, env = "MINNOW_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the gateway.
    Start(StartArgs),

    /// Discover storage nodes and check that each one is reachable.
    Nodes,
}

#[derive(clap::Args, Default)]
struct StartArgs {
    /// HTTP port to listen on (all interfaces).
    #[arg(short, long)]
    port: Option<u16>,

    /// Full HTTP listen address (e.g. "127.0.0.1:3000").
    #[arg(short = 'l', long, conflicts_with = "port")]
    listen: Option<String>,

    /// Storage backend type.
    #[arg(long, value_enum)]
    backend: Option<Backend>,

    /// Shorthand for `--backend memory`.
    #[arg(short, long, conflicts_with = "backend")]
    memory: bool,
}

impl StartArgs {
    /// CLI args override config file values.
    fn apply(self, config: &mut CliConfig) {
        if let Some(port) = self.port {
            config.server.listen_addr = format!("0.0.0.0:{port}");
        }
        if let Some(addr) = self.listen {
            config.server.listen_addr = addr;
        }
        if let Some(backend) = self.backend {
            config.storage.backend = backend;
        }
        if self.memory {
            config.storage.backend = Backend::Memory;
        }
    }
}

// -----------------------------------------------------------------------
// Entrypoint
// -----------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = CliConfig::load(cli.config.as_deref()).context("failed to load config")?;

    telemetry::init(&telemetry::TelemetryConfig {
        level: config.log.level.clone(),
        format: config.log.format,
    });

    match cli.command {
        Commands::Start(args) => {
            args.apply(&mut config);
            cmd_start(config).await
        }
        Commands::Nodes => cmd_nodes(&config).await,
    }
}

// -----------------------------------------------------------------------
// Discovery
// -----------------------------------------------------------------------

/// Build the discovery collaborator the config asks for.
fn discovery_for(config: &CliConfig) -> Result<Box<dyn Discovery>> {
    match config.discovery.mode {
        DiscoveryMode::Static => {
            let nodes = &config.discovery.nodes;
            if nodes.is_empty() && config.storage.backend == Backend::Memory {
                return Ok(Box::new(StaticDiscovery::memory(config.storage.memory_nodes)));
            }
            Ok(Box::new(StaticDiscovery::new(nodes.clone())))
        }
        #[cfg(feature = "docker")]
        DiscoveryMode::Docker => {
            let discovery = minnow_discovery::DockerDiscovery::connect(
                config.discovery.container_name.clone(),
                config.discovery.api_port,
            )?;
            Ok(Box::new(discovery))
        }
        #[cfg(not(feature = "docker"))]
        DiscoveryMode::Docker => {
            anyhow::bail!("docker discovery requires minnowd built with the `docker` feature")
        }
    }
}

async fn discover(config: &CliConfig) -> Result<Vec<NodeDescriptor>> {
    discovery_for(config)?
        .discover()
        .await
        .context("node discovery failed")
}

// -----------------------------------------------------------------------
// minnowd start
// -----------------------------------------------------------------------

async fn cmd_start(config: CliConfig) -> Result<()> {
    info!("starting minnowd");
    info!(
        listen_addr = %config.server.listen_addr,
        backend = ?config.storage.backend,
        container = %config.storage.container,
        discovery = ?config.discovery.mode,
        max_attempts = config.registry.max_attempts,
        retry_delay_secs = config.registry.retry_delay_secs,
        attempt_timeout_secs = config.registry.attempt_timeout_secs,
        "gateway configuration"
    );

    // --- Nodes ---
    let nodes = discover(&config).await?;
    for (index, node) in nodes.iter().enumerate() {
        info!(index, node = %node.id, name = %node.name, endpoint = %node.endpoint(), "discovered storage node");
    }

    // --- Registry ---
    let connector: Arc<dyn BackendConnector> = match config.storage.backend {
        Backend::S3 => Arc::new(S3Connector::new(config.storage.region.clone())),
        Backend::Memory => Arc::new(MemoryConnector::new()),
    };
    let registry = Arc::new(NodeRegistry::with_container(
        nodes,
        config.storage.container.clone(),
    ));
    let report = registry
        .connect_all(connector.as_ref(), &config.retry_policy())
        .await;
    report
        .check(config.registry.require_all_nodes)
        .context("storage node initialization failed")?;

    // --- HTTP API ---
    let server = ApiServer::new(Arc::new(StorageGateway::new(registry)));
    let listener = TcpListener::bind(&config.server.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.server.listen_addr))?;

    serve_until_signal(server, listener, config.shutdown_timeout()).await?;
    info!("minnowd stopped");
    Ok(())
}

/// Serve until SIGINT/SIGTERM, then drain in-flight requests for at most
/// `timeout`.
async fn serve_until_signal(
    server: ApiServer,
    listener: TcpListener,
    timeout: std::time::Duration,
) -> Result<()> {
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let mut task = tokio::spawn(server.serve_with_shutdown(listener, async move {
        let _ = stop_rx.await;
    }));

    tokio::select! {
        joined = &mut task => {
            // The server stopped on its own: that is always an error.
            joined.context("HTTP server task failed")?.context("HTTP server failed")?;
            anyhow::bail!("HTTP server exited unexpectedly");
        }
        () = shutdown_signal() => {}
    }

    info!(timeout = ?timeout, "shutting down, draining in-flight requests");
    let _ = stop_tx.send(());
    match tokio::time::timeout(timeout, task).await {
        Ok(joined) => joined
            .context("HTTP server task failed")?
            .context("HTTP server failed")?,
        Err(_) => warn!("graceful shutdown timed out, abandoning in-flight requests"),
    }
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for SIGINT");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!(signal = "SIGINT", "shutdown signal received"),
        () = terminate => info!(signal = "SIGTERM", "shutdown signal received"),
    }
}

// -----------------------------------------------------------------------
// minnowd nodes
// -----------------------------------------------------------------------

async fn cmd_nodes(config: &CliConfig) -> Result<()> {
    let discovery = discovery_for(config)?;
    let nodes = discovery
        .discover()
        .await
        .context("node discovery failed")?;
    if nodes.is_empty() {
        println!("No storage nodes discovered.");
        return Ok(());
    }

    let timeout = config.probe_timeout();
    println!("{:<5} {:<32} {:<24} {:<22} STATUS", "INDEX", "NAME", "ID", "ENDPOINT");
    for (index, node) in nodes.iter().enumerate() {
        let status = if discovery.can_reach(node, timeout).await {
            "reachable"
        } else {
            "unreachable"
        };
        println!(
            "{:<5} {:<32} {:<24} {:<22} {status}",
            index,
            node.name,
            node.id.as_str(),
            node.endpoint()
        );
    }
    Ok(())
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------
