//! Backend node discovery.
//!
//! A [`Discovery`] produces the ordered list of [`NodeDescriptor`]s the
//! gateway distributes objects over. Discovery runs once at startup; the
//! list is never refreshed while the process runs.
//!
//! - [`StaticDiscovery`]: nodes listed in configuration (or synthesized
//!   in-memory nodes for development).
//! - `DockerDiscovery`: running MinIO containers found through the Docker
//!   daemon (requires the `docker` feature).
//!
//! [`NodeDescriptor`]: minnow_types::NodeDescriptor

mod error;
mod probe;
mod static_discovery;

#[cfg(feature = "docker")]
mod docker;

use std::time::Duration;

use minnow_types::NodeDescriptor;

pub use error::DiscoveryError;
pub use probe::{DEFAULT_PROBE_TIMEOUT, can_reach};
pub use static_discovery::StaticDiscovery;

#[cfg(feature = "docker")]
pub use docker::DockerDiscovery;

/// Source of backend node descriptors.
#[async_trait::async_trait]
pub trait Discovery: Send + Sync {
    /// Return the current node set, in placement order.
    async fn discover(&self) -> Result<Vec<NodeDescriptor>, DiscoveryError>;

    /// Whether the node's storage API accepts TCP connections within
    /// `timeout`.
    async fn can_reach(&self, node: &NodeDescriptor, timeout: Duration) -> bool {
        can_reach(node, timeout).await
    }
}
