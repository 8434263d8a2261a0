//! Error types for node discovery.

use minnow_types::NodeId;

/// Errors that can occur while discovering nodes.
#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    /// Two descriptors share one identity.
    #[error("duplicate node id: {0}")]
    DuplicateNode(NodeId),

    /// The Docker daemon could not be reached or answered with an error.
    #[error("docker error: {0}")]
    Docker(String),
}
