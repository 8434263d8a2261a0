//! Error types for the node registry.

use minnow_types::NodeId;

/// Errors that can occur while building or querying the registry.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// No node finished initialization; the gateway cannot serve anything.
    #[error("no storage nodes available")]
    NoNodesAvailable,

    /// Some nodes failed and the caller required all of them.
    #[error("{} of {total} storage nodes failed to initialize: {}", .failed.len(), format_ids(.failed))]
    NodesFailed {
        /// Nodes left in the failed state.
        failed: Vec<NodeId>,
        /// Size of the node set.
        total: usize,
    },

    /// The node is not part of this registry's node set.
    #[error("unknown node: {0}")]
    UnknownNode(NodeId),
}

fn format_ids(ids: &[NodeId]) -> String {
    ids.iter()
        .map(NodeId::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
