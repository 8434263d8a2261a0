//! Error types for gateway operations.

use minnow_store::StoreError;
use minnow_types::{NodeId, ValidationError};

/// Errors returned by [`ObjectGateway`](crate::ObjectGateway) operations.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The identifier is malformed. Never reaches a backend.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The node set is empty.
    #[error("no storage nodes available")]
    NoNodesAvailable,

    /// The owning node never finished initialization.
    #[error("storage node {node} is not initialized")]
    NodeUninitialized {
        /// Node the identifier maps to.
        node: NodeId,
    },

    /// The owning node has no object under this identifier.
    #[error("object not found: {id}")]
    ObjectNotFound {
        /// Requested identifier.
        id: String,
    },

    /// The owning node failed the operation.
    #[error("{op} on node {node} failed: {source}")]
    Backend {
        /// Node the operation ran on.
        node: NodeId,
        /// Gateway operation (`put_object` or `get_object`).
        op: &'static str,
        /// Underlying backend error.
        #[source]
        source: StoreError,
    },
}
