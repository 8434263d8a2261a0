//! Core traits for backend storage.

use std::sync::Arc;

use minnow_types::NodeDescriptor;

use crate::error::StoreError;
use crate::stream::ObjectStream;

/// The capability set of one backend storage node.
///
/// All implementations must be `Send + Sync`: one handle is shared by every
/// request routed to the node.
#[async_trait::async_trait]
pub trait ObjectBackend: Send + Sync {
    /// Make sure `container` exists, creating it if absent.
    ///
    /// Returns `true` if the container was created by this call.
    async fn ensure_container(&self, container: &str) -> Result<bool, StoreError>;

    /// Store exactly `size` bytes read from `body` under `key`.
    ///
    /// A body that ends early or runs past `size` fails with
    /// [`StoreError::SizeMismatch`] (or whatever the backend reports).
    async fn put(
        &self,
        container: &str,
        key: &str,
        body: ObjectStream,
        size: u64,
    ) -> Result<(), StoreError>;

    /// Open `key` for reading.
    ///
    /// Missing objects fail with [`StoreError::NotFound`], distinct from
    /// every other failure. The returned stream holds backend resources
    /// until it is drained or dropped.
    async fn get(&self, container: &str, key: &str) -> Result<ObjectStream, StoreError>;
}

/// Builds backend handles from node descriptors.
///
/// The registry calls this once per initialization attempt; tests inject
/// connectors that fail a set number of times.
#[async_trait::async_trait]
pub trait BackendConnector: Send + Sync {
    /// Create a client handle bound to `node`.
    async fn connect(&self, node: &NodeDescriptor) -> Result<Arc<dyn ObjectBackend>, StoreError>;
}
