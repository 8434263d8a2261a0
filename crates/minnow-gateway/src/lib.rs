//! [`ObjectGateway`]: the data-plane trait the HTTP layer talks to.
//!
//! [`StorageGateway`] implements it over a [`NodeRegistry`]: validate the
//! identifier, pick the owning node with [`select_node`], look up the node's
//! handle, run the backend operation, and classify the outcome into a
//! [`GatewayError`]. Put and get are never retried.
//!
//! [`NodeRegistry`]: minnow_registry::NodeRegistry
//! [`select_node`]: minnow_placement::select_node

mod error;
mod gateway;


use minnow_store::ObjectStream;

pub use error::GatewayError;
pub use gateway::StorageGateway;
pub use minnow_types::{ValidationError, validate_identifier};

/// Object operations exposed to protocol adapters.
#[async_trait::async_trait]
pub trait ObjectGateway: Send + Sync {
    /// Store exactly `size` bytes from `data` under `id`, replacing any
    /// previous object with that identifier.
    async fn put_object(&self, id: &str, data: ObjectStream, size: u64)
    -> Result<(), GatewayError>;

    /// Open the object stored under `id`.
    async fn get_object(&self, id: &str) -> Result<ObjectStream, GatewayError>;
}
