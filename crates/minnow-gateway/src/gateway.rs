//! [`StorageGateway`]: routes object operations through the node registry.

use std::sync::Arc;

use minnow_placement::select_node;
use minnow_registry::NodeRegistry;
use minnow_store::{ObjectBackend, ObjectStream};
use minnow_types::{NodeDescriptor, ObjectId};
use tracing::{debug, warn};

use crate::ObjectGateway;
use crate::error::GatewayError;

/// Gateway over a [`NodeRegistry`].
///
/// Holds no state of its own; every call reads the registry, so nodes that
/// become ready after construction are picked up.
#[derive(Clone)]
pub struct StorageGateway {
    registry: Arc<NodeRegistry>,
}

impl StorageGateway {
    /// Create a gateway serving the registry's nodes.
    pub fn new(registry: Arc<NodeRegistry>) -> Self {
        Self { registry }
    }

    /// The registry this gateway routes through.
    pub fn registry(&self) -> &Arc<NodeRegistry> {
        &self.registry
    }

    /// Find the node owning `id` and its live handle.
    pub async fn resolve(
        &self,
        id: &ObjectId,
    ) -> Result<(NodeDescriptor, Arc<dyn ObjectBackend>), GatewayError> {
        let node = select_node(id.as_str(), self.registry.nodes())
            .map_err(|_| GatewayError::NoNodesAvailable)?;

        let backend = self.registry.lookup(&node.id).await.ok_or_else(|| {
            warn!(object = %id, node = %node.id, "object routed to uninitialized node");
            GatewayError::NodeUninitialized {
                node: node.id.clone(),
            }
        })?;

        Ok((node.clone(), backend))
    }
}

#[async_trait::async_trait]
impl ObjectGateway for StorageGateway {
    async fn put_object(
        &self,
        id: &str,
        data: ObjectStream,
        size: u64,
    ) -> Result<(), GatewayError> {
        let id = ObjectId::parse(id)?;
        let (node, backend) = self.resolve(&id).await?;

        debug!(object = %id, node = %node.id, size, "storing object");
        backend
            .put(self.registry.container(), id.as_str(), data, size)
            .await
            .map_err(|source| GatewayError::Backend {
                node: node.id.clone(),
                op: "put_object",
                source,
            })
    }

    async fn get_object(&self, id: &str) -> Result<ObjectStream, GatewayError> {
        let id = ObjectId::parse(id)?;
        let (node, backend) = self.resolve(&id).await?;

        debug!(object = %id, node = %node.id, "retrieving object");
        match backend.get(self.registry.container(), id.as_str()).await {
            Ok(stream) => Ok(stream),
            Err(e) if e.is_not_found() => Err(GatewayError::ObjectNotFound {
                id: id.to_string(),
            }),
            Err(source) => Err(GatewayError::Backend {
                node: node.id,
                op: "get_object",
                source,
            }),
        }
    }
}
