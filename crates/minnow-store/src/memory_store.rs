//! In-memory backend.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use bytes::Bytes;
use minnow_types::{NodeDescriptor, NodeId};
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use crate::error::StoreError;
use crate::stream::{ObjectStream, collect_exact, stream_from_bytes};
use crate::traits::{BackendConnector, ObjectBackend};

/// In-memory backend: containers of objects behind a `RwLock<HashMap>`.
///
/// Behaves like a real node for the parts Minnow relies on: objects live in
/// containers that must exist first, and missing keys report
/// [`StoreError::NotFound`].
#[derive(Default)]
pub struct MemoryBackend {
    containers: RwLock<HashMap<String, HashMap<String, Bytes>>>,
}

impl MemoryBackend {
    /// Create an empty backend with no containers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of objects stored in `container` (0 if it does not exist).
    pub async fn object_count(&self, container: &str) -> usize {
        let containers = self.containers.read().await;
        containers.get(container).map_or(0, HashMap::len)
    }

    /// Whether `key` is stored in `container`.
    pub async fn contains(&self, container: &str, key: &str) -> bool {
        let containers = self.containers.read().await;
        containers
            .get(container)
            .is_some_and(|objects| objects.contains_key(key))
    }

    /// Whether `container` exists.
    pub async fn has_container(&self, container: &str) -> bool {
        self.containers.read().await.contains_key(container)
    }
}

#[async_trait::async_trait]
impl ObjectBackend for MemoryBackend {
    async fn ensure_container(&self, container: &str) -> Result<bool, StoreError> {
        let mut containers = self.containers.write().await;
        if containers.contains_key(container) {
            return Ok(false);
        }
        containers.insert(container.to_string(), HashMap::new());
        debug!(container, "created container in memory");
        Ok(true)
    }

    async fn put(
        &self,
        container: &str,
        key: &str,
        body: ObjectStream,
        size: u64,
    ) -> Result<(), StoreError> {
        // Read the body before taking the lock.
        let data = collect_exact(body, size).await?;

        let mut containers = self.containers.write().await;
        let objects = containers
            .get_mut(container)
            .ok_or_else(|| StoreError::ContainerNotFound {
                container: container.to_string(),
            })?;

        debug!(container, key, size, "storing object in memory");
        objects.insert(key.to_string(), data);
        Ok(())
    }

    async fn get(&self, container: &str, key: &str) -> Result<ObjectStream, StoreError> {
        let containers = self.containers.read().await;
        let objects = containers
            .get(container)
            .ok_or_else(|| StoreError::ContainerNotFound {
                container: container.to_string(),
            })?;

        match objects.get(key) {
            Some(data) => Ok(stream_from_bytes(data.clone())),
            None => Err(StoreError::NotFound {
                container: container.to_string(),
                key: key.to_string(),
            }),
        }
    }
}

/// Connector handing out one [`MemoryBackend`] per node.
///
/// Reconnecting to the same node returns the same backend, so data survives
/// re-initialization the way it would on a real server. Nodes marked
/// unreachable fail every connection attempt.
#[derive(Default)]
pub struct MemoryConnector {
    backends: Mutex<HashMap<NodeId, Arc<MemoryBackend>>>,
    unreachable: HashSet<NodeId>,
}

impl MemoryConnector {
    /// Create a connector where every node is reachable.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make connection attempts to `nodes` fail.
    pub fn with_unreachable(mut self, nodes: impl IntoIterator<Item = NodeId>) -> Self {
        self.unreachable.extend(nodes);
        self
    }

    /// The backend created for `node`, if it was ever connected.
    pub async fn backend(&self, node: &NodeId) -> Option<Arc<MemoryBackend>> {
        self.backends.lock().await.get(node).cloned()
    }
}

#[async_trait::async_trait]
impl BackendConnector for MemoryConnector {
    async fn connect(&self, node: &NodeDescriptor) -> Result<Arc<dyn ObjectBackend>, StoreError> {
        if self.unreachable.contains(&node.id) {
            return Err(StoreError::Connect {
                endpoint: node.endpoint(),
                message: "node unreachable".to_string(),
            });
        }

        let mut backends = self.backends.lock().await;
        let backend = backends
            .entry(node.id.clone())
            .or_insert_with(|| Arc::new(MemoryBackend::new()))
            .clone();
        Ok(backend)
    }
}
