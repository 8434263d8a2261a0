//! Shared test harness for Minnow integration tests.
//!
//! Provides [`IntegrationGateway`], an N-node gateway over in-memory backends
//! that exercises the full request path: validation, placement, registry
//! lookup, and the backend put/get.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use minnow_gateway::{GatewayError, ObjectGateway, StorageGateway};
use minnow_http::ApiServer;
use minnow_registry::{InitReport, NodeRegistry, RetryPolicy};
use minnow_store::{
    BackendConnector, MemoryBackend, MemoryConnector, ObjectBackend, StoreError,
    stream_from_bytes,
};
use minnow_types::{DEFAULT_CONTAINER, NodeDescriptor, NodeId};

// =========================================================================
// Flaky connector
// =========================================================================

/// Connector that fails a set number of times per node before handing out
/// memory backends.
///
/// `u32::MAX` failures makes a node permanently unreachable.
#[derive(Default)]
pub struct FlakyConnector {
    inner: MemoryConnector,
    failures: HashMap<NodeId, u32>,
    calls: Mutex<HashMap<NodeId, u32>>,
}

impl FlakyConnector {
    /// Fail the first `times` connection attempts to node `id`.
    pub fn failing(mut self, id: NodeId, times: u32) -> Self {
        self.failures.insert(id, times);
        self
    }

    /// Connection attempts made so far to node `id`.
    pub fn calls(&self, id: &NodeId) -> u32 {
        let calls = self.calls.lock().unwrap_or_else(PoisonError::into_inner);
        calls.get(id).copied().unwrap_or(0)
    }

    /// The memory backend behind node `id`, once it connected.
    pub async fn backend(&self, id: &NodeId) -> Option<Arc<MemoryBackend>> {
        self.inner.backend(id).await
    }
}

#[async_trait]
impl BackendConnector for FlakyConnector {
    async fn connect(&self, node: &NodeDescriptor) -> Result<Arc<dyn ObjectBackend>, StoreError> {
        let call = {
            let mut calls = self.calls.lock().unwrap_or_else(PoisonError::into_inner);
            let n = calls.entry(node.id.clone()).or_insert(0);
            *n += 1;
            *n
        };

        if call <= self.failures.get(&node.id).copied().unwrap_or(0) {
            return Err(StoreError::Connect {
                endpoint: node.endpoint(),
                message: format!("connection refused (attempt {call})"),
            });
        }
        self.inner.connect(node).await
    }
}

// =========================================================================
// IntegrationGateway
// =========================================================================

/// An N-node gateway with in-memory backends and failure injection.
pub struct IntegrationGateway {
    nodes: Vec<NodeDescriptor>,
    registry: Arc<NodeRegistry>,
    gateway: StorageGateway,
    connector: Arc<FlakyConnector>,
    report: InitReport,
}

impl IntegrationGateway {
    /// Create a gateway over `n` healthy nodes.
    pub async fn new(n: usize) -> Self {
        Self::with_down_nodes(n, &[]).await
    }

    /// Create a gateway over `n` nodes where the nodes at indices `down`
    /// never initialize.
    pub async fn with_down_nodes(n: usize, down: &[usize]) -> Self {
        let nodes = test_nodes(n);
        let mut connector = FlakyConnector::default();
        for &i in down {
            connector = connector.failing(nodes[i].id.clone(), u32::MAX);
        }
        let policy = RetryPolicy::no_delay(RetryPolicy::DEFAULT_MAX_ATTEMPTS);
        Self::with_connector(nodes, connector, policy).await
    }

    /// Create a gateway over `nodes`, initializing them through `connector`
    /// under `policy`.
    pub async fn with_connector(
        nodes: Vec<NodeDescriptor>,
        connector: FlakyConnector,
        policy: RetryPolicy,
    ) -> Self {
        let connector = Arc::new(connector);
        let registry = Arc::new(NodeRegistry::new(nodes.clone()));
        let report = registry.connect_all(connector.as_ref(), &policy).await;
        let gateway = StorageGateway::new(registry.clone());
        Self {
            nodes,
            registry,
            gateway,
            connector,
            report,
        }
    }

    /// The gateway under test.
    pub fn gateway(&self) -> &StorageGateway {
        &self.gateway
    }

    /// The registry behind the gateway.
    pub fn registry(&self) -> &Arc<NodeRegistry> {
        &self.registry
    }

    /// The connector, for attempt counts.
    pub fn connector(&self) -> &FlakyConnector {
        &self.connector
    }

    /// Outcome of initialization.
    pub fn report(&self) -> &InitReport {
        &self.report
    }

    /// ID of node `i`.
    pub fn node_id(&self, i: usize) -> NodeId {
        self.nodes[i].id.clone()
    }

    /// Number of nodes in the set.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the node set is empty.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// An HTTP router over this gateway.
    pub fn router(&self) -> axum::Router {
        ApiServer::new(Arc::new(self.gateway.clone())).into_router()
    }

    /// Store `data` under `id`.
    pub async fn put(&self, id: &str, data: &[u8]) -> Result<(), GatewayError> {
        self.gateway
            .put_object(
                id,
                stream_from_bytes(Bytes::copy_from_slice(data)),
                data.len() as u64,
            )
            .await
    }

    /// Read the whole object stored under `id`.
    pub async fn get(&self, id: &str) -> Result<Vec<u8>, GatewayError> {
        let mut stream = self.gateway.get_object(id).await?;
        let mut out = Vec::new();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| GatewayError::Backend {
                node: NodeId::new("stream"),
                op: "get_object",
                source: e.into(),
            })?;
            out.extend_from_slice(&chunk);
        }
        Ok(out)
    }

    /// Number of objects stored on node `i` (0 if it never connected).
    pub async fn object_count(&self, i: usize) -> usize {
        match self.connector.backend(&self.nodes[i].id).await {
            Some(backend) => backend.object_count(DEFAULT_CONTAINER).await,
            None => 0,
        }
    }

    /// Indices of the nodes holding an object under `id`.
    pub async fn holders(&self, id: &str) -> Vec<usize> {
        let mut holders = Vec::new();
        for (i, node) in self.nodes.iter().enumerate() {
            if let Some(backend) = self.connector.backend(&node.id).await {
                if backend.contains(DEFAULT_CONTAINER, id).await {
                    holders.push(i);
                }
            }
        }
        holders
    }
}

// =========================================================================
// Helpers
// =========================================================================

/// `n` node descriptors named `node-0` .. `node-{n-1}`.
pub fn test_nodes(n: usize) -> Vec<NodeDescriptor> {
    (0..n)
        .map(|i| NodeDescriptor {
            id: NodeId::new(format!("node-{i}")),
            name: format!("minio-{i}"),
            address: format!("10.0.0.{}", i + 1),
            port: 9000,
            access_key: "minioadmin".to_string(),
            secret_key: "minioadmin".to_string(),
        })
        .collect()
}

/// Generate deterministic test data of the given size.
pub fn test_data(size: usize) -> Vec<u8> {
    test_data_seeded(size, 0xDEAD_BEEF)
}

/// Generate test data with a specific seed (for unique objects).
pub fn test_data_seeded(size: usize, seed: u32) -> Vec<u8> {
    let mut data = Vec::with_capacity(size);
    let mut state: u32 = seed;
    for _ in 0..size {
        state = state.wrapping_mul(1103515245).wrapping_add(12345);
        data.push((state >> 16) as u8);
    }
    data
}

/// Object identifiers that all hash onto node `target` of `n`.
pub fn ids_on_node(target: usize, n: usize, count: usize) -> Vec<String> {
    (0..)
        .map(|i| format!("obj{i}"))
        .filter(|id| minnow_placement::node_index(id, n) == Some(target))
        .take(count)
        .collect()
}

/// Distinct nodes the given identifiers would be spread over.
pub fn distinct_nodes(ids: &[String], n: usize) -> HashSet<usize> {
    ids.iter()
        .filter_map(|id| minnow_placement::node_index(id, n))
        .collect()
}
