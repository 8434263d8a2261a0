//! The node registry: node set, per-node state, and live backend handles.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::join_all;
use minnow_store::{BackendConnector, ObjectBackend, StoreError};
use minnow_types::{DEFAULT_CONTAINER, NodeDescriptor, NodeId};
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use crate::error::RegistryError;
use crate::retry::RetryPolicy;
use crate::state::NodeState;

/// Outcome of initializing the whole node set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InitReport {
    /// Nodes that ended up ready, in node-set order.
    pub ready: Vec<NodeId>,
    /// Nodes that exhausted their attempts, in node-set order.
    pub failed: Vec<NodeId>,
}

impl InitReport {
    /// Number of nodes covered by the report.
    pub fn total(&self) -> usize {
        self.ready.len() + self.failed.len()
    }

    /// Decide whether the registry is usable.
    ///
    /// Zero ready nodes is always an error. With `require_all`, any failed
    /// node is an error too.
    pub fn check(&self, require_all: bool) -> Result<(), RegistryError> {
        if self.ready.is_empty() {
            return Err(RegistryError::NoNodesAvailable);
        }
        if require_all && !self.failed.is_empty() {
            return Err(RegistryError::NodesFailed {
                failed: self.failed.clone(),
                total: self.total(),
            });
        }
        Ok(())
    }
}

#[derive(Default)]
struct Inner {
    clients: HashMap<NodeId, Arc<dyn ObjectBackend>>,
    states: HashMap<NodeId, NodeState>,
    /// Token of the attempt loop currently owning each `Connecting` node.
    claims: HashMap<NodeId, u64>,
    next_claim: u64,
}

impl Inner {
    /// Settle `node` into its final `state` and drop its claim.
    fn settle(&mut self, node: &NodeId, state: NodeState) {
        self.claims.remove(node);
        self.states.insert(node.clone(), state);
    }

    /// Hand an abandoned claim back: the node returns to `Uninitialized`
    /// unless a newer claim took it over in the meantime.
    fn release(&mut self, node: &NodeId, token: u64) {
        if self.claims.get(node) != Some(&token) {
            return;
        }
        self.claims.remove(node);
        if matches!(self.states.get(node), Some(NodeState::Connecting)) {
            self.states.insert(node.clone(), NodeState::Uninitialized);
        }
    }
}

/// Ownership of one node's attempt loop.
///
/// Dropping an unsettled claim (the loop's future was cancelled) releases
/// the node so a later call can initialize it.
struct Claim {
    inner: Arc<RwLock<Inner>>,
    node: NodeId,
    token: u64,
    settled: bool,
}

impl Claim {
    fn settle(mut self) {
        self.settled = true;
    }
}

impl Drop for Claim {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        warn!(node = %self.node, "storage node initialization abandoned");
        if let Ok(mut inner) = self.inner.try_write() {
            inner.release(&self.node, self.token);
            return;
        }
        // Lock busy: release once it frees up.
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let inner = self.inner.clone();
            let node = self.node.clone();
            let token = self.token;
            handle.spawn(async move {
                inner.write().await.release(&node, token);
            });
        }
    }
}

/// Owns the discovered node set and one backend handle per ready node.
///
/// The node order is fixed at construction and is the order placement hashes
/// onto. Handles and states share one lock so readers see them change
/// together; the lock is never held across I/O.
pub struct NodeRegistry {
    nodes: Vec<NodeDescriptor>,
    container: String,
    inner: Arc<RwLock<Inner>>,
}

impl NodeRegistry {
    /// Create a registry over `nodes`, all uninitialized, storing objects in
    /// the default container.
    pub fn new(nodes: Vec<NodeDescriptor>) -> Self {
        Self::with_container(nodes, DEFAULT_CONTAINER)
    }

    /// Create a registry whose nodes store objects in `container`.
    pub fn with_container(nodes: Vec<NodeDescriptor>, container: impl Into<String>) -> Self {
        let states = nodes
            .iter()
            .map(|n| (n.id.clone(), NodeState::Uninitialized))
            .collect();
        Self {
            nodes,
            container: container.into(),
            inner: Arc::new(RwLock::new(Inner {
                states,
                ..Inner::default()
            })),
        }
    }

    /// Build a registry over `nodes` and initialize all of them.
    ///
    /// Fails with [`RegistryError::NoNodesAvailable`] when no node ends up
    /// ready. Partially failed node sets are accepted.
    pub async fn initialize(
        nodes: Vec<NodeDescriptor>,
        connector: &dyn BackendConnector,
        policy: &RetryPolicy,
    ) -> Result<Arc<Self>, RegistryError> {
        let registry = Arc::new(Self::new(nodes));
        let report = registry.connect_all(connector, policy).await;
        report.check(false)?;
        Ok(registry)
    }

    /// Initialize every node concurrently.
    pub async fn connect_all(
        &self,
        connector: &dyn BackendConnector,
        policy: &RetryPolicy,
    ) -> InitReport {
        info!(
            nodes = self.nodes.len(),
            max_attempts = policy.attempts(),
            delay = ?policy.delay,
            attempt_timeout = ?policy.attempt_timeout,
            "initializing storage nodes"
        );

        let outcomes = join_all(
            self.nodes
                .iter()
                .map(|node| self.init_node(node, connector, policy)),
        )
        .await;

        let mut report = InitReport::default();
        for (node, state) in self.nodes.iter().zip(outcomes) {
            match state {
                NodeState::Ready => report.ready.push(node.id.clone()),
                NodeState::Failed { .. } => report.failed.push(node.id.clone()),
                NodeState::Uninitialized | NodeState::Connecting => {}
            }
        }

        if report.failed.is_empty() {
            info!(ready = report.ready.len(), "all storage nodes ready");
        } else {
            warn!(
                ready = report.ready.len(),
                failed = report.failed.len(),
                "storage nodes partially available"
            );
        }
        report
    }

    /// Initialize one node of the set.
    ///
    /// A node already ready, or with an attempt loop already running, is
    /// left alone and its current state returned. Otherwise the node is
    /// retried under `policy` and its final state returned.
    pub async fn connect_node(
        &self,
        node: &NodeId,
        connector: &dyn BackendConnector,
        policy: &RetryPolicy,
    ) -> Result<NodeState, RegistryError> {
        let descriptor = self
            .descriptor(node)
            .ok_or_else(|| RegistryError::UnknownNode(node.clone()))?;
        Ok(self.init_node(descriptor, connector, policy).await)
    }

    async fn init_node(
        &self,
        node: &NodeDescriptor,
        connector: &dyn BackendConnector,
        policy: &RetryPolicy,
    ) -> NodeState {
        let claim = {
            let mut inner = self.inner.write().await;
            let state = inner
                .states
                .entry(node.id.clone())
                .or_insert(NodeState::Uninitialized);
            if matches!(state, NodeState::Ready | NodeState::Connecting) {
                return state.clone();
            }
            *state = NodeState::Connecting;
            inner.next_claim += 1;
            let token = inner.next_claim;
            inner.claims.insert(node.id.clone(), token);
            Claim {
                inner: self.inner.clone(),
                node: node.id.clone(),
                token,
                settled: false,
            }
        };

        let max_attempts = policy.attempts();
        let mut last_error = String::new();

        for attempt in 1..=max_attempts {
            let outcome =
                match tokio::time::timeout(policy.attempt_timeout, self.open(node, connector))
                    .await
                {
                    Ok(result) => result.map_err(|e| e.to_string()),
                    Err(_) => Err(format!(
                        "attempt timed out after {:?}",
                        policy.attempt_timeout
                    )),
                };

            match outcome {
                Ok(backend) => {
                    {
                        let mut inner = self.inner.write().await;
                        inner.clients.insert(node.id.clone(), backend);
                        inner.settle(&node.id, NodeState::Ready);
                    }
                    claim.settle();
                    info!(node = %node.id, name = %node.name, endpoint = %node.endpoint(), attempt, "storage node ready");
                    return NodeState::Ready;
                }
                Err(e) => {
                    warn!(
                        node = %node.id,
                        name = %node.name,
                        attempt,
                        max_attempts,
                        error = %e,
                        "storage node initialization attempt failed"
                    );
                    last_error = e;
                    if attempt < max_attempts {
                        tokio::time::sleep(policy.delay).await;
                    }
                }
            }
        }

        error!(
            node = %node.id,
            name = %node.name,
            attempts = max_attempts,
            error = %last_error,
            "storage node failed to initialize, giving up"
        );
        let state = NodeState::Failed {
            attempts: max_attempts,
            last_error,
        };
        self.inner.write().await.settle(&node.id, state.clone());
        claim.settle();
        state
    }

    /// One attempt: build a handle, then make sure the container exists.
    async fn open(
        &self,
        node: &NodeDescriptor,
        connector: &dyn BackendConnector,
    ) -> Result<Arc<dyn ObjectBackend>, StoreError> {
        let backend = connector.connect(node).await?;
        if backend.ensure_container(&self.container).await? {
            info!(node = %node.id, container = %self.container, "created container");
        }
        Ok(backend)
    }

    /// Handle for `node`, if it is ready.
    pub async fn lookup(&self, node: &NodeId) -> Option<Arc<dyn ObjectBackend>> {
        self.inner.read().await.clients.get(node).cloned()
    }

    /// The node set, in placement order.
    pub fn nodes(&self) -> &[NodeDescriptor] {
        &self.nodes
    }

    /// Descriptor of `node`, if it belongs to the set.
    pub fn descriptor(&self, node: &NodeId) -> Option<&NodeDescriptor> {
        self.nodes.iter().find(|n| &n.id == node)
    }

    /// Container objects are stored in on every node.
    pub fn container(&self) -> &str {
        &self.container
    }

    /// Current state of `node`, if it belongs to the set.
    pub async fn state(&self, node: &NodeId) -> Option<NodeState> {
        self.inner.read().await.states.get(node).cloned()
    }

    /// Number of nodes with a live handle.
    pub async fn ready_count(&self) -> usize {
        self.inner.read().await.clients.len()
    }

    /// Every node with its current state, in placement order.
    pub async fn snapshot(&self) -> Vec<(NodeDescriptor, NodeState)> {
        let inner = self.inner.read().await;
        self.nodes
            .iter()
            .map(|n| {
                let state = inner
                    .states
                    .get(&n.id)
                    .cloned()
                    .unwrap_or(NodeState::Uninitialized);
                (n.clone(), state)
            })
            .collect()
    }
}
