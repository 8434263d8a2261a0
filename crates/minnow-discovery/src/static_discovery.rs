//! Discovery from a fixed node list.

use std::collections::HashSet;

use minnow_types::{NodeDescriptor, NodeId};
use tracing::info;

use crate::Discovery;
use crate::error::DiscoveryError;

/// Serves a node list fixed at construction, in the given order.
#[derive(Debug, Clone, Default)]
pub struct StaticDiscovery {
    nodes: Vec<NodeDescriptor>,
}

impl StaticDiscovery {
    /// Serve `nodes` as listed.
    pub fn new(nodes: Vec<NodeDescriptor>) -> Self {
        Self { nodes }
    }

    /// Synthesize `count` local nodes named `memory-0`, `memory-1`, ...
    ///
    /// Used with the in-memory backend, where nodes have no real address.
    pub fn memory(count: usize) -> Self {
        let nodes = (0..count)
            .map(|i| NodeDescriptor {
                id: NodeId::new(format!("memory-{i}")),
                name: format!("memory-{i}"),
                address: "127.0.0.1".to_string(),
                port: 0,
                access_key: String::new(),
                secret_key: String::new(),
            })
            .collect();
        Self { nodes }
    }
}

#[async_trait::async_trait]
impl Discovery for StaticDiscovery {
    async fn discover(&self) -> Result<Vec<NodeDescriptor>, DiscoveryError> {
        let mut seen = HashSet::with_capacity(self.nodes.len());
        for node in &self.nodes {
            if !seen.insert(&node.id) {
                return Err(DiscoveryError::DuplicateNode(node.id.clone()));
            }
        }

        info!(count = self.nodes.len(), "discovered static nodes");
        Ok(self.nodes.clone())
    }
}
