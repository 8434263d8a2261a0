//! Modulo-hash router.

use minnow_types::NodeDescriptor;
use tracing::trace;

const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

/// Errors from node selection.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlacementError {
    /// The node set is empty, so there is nothing to select.
    #[error("no storage nodes available")]
    NoNodes,
}

/// 32-bit FNV-1a hash.
///
/// This is the placement hash for the lifetime of a deployment. Changing it
/// moves every object to a different node.
pub fn fnv1a_32(bytes: &[u8]) -> u32 {
    bytes.iter().fold(FNV_OFFSET_BASIS, |hash, &b| {
        (hash ^ u32::from(b)).wrapping_mul(FNV_PRIME)
    })
}

/// Index of the node owning `object_id` in a node set of size `node_count`.
///
/// Returns `None` when `node_count` is zero.
pub fn node_index(object_id: &str, node_count: usize) -> Option<usize> {
    if node_count == 0 {
        return None;
    }
    Some(fnv1a_32(object_id.as_bytes()) as usize % node_count)
}

/// Select the node that owns `object_id`.
///
/// Same identifier plus same ordered node set always yields the same node.
pub fn select_node<'a>(
    object_id: &str,
    nodes: &'a [NodeDescriptor],
) -> Result<&'a NodeDescriptor, PlacementError> {
    let index = node_index(object_id, nodes.len()).ok_or(PlacementError::NoNodes)?;
    let node = &nodes[index];
    trace!(object_id, index, node = %node.id, "selected node");
    Ok(node)
}
