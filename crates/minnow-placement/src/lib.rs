//! Hash placement for object identifiers.
//!
//! Every object lives on exactly one node: the one at index
//! `fnv1a_32(object_id) % nodes.len()` in the discovered node sequence.
//!
//! The mapping is a pure function of the identifier and the ordered node
//! set, so it survives process restarts. It is *not* stable across node-set
//! changes: adding or removing a node remaps most identifiers. Minnow does
//! not rebalance, so a deployment must keep its node set fixed for the
//! lifetime of the data.

mod router;

pub use router::{PlacementError, fnv1a_32, node_index, select_node};
