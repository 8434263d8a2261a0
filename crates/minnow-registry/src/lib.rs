//! Node registry for Minnow.
//!
//! The [`NodeRegistry`] owns the node set produced by discovery and a live
//! backend handle for every node that finished initialization. Nodes are
//! initialized concurrently under a [`RetryPolicy`]; a node that exhausts its
//! attempts is left [`NodeState::Failed`] without a handle, and requests
//! routed to it fail until the process is restarted.

mod error;
mod registry;
mod retry;
mod state;


pub use error::RegistryError;
pub use registry::{InitReport, NodeRegistry};
pub use retry::RetryPolicy;
pub use state::NodeState;
