//! Per-node initialization lifecycle.

use std::fmt;

/// Where a node is in its initialization lifecycle.
///
/// `Uninitialized -> Connecting -> Ready | Failed`. Only `Ready` nodes have a
/// backend handle in the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeState {
    /// Discovered, initialization not started.
    Uninitialized,
    /// An initialization attempt loop is running.
    Connecting,
    /// Handle built and container verified.
    Ready,
    /// Every attempt failed.
    Failed {
        /// Attempts made.
        attempts: u32,
        /// Error from the last attempt.
        last_error: String,
    },
}

impl NodeState {
    /// Whether the node has a usable handle.
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }

    /// Whether the node gave up initializing.
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

impl fmt::Display for NodeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uninitialized => f.write_str("uninitialized"),
            Self::Connecting => f.write_str("connecting"),
            Self::Ready => f.write_str("ready"),
            Self::Failed {
                attempts,
                last_error,
            } => write!(f, "failed after {attempts} attempts: {last_error}"),
        }
    }
}
