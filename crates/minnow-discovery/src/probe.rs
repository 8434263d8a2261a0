//! TCP reachability probe.

use std::time::Duration;

use minnow_types::NodeDescriptor;
use tokio::net::TcpStream;
use tracing::debug;

/// Default timeout for [`can_reach`].
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// Try to open a TCP connection to the node's storage API.
pub async fn can_reach(node: &NodeDescriptor, timeout: Duration) -> bool {
    let endpoint = node.endpoint();
    match tokio::time::timeout(timeout, TcpStream::connect(&endpoint)).await {
        Ok(Ok(_)) => true,
        Ok(Err(e)) => {
            debug!(node = %node.id, %endpoint, %e, "node unreachable");
            false
        }
        Err(_) => {
            debug!(node = %node.id, %endpoint, "node probe timed out");
            false
        }
    }
}
