//! Discovery of MinIO containers through the Docker daemon.

use bollard::Docker;
use bollard::container::{InspectContainerOptions, ListContainersOptions};
use minnow_types::{NodeDescriptor, NodeId};
use tracing::{debug, info};

use crate::Discovery;
use crate::error::DiscoveryError;

const ACCESS_KEY_ENV: &str = "MINIO_ACCESS_KEY=";
const SECRET_KEY_ENV: &str = "MINIO_SECRET_KEY=";

/// Finds running containers whose name contains a filter string and turns
/// each into a node descriptor.
///
/// Credentials come from the container's `MINIO_ACCESS_KEY` /
/// `MINIO_SECRET_KEY` environment, the address from the container's own
/// network. Containers without an address are skipped. The result is sorted
/// by container name so placement does not depend on the daemon's listing
/// order.
pub struct DockerDiscovery {
    docker: Docker,
    name_filter: String,
    api_port: u16,
}

impl DockerDiscovery {
    /// Connect to the local Docker daemon (`DOCKER_HOST` or the default socket).
    pub fn connect(name_filter: impl Into<String>, api_port: u16) -> Result<Self, DiscoveryError> {
        let docker = Docker::connect_with_local_defaults()
            .map_err(|e| DiscoveryError::Docker(e.to_string()))?;
        Ok(Self {
            docker,
            name_filter: name_filter.into(),
            api_port,
        })
    }
}

#[async_trait::async_trait]
impl Discovery for DockerDiscovery {
    async fn discover(&self) -> Result<Vec<NodeDescriptor>, DiscoveryError> {
        let containers = self
            .docker
            .list_containers(None::<ListContainersOptions<String>>)
            .await
            .map_err(|e| DiscoveryError::Docker(format!("failed to list containers: {e}")))?;

        let mut nodes = Vec::new();
        for summary in containers {
            let Some(name) = summary.names.as_ref().and_then(|names| names.first()) else {
                continue;
            };
            if !name.contains(&self.name_filter) {
                continue;
            }
            let Some(id) = summary.id.clone() else {
                continue;
            };

            let inspect = self
                .docker
                .inspect_container(&id, None::<InspectContainerOptions>)
                .await
                .map_err(|e| {
                    DiscoveryError::Docker(format!("failed to inspect container {id}: {e}"))
                })?;

            let env = inspect
                .config
                .as_ref()
                .and_then(|c| c.env.clone())
                .unwrap_or_default();
            let access_key = env_value(&env, ACCESS_KEY_ENV);
            let secret_key = env_value(&env, SECRET_KEY_ENV);

            let network_mode = summary
                .host_config
                .as_ref()
                .and_then(|h| h.network_mode.clone())
                .unwrap_or_default();
            let address = inspect
                .network_settings
                .as_ref()
                .and_then(|s| s.networks.as_ref())
                .and_then(|networks| networks.get(&network_mode))
                .and_then(|endpoint| endpoint.ip_address.clone())
                .unwrap_or_default();

            let name = name.trim_start_matches('/').to_string();
            if address.is_empty() {
                debug!(container = %name, "skipping container without an address");
                continue;
            }

            nodes.push(NodeDescriptor {
                id: NodeId::new(id),
                name,
                address,
                port: self.api_port,
                access_key,
                secret_key,
            });
        }

        nodes.sort_by(|a, b| a.name.cmp(&b.name));
        info!(count = nodes.len(), filter = %self.name_filter, "discovered docker nodes");
        Ok(nodes)
    }
}

fn env_value(env: &[String], prefix: &str) -> String {
    env.iter()
        .find_map(|entry| entry.strip_prefix(prefix))
        .unwrap_or_default()
        .to_string()
}
