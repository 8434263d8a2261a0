//! S3-compatible backend (MinIO and friends).

use std::sync::Arc;

use aws_sdk_s3::Client;
use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::error::{DisplayErrorContext, SdkError};
use aws_sdk_s3::primitives::ByteStream;
use futures::{StreamExt, TryStreamExt};
use http_body::Frame;
use http_body_util::StreamBody;
use minnow_types::NodeDescriptor;
use sync_wrapper::SyncStream;
use tokio_util::io::ReaderStream;
use tracing::{debug, info};

use crate::error::StoreError;
use crate::stream::{ObjectStream, exact_length};
use crate::traits::{BackendConnector, ObjectBackend};

/// Region sent to servers that ignore it (MinIO accepts any value).
pub const DEFAULT_REGION: &str = "us-east-1";

/// Backend talking to one node's S3 API over plain HTTP.
///
/// Uses path-style addressing (`http://host:port/bucket/key`) and static
/// credentials taken from the node descriptor.
pub struct S3Backend {
    client: Client,
    endpoint: String,
}

impl S3Backend {
    /// Build a client for `node`. Performs no I/O.
    pub fn new(node: &NodeDescriptor, region: &str) -> Self {
        let endpoint = node.endpoint();
        let credentials = Credentials::new(
            node.access_key.clone(),
            node.secret_key.clone(),
            None,
            None,
            "minnow-node-descriptor",
        );

        let config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .endpoint_url(format!("http://{endpoint}"))
            .credentials_provider(credentials)
            .force_path_style(true)
            .build();

        Self {
            client: Client::from_conf(config),
            endpoint,
        }
    }

    /// `address:port` this backend talks to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

fn backend_error<E, R>(operation: &'static str, err: SdkError<E, R>) -> StoreError
where
    E: std::error::Error + 'static,
    R: std::fmt::Debug + 'static,
{
    StoreError::Backend {
        operation,
        message: DisplayErrorContext(err).to_string(),
    }
}

#[async_trait::async_trait]
impl ObjectBackend for S3Backend {
    async fn ensure_container(&self, container: &str) -> Result<bool, StoreError> {
        match self.client.head_bucket().bucket(container).send().await {
            Ok(_) => return Ok(false),
            Err(err) => {
                let missing = err.as_service_error().is_some_and(|e| e.is_not_found());
                if !missing {
                    return Err(backend_error("head_bucket", err));
                }
            }
        }

        match self.client.create_bucket().bucket(container).send().await {
            Ok(_) => {
                info!(container, endpoint = %self.endpoint, "created bucket");
                Ok(true)
            }
            // Someone else created it between the HEAD and the CREATE.
            Err(err)
                if err.as_service_error().is_some_and(|e| {
                    e.is_bucket_already_owned_by_you() || e.is_bucket_already_exists()
                }) =>
            {
                Ok(false)
            }
            Err(err) => Err(backend_error("create_bucket", err)),
        }
    }

    async fn put(
        &self,
        container: &str,
        key: &str,
        body: ObjectStream,
        size: u64,
    ) -> Result<(), StoreError> {
        let content_length = i64::try_from(size).map_err(|_| StoreError::SizeMismatch {
            expected: size,
            actual: 0,
        })?;

        // The SDK wants a `Sync` body; the stream is only ever polled from
        // one task, so `SyncStream` is enough.
        let frames = exact_length(body, size).map_ok(Frame::data);
        let body = ByteStream::from_body_1_x(StreamBody::new(SyncStream::new(frames)));

        debug!(container, key, size, endpoint = %self.endpoint, "put_object");
        self.client
            .put_object()
            .bucket(container)
            .key(key)
            .content_length(content_length)
            .content_type("application/octet-stream")
            .body(body)
            .send()
            .await
            .map_err(|e| backend_error("put_object", e))?;

        Ok(())
    }

    async fn get(&self, container: &str, key: &str) -> Result<ObjectStream, StoreError> {
        debug!(container, key, endpoint = %self.endpoint, "get_object");
        let output = match self
            .client
            .get_object()
            .bucket(container)
            .key(key)
            .send()
            .await
        {
            Ok(output) => output,
            Err(err) if err.as_service_error().is_some_and(|e| e.is_no_such_key()) => {
                return Err(StoreError::NotFound {
                    container: container.to_string(),
                    key: key.to_string(),
                });
            }
            Err(err) => return Err(backend_error("get_object", err)),
        };

        Ok(ReaderStream::new(output.body.into_async_read()).boxed())
    }
}

/// Connector producing [`S3Backend`] handles.
#[derive(Debug, Clone)]
pub struct S3Connector {
    region: String,
}

impl S3Connector {
    /// Create a connector signing requests for `region`.
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
        }
    }
}

impl Default for S3Connector {
    fn default() -> Self {
        Self::new(DEFAULT_REGION)
    }
}

#[async_trait::async_trait]
impl BackendConnector for S3Connector {
    async fn connect(&self, node: &NodeDescriptor) -> Result<Arc<dyn ObjectBackend>, StoreError> {
        if node.address.is_empty() {
            return Err(StoreError::Connect {
                endpoint: node.endpoint(),
                message: "node has no address".to_string(),
            });
        }
        Ok(Arc::new(S3Backend::new(node, &self.region)))
    }
}
