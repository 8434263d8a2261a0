//! Error types for backend storage operations.

/// Errors that can occur while talking to a backend node.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested object does not exist on the backend.
    #[error("object not found: {container}/{key}")]
    NotFound {
        /// Container the lookup ran in.
        container: String,
        /// Object key.
        key: String,
    },

    /// The container has not been created on this backend.
    #[error("container not found: {container}")]
    ContainerNotFound {
        /// Container name.
        container: String,
    },

    /// The upload body did not match its declared length.
    #[error("size mismatch: declared {expected} bytes, received {actual}")]
    SizeMismatch {
        /// Declared byte count.
        expected: u64,
        /// Bytes actually read before the mismatch was detected.
        actual: u64,
    },

    /// Could not reach or set up a client for the node.
    #[error("failed to connect to {endpoint}: {message}")]
    Connect {
        /// `address:port` of the node.
        endpoint: String,
        /// Description of the failure.
        message: String,
    },

    /// The backend rejected or failed the request.
    #[error("backend {operation} failed: {message}")]
    Backend {
        /// Backend operation that failed (`put_object`, `head_bucket`, ...).
        operation: &'static str,
        /// Description of the failure.
        message: String,
    },

    /// An I/O error while streaming object data.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Whether this error means "the object does not exist".
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
