//! Backend object storage for Minnow nodes.
//!
//! This crate defines the [`ObjectBackend`] capability set every storage
//! node exposes (ensure a container, put an object, get an object) and the
//! [`BackendConnector`] that turns a node descriptor into a live backend
//! handle. Two implementations are provided:
//!
//! - [`S3Backend`] / [`S3Connector`]: any S3-compatible server (MinIO).
//! - [`MemoryBackend`] / [`MemoryConnector`]: in-process storage for local
//!   development and tests.

mod error;
mod memory_store;
mod s3_store;
mod stream;
mod traits;

pub use error::StoreError;
pub use memory_store::{MemoryBackend, MemoryConnector};
pub use s3_store::{DEFAULT_REGION, S3Backend, S3Connector};
pub use stream::{ObjectStream, collect_exact, stream_from_bytes};
pub use traits::{BackendConnector, ObjectBackend};
