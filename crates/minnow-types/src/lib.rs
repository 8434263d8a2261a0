//! Shared types and identifiers for Minnow.
//!
//! This crate defines the core types used across the Minnow workspace:
//! node identity ([`NodeId`], [`NodeDescriptor`]) and object identity
//! ([`ObjectId`]) together with the syntactic rules an object identifier
//! must satisfy ([`ValidationError`]).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Name of the container (bucket) every object is stored in on each node.
pub const DEFAULT_CONTAINER: &str = "objects";

/// Maximum length of an object identifier, in bytes.
pub const MAX_OBJECT_ID_LEN: usize = 32;

// ---------------------------------------------------------------------------
// Node identity
// ---------------------------------------------------------------------------

/// Stable identifier of a backend node, unique within one discovery run.
#[derive(Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Create a node identifier from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

/// Identity and connection info for one backend storage node.
///
/// Produced once by discovery and never mutated afterwards. The position of a
/// descriptor in the discovered sequence is what placement hashes onto, so
/// the sequence order matters as much as the contents.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeDescriptor {
    /// Stable unique identity (container ID, configured ID, ...).
    pub id: NodeId,
    /// Human-readable name used in logs.
    pub name: String,
    /// Host name or IP address of the node's storage API.
    pub address: String,
    /// Port of the node's storage API.
    pub port: u16,
    /// Access key for the node's storage API.
    pub access_key: String,
    /// Secret key for the node's storage API. Never logged.
    pub secret_key: String,
}

impl NodeDescriptor {
    /// `address:port` of the node's storage API.
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }
}

impl fmt::Debug for NodeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeDescriptor")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("address", &self.address)
            .field("port", &self.port)
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Object identity
// ---------------------------------------------------------------------------

/// Reasons an object identifier is rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Empty, or longer than [`MAX_OBJECT_ID_LEN`].
    #[error("object ID must be between 1 and 32 characters")]
    InvalidLength {
        /// Length of the rejected identifier, in bytes.
        len: usize,
    },

    /// Contains something other than ASCII letters and digits.
    #[error("object ID must contain only alphanumeric characters")]
    InvalidCharacter {
        /// The first offending character.
        found: char,
    },
}

/// A client-supplied object key: 1 to 32 ASCII alphanumeric characters.
///
/// The only way to obtain one is through [`ObjectId::parse`] (or `FromStr`),
/// so any `ObjectId` in hand has already passed validation.
#[derive(Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct ObjectId(String);

impl ObjectId {
    /// Validate `raw` and wrap it.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let len = raw.len();
        if len == 0 || len > MAX_OBJECT_ID_LEN {
            return Err(ValidationError::InvalidLength { len });
        }

        if let Some(found) = raw.chars().find(|c| !c.is_ascii_alphanumeric()) {
            return Err(ValidationError::InvalidCharacter { found });
        }

        Ok(Self(raw.to_string()))
    }

    /// Borrow the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Raw bytes of the identifier (what placement hashes).
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

/// Validate a raw identifier taken from a request.
pub fn validate_identifier(raw: &str) -> Result<ObjectId, ValidationError> {
    ObjectId::parse(raw)
}

impl FromStr for ObjectId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for ObjectId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", self.0)
    }
}

impl<'de> Deserialize<'de> for ObjectId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}
