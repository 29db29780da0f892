use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

/// Content address of a stored checkpoint value.
///
/// The store treats keys as opaque bytes supplied by the caller. Any length
/// is accepted; [`CheckpointKey::for_content`] derives a BLAKE3 digest for
/// callers that have no hashing scheme of their own.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CheckpointKey(Vec<u8>);

impl CheckpointKey {
    /// Wrap caller-supplied key bytes.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// The BLAKE3 digest of `value` as a key.
    pub fn for_content(value: &[u8]) -> Self {
        Self(blake3::hash(value).as_bytes().to_vec())
    }

    /// The raw key bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Length of the key in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` for the zero-length key.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Hex-encoded string representation.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    /// Short hex representation (at most the first 8 characters).
    pub fn short_hex(&self) -> String {
        short_hex(&self.0)
    }

    /// Parse from a hex string.
    pub fn from_hex(s: &str) -> StoreResult<Self> {
        let bytes = hex::decode(s).map_err(|e| StoreError::InvalidKey(e.to_string()))?;
        Ok(Self(bytes))
    }
}

/// Hex of at most the first four bytes of `bytes`, for log fields.
pub(crate) fn short_hex(bytes: &[u8]) -> String {
    hex::encode(&bytes[..bytes.len().min(4)])
}

impl fmt::Debug for CheckpointKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CheckpointKey({})", self.short_hex())
    }
}

impl fmt::Display for CheckpointKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl AsRef<[u8]> for CheckpointKey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for CheckpointKey {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&[u8]> for CheckpointKey {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl From<CheckpointKey> for Vec<u8> {
    fn from(key: CheckpointKey) -> Self {
        key.0
    }
}
