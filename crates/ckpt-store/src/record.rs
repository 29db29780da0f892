//! On-disk record framing.
//!
//! A record is the reference count followed directly by the value:
//!
//! ```text
//! [4 bytes: reference count (native-endian i32)]
//! [N bytes: value, N = record length - 4]
//! ```
//!
//! There is no length prefix or separator. This layout is shared with
//! databases written by earlier deployments and must not change.

/// Width of the reference count prefix.
pub const COUNT_WIDTH: usize = std::mem::size_of::<i32>();

/// Reasons a stored byte string is not a valid record.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RecordError {
    /// Fewer bytes than the count prefix.
    #[error("record is {len} bytes, shorter than the 4-byte count prefix")]
    Truncated { len: usize },

    /// A persisted record must have at least one reference.
    #[error("stored reference count {0} is not positive")]
    InvalidCount(i32),
}

/// A decoded record: reference count plus value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Record {
    /// Number of owners currently holding this value. Always `>= 1` for a
    /// persisted record.
    pub reference_count: i32,
    /// The opaque payload.
    pub value: Vec<u8>,
}

impl Record {
    /// A freshly saved record with a single reference.
    pub fn new(value: Vec<u8>) -> Self {
        Self {
            reference_count: 1,
            value,
        }
    }

    /// Serialize into the on-disk layout.
    pub fn encode(&self) -> Vec<u8> {
        encode(self.reference_count, &self.value)
    }

    /// Parse the on-disk layout.
    pub fn decode(bytes: &[u8]) -> Result<Self, RecordError> {
        if bytes.len() < COUNT_WIDTH {
            return Err(RecordError::Truncated { len: bytes.len() });
        }
        let (count, value) = bytes.split_at(COUNT_WIDTH);
        let reference_count = i32::from_ne_bytes([count[0], count[1], count[2], count[3]]);
        if reference_count < 1 {
            return Err(RecordError::InvalidCount(reference_count));
        }
        Ok(Self {
            reference_count,
            value: value.to_vec(),
        })
    }
}

/// Frame `value` behind a `count` prefix without building a [`Record`].
pub fn encode(count: i32, value: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(COUNT_WIDTH + value.len());
    buf.extend_from_slice(&count.to_ne_bytes());
    buf.extend_from_slice(value);
    buf
}
