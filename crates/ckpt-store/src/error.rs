use std::fmt;

use ckpt_engine::EngineError;

use crate::key::CheckpointKey;

/// The store operation that produced an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    Open,
    Close,
    Save,
    IncrementReference,
    Delete,
    Get,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::Close => write!(f, "close"),
            Self::Save => write!(f, "save"),
            Self::IncrementReference => write!(f, "increment-reference"),
            Self::Delete => write!(f, "delete"),
            Self::Get => write!(f, "get"),
        }
    }
}

/// Errors from checkpoint store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The key has no record, but the operation required one.
    #[error("{op}: no record for key {key}")]
    NotFound { op: Operation, key: CheckpointKey },

    /// A save supplied a value that differs from the one already stored
    /// under the key, so the key is not a content address for it.
    #[error("{op}: content mismatch for key {key}")]
    ContentMismatch { op: Operation, key: CheckpointKey },

    /// The underlying engine failed (I/O, corruption, aborted commit).
    #[error("{op}: storage engine error: {source}")]
    Engine {
        op: Operation,
        #[source]
        source: EngineError,
    },

    /// The stored bytes are not a valid record.
    #[error("{op}: corrupt record for key {key}: {reason}")]
    CorruptRecord {
        op: Operation,
        key: CheckpointKey,
        reason: String,
    },

    /// The reference count cannot be raised any further.
    #[error("{op}: reference count overflow for key {key}")]
    Overflow { op: Operation, key: CheckpointKey },

    /// The operation was cancelled before it began.
    #[error("{op}: cancelled before start")]
    Cancelled { op: Operation },

    /// A key could not be parsed.
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// The configuration could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Coarse classification of a [`StoreError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A record was required but absent.
    NotFound,
    /// The caller supplied an unusable argument.
    InvalidArgument,
    /// The engine failed or returned unusable data.
    Engine,
    /// The reference count hit its bound.
    Overflow,
    /// The operation never started.
    Cancelled,
}

impl StoreError {
    /// Wrap an engine failure with the operation it interrupted.
    pub fn engine(op: Operation, source: EngineError) -> Self {
        Self::Engine { op, source }
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::ContentMismatch { .. } | Self::InvalidKey(_) | Self::Config(_) => {
                ErrorKind::InvalidArgument
            }
            Self::Engine { .. } | Self::CorruptRecord { .. } => ErrorKind::Engine,
            Self::Overflow { .. } => ErrorKind::Overflow,
            Self::Cancelled { .. } => ErrorKind::Cancelled,
        }
    }

    /// Returns `true` if this is a [`ErrorKind::NotFound`] error.
    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
