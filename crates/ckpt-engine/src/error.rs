use std::io;
use std::path::PathBuf;

/// Errors produced by a storage engine.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// I/O error while managing the database file.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Any failure reported by the redb database (storage, corruption,
    /// transaction or commit errors).
    #[error("database error: {0}")]
    Database(#[from] redb::Error),

    /// The database file does not exist and creation was not requested.
    #[error("database not found: {0}")]
    NotFound(PathBuf),

    /// The engine has already been shut down.
    #[error("engine is closed")]
    Closed,

    /// The engine refused to commit the transaction.
    #[error("transaction aborted: {0}")]
    Aborted(String),
}

macro_rules! impl_from_redb {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for EngineError {
                fn from(e: $ty) -> Self {
                    Self::Database(e.into())
                }
            }
        )*
    };
}

impl_from_redb!(
    redb::DatabaseError,
    redb::TransactionError,
    redb::TableError,
    redb::StorageError,
    redb::CommitError,
);

/// Convenience alias used throughout the engine crate.
pub type EngineResult<T> = std::result::Result<T, EngineError>;
