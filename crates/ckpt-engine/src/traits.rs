//! The [`StorageEngine`] and [`EngineTransaction`] traits.
//!
//! Any backend (in-memory, redb, something else) implements these to serve
//! as the durable key-value layer beneath the checkpoint store.

use crate::error::EngineResult;

/// Transactional byte-keyed storage engine.
///
/// All implementations must satisfy these invariants:
/// - `get` observes committed state only (read-committed).
/// - Write transactions are serialized: `begin` blocks until no other
///   transaction is open, so a read-then-write inside one transaction cannot
///   interleave with another writer.
/// - `commit` is all-or-nothing. A transaction dropped without committing
///   leaves no trace.
/// - All I/O errors are propagated, never silently ignored.
pub trait StorageEngine: Send + Sync {
    /// Read the committed value stored under `key`.
    ///
    /// Returns `Ok(None)` if the key does not exist.
    fn get(&self, key: &[u8]) -> EngineResult<Option<Vec<u8>>>;

    /// Begin a write transaction.
    fn begin(&self) -> EngineResult<Box<dyn EngineTransaction + '_>>;

    /// Release the engine. No further operations are possible afterwards.
    ///
    /// Default implementation simply drops the engine.
    fn close(self) -> EngineResult<()>
    where
        Self: Sized,
    {
        Ok(())
    }
}

/// A single atomic unit of work against a [`StorageEngine`].
pub trait EngineTransaction {
    /// Read `key`, including writes staged earlier in this transaction.
    fn get(&mut self, key: &[u8]) -> EngineResult<Option<Vec<u8>>>;

    /// Stage a write of `value` under `key`.
    fn put(&mut self, key: &[u8], value: &[u8]) -> EngineResult<()>;

    /// Stage removal of `key`. Removing an absent key is not an error.
    fn delete(&mut self, key: &[u8]) -> EngineResult<()>;

    /// Atomically apply every staged write.
    fn commit(self: Box<Self>) -> EngineResult<()>;

    /// Discard every staged write.
    fn rollback(self: Box<Self>) -> EngineResult<()> {
        Ok(())
    }
}
