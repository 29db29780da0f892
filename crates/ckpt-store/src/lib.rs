//! Reference-counted, content-addressed checkpoint storage.
//!
//! Checkpoint data is often shared: many in-memory structures can point at
//! the same serialized blob. This crate stores each distinct blob once, keyed
//! by its content hash, and counts how many owners reference it. A blob is
//! physically removed only when its last owner lets go.
//!
//! # Operations
//!
//! - [`CheckpointStore::save`] -- store a value, or add an owner to the
//!   identical value already stored under the key
//! - [`CheckpointStore::increment_reference`] -- add an owner to existing
//!   content
//! - [`CheckpointStore::delete`] -- drop an owner, removing the value at zero
//! - [`CheckpointStore::get`] -- read the value and its current count
//!
//! # Design Rules
//!
//! 1. A key maps to exactly one value; a save with different content fails.
//! 2. A persisted record always has a reference count of at least one.
//! 3. Each mutation reads and writes its record in one engine transaction.
//! 4. Engine failures are surfaced unchanged, tagged with the operation.
//! 5. Records are framed as a native-endian `i32` count followed by the raw
//!    value (see [`record`]).

pub mod async_store;
pub mod config;
pub mod error;
pub mod key;
pub mod record;
pub mod store;

#[cfg(test)]
mod proptests;

// Re-export primary types at crate root for ergonomic imports.
pub use async_store::{AsyncCheckpointStore, UnitOfWork, WorkState};
pub use config::{OverflowPolicy, StoreConfig};
pub use error::{ErrorKind, Operation, StoreError, StoreResult};
pub use key::CheckpointKey;
pub use record::{Record, RecordError};
pub use store::CheckpointStore;

pub use ckpt_engine::{
    Durability, EngineConfig, EngineError, EngineTransaction, InMemoryEngine, RedbEngine,
    StorageEngine,
};
