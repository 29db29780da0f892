//! Transactional key-value engines for the checkpoint store.
//!
//! The checkpoint store layers reference counting over an engine that offers
//! durable reads and atomic, serialized write transactions. This crate
//! defines that contract and ships two backends.
//!
//! # Storage Backends
//!
//! All backends implement the [`StorageEngine`] trait:
//!
//! - [`InMemoryEngine`] -- `HashMap`-based engine for tests and embedding
//! - [`RedbEngine`] -- on-disk engine backed by a single redb database file
//!
//! # Design Rules
//!
//! 1. Plain reads see committed state only.
//! 2. One write transaction at a time; a read inside it sees its own writes.
//! 3. Commit is all-or-nothing; an uncommitted transaction leaves no trace.
//! 4. Keys and values are opaque bytes -- the engine never interprets them.
//! 5. All I/O errors are propagated, never silently ignored.

pub mod config;
pub mod error;
pub mod memory;
pub mod redb_engine;
pub mod traits;

// Re-export primary types at crate root for ergonomic imports.
pub use config::{Durability, EngineConfig};
pub use error::{EngineError, EngineResult};
pub use memory::InMemoryEngine;
pub use redb_engine::RedbEngine;
pub use traits::{EngineTransaction, StorageEngine};
