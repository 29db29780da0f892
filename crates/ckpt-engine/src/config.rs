use serde::{Deserialize, Serialize};

/// Commit durability for the on-disk engine.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Durability {
    /// `fsync` before every commit returns (safest, highest latency).
    #[default]
    Immediate,
    /// Commits are persisted eventually; a crash may lose recent commits but
    /// never tears one.
    Eventual,
}

impl From<Durability> for redb::Durability {
    fn from(d: Durability) -> Self {
        match d {
            Durability::Immediate => redb::Durability::Immediate,
            Durability::Eventual => redb::Durability::Eventual,
        }
    }
}

/// Configuration for [`RedbEngine`](crate::RedbEngine).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Create the database file if it does not exist.
    pub create_if_missing: bool,
    /// Durability applied to every write transaction.
    pub durability: Durability,
    /// Delete the database file when the engine is closed or dropped.
    ///
    /// Useful for scratch stores whose contents must not outlive the process.
    pub destroy_on_close: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            create_if_missing: true,
            durability: Durability::default(),
            destroy_on_close: false,
        }
    }
}

impl EngineConfig {
    /// A configuration for throwaway stores: eventual durability and the
    /// file removed on close.
    pub fn ephemeral() -> Self {
        Self {
            durability: Durability::Eventual,
            destroy_on_close: true,
            ..Default::default()
        }
    }
}
