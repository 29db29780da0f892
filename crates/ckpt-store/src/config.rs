use ckpt_engine::EngineConfig;
use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

/// What to do when a reference count would exceed `i32::MAX`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// Fail with [`StoreError::Overflow`] and leave the record untouched.
    #[default]
    Error,
    /// Pin the count at `i32::MAX`. The record then never reaches zero
    /// through ordinary deletes.
    Saturate,
}

impl OverflowPolicy {
    /// Add one reference to `count` under this policy.
    ///
    /// Returns `None` when the policy forbids the increment.
    pub fn increment(self, count: i32) -> Option<i32> {
        match self {
            Self::Error => count.checked_add(1),
            Self::Saturate => Some(count.saturating_add(1)),
        }
    }
}

/// Configuration for a [`CheckpointStore`](crate::CheckpointStore).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Behavior at the reference count bound.
    pub overflow: OverflowPolicy,
    /// Settings for the on-disk engine used by [`CheckpointStore::open`](crate::CheckpointStore::open).
    pub engine: EngineConfig,
}

impl StoreConfig {
    /// Parse a configuration from TOML. Missing fields take their defaults.
    ///
    /// ```toml
    /// overflow = "saturate"
    ///
    /// [engine]
    /// create_if_missing = true
    /// durability = "eventual"
    /// destroy_on_close = false
    /// ```
    pub fn from_toml_str(s: &str) -> StoreResult<Self> {
        toml::from_str(s).map_err(|e| StoreError::Config(e.to_string()))
    }

    /// Render this configuration as TOML.
    pub fn to_toml_string(&self) -> StoreResult<String> {
        toml::to_string(self).map_err(|e| StoreError::Config(e.to_string()))
    }
}
