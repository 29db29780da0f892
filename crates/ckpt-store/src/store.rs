use std::path::Path;

use ckpt_engine::{EngineTransaction, RedbEngine, StorageEngine};
use tracing::{debug, info, warn};

use crate::config::StoreConfig;
use crate::error::{Operation, StoreError, StoreResult};
use crate::key::{short_hex, CheckpointKey};
use crate::record::Record;

/// Outcome decided for a record inside a unit of work.
enum Update {
    /// Write the record back with its new count.
    Put(Record),
    /// Physically remove the record.
    Remove,
}

/// Reference-counted, content-addressed checkpoint storage.
///
/// Each key holds one value and the number of owners that currently depend
/// on it. Saving identical content under an existing key adds an owner
/// instead of a copy, and the value is removed only when its last owner
/// deletes it.
///
/// Every mutating call reads the current record and writes its successor
/// inside a single engine transaction, so concurrent callers on the same key
/// never lose updates.
pub struct CheckpointStore<E: StorageEngine = RedbEngine> {
    engine: E,
    config: StoreConfig,
}

impl CheckpointStore<RedbEngine> {
    /// Open (or create) a redb-backed store at `path`.
    pub fn open(path: impl AsRef<Path>, config: StoreConfig) -> StoreResult<Self> {
        let path = path.as_ref();
        let engine = RedbEngine::open(path, config.engine.clone())
            .map_err(|e| StoreError::engine(Operation::Open, e))?;
        info!(path = %path.display(), overflow = ?config.overflow, "checkpoint store opened");
        Ok(Self::with_engine(engine, config))
    }
}

impl<E: StorageEngine> CheckpointStore<E> {
    /// Build a store over an already opened engine. The store takes
    /// ownership of the engine and releases it on [`close`](Self::close).
    pub fn with_engine(engine: E, config: StoreConfig) -> Self {
        Self { engine, config }
    }

    /// The underlying engine.
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// The configuration this store was built with.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Release the engine. Consuming `self` makes any later use a compile
    /// error.
    pub fn close(self) -> StoreResult<()> {
        self.engine
            .close()
            .map_err(|e| StoreError::engine(Operation::Close, e))?;
        info!("checkpoint store closed");
        Ok(())
    }

    /// Look up the record for `key`.
    ///
    /// Returns [`StoreError::NotFound`] if no record exists. Reads committed
    /// state only and has no side effects.
    pub fn get(&self, key: impl AsRef<[u8]>) -> StoreResult<Record> {
        let key = key.as_ref();
        let raw = self
            .engine
            .get(key)
            .map_err(|e| StoreError::engine(Operation::Get, e))?
            .ok_or_else(|| StoreError::NotFound {
                op: Operation::Get,
                key: key.into(),
            })?;
        decode(Operation::Get, key, &raw)
    }

    /// Store `value` under `key`, or add an owner to the identical value
    /// already there. Returns the new reference count.
    ///
    /// Fails with [`StoreError::ContentMismatch`] if `key` already holds a
    /// different value; the stored record is left as it was.
    pub fn save(&self, key: impl AsRef<[u8]>, value: impl AsRef<[u8]>) -> StoreResult<i32> {
        let key = key.as_ref();
        let value = value.as_ref();
        let count = self.update(Operation::Save, key, |current| match current {
            None => Ok(Update::Put(Record::new(value.to_vec()))),
            Some(record) if record.value != value => {
                warn!(key = %short_hex(key), "content mismatch on save");
                Err(StoreError::ContentMismatch {
                    op: Operation::Save,
                    key: key.into(),
                })
            }
            Some(record) => self.increment(Operation::Save, key, record),
        })?;
        debug!(key = %short_hex(key), count, "saved checkpoint");
        Ok(count)
    }

    /// Add an owner to the value already stored under `key`. Returns the new
    /// reference count.
    ///
    /// Never creates content: fails with [`StoreError::NotFound`] if `key`
    /// has no record.
    pub fn increment_reference(&self, key: impl AsRef<[u8]>) -> StoreResult<i32> {
        let key = key.as_ref();
        let count = self.update(Operation::IncrementReference, key, |current| match current {
            None => Err(StoreError::NotFound {
                op: Operation::IncrementReference,
                key: key.into(),
            }),
            Some(record) => self.increment(Operation::IncrementReference, key, record),
        })?;
        debug!(key = %short_hex(key), count, "incremented reference");
        Ok(count)
    }

    /// Drop one owner of the value under `key`. Returns the remaining
    /// reference count; `0` means the record was removed.
    pub fn delete(&self, key: impl AsRef<[u8]>) -> StoreResult<i32> {
        let key = key.as_ref();
        let count = self.update(Operation::Delete, key, |current| match current {
            None => Err(StoreError::NotFound {
                op: Operation::Delete,
                key: key.into(),
            }),
            Some(record) if record.reference_count < 2 => Ok(Update::Remove),
            Some(mut record) => {
                record.reference_count -= 1;
                Ok(Update::Put(record))
            }
        })?;
        if count == 0 {
            debug!(key = %short_hex(key), "removed checkpoint");
        } else {
            debug!(key = %short_hex(key), count, "released reference");
        }
        Ok(count)
    }

    /// Raise the count of `record` by one under the configured overflow
    /// policy.
    fn increment(&self, op: Operation, key: &[u8], mut record: Record) -> StoreResult<Update> {
        record.reference_count = self
            .config
            .overflow
            .increment(record.reference_count)
            .ok_or_else(|| StoreError::Overflow { op, key: key.into() })?;
        Ok(Update::Put(record))
    }

    /// Run read, decide, write for `key` as one engine transaction.
    ///
    /// `decide` sees the record as of the start of the transaction. If it
    /// fails, the transaction is rolled back and nothing is written.
    fn update<F>(&self, op: Operation, key: &[u8], decide: F) -> StoreResult<i32>
    where
        F: FnOnce(Option<Record>) -> StoreResult<Update>,
    {
        let engine_err = |e| StoreError::engine(op, e);

        let mut txn = self.engine.begin().map_err(engine_err)?;
        let current = match txn.get(key).map_err(engine_err)? {
            Some(raw) => match decode(op, key, &raw) {
                Ok(record) => Some(record),
                Err(e) => return Err(abandon(txn, op, e)),
            },
            None => None,
        };

        let update = match decide(current) {
            Ok(update) => update,
            Err(e) => return Err(abandon(txn, op, e)),
        };

        let count = match update {
            Update::Put(record) => {
                txn.put(key, &record.encode()).map_err(engine_err)?;
                record.reference_count
            }
            Update::Remove => {
                txn.delete(key).map_err(engine_err)?;
                0
            }
        };
        txn.commit().map_err(engine_err)?;
        Ok(count)
    }
}

impl<E: StorageEngine + std::fmt::Debug> std::fmt::Debug for CheckpointStore<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckpointStore")
            .field("engine", &self.engine)
            .field("config", &self.config)
            .finish()
    }
}

/// Roll back `txn` and hand back the error that ended it.
fn abandon(txn: Box<dyn EngineTransaction + '_>, op: Operation, err: StoreError) -> StoreError {
    if let Err(e) = txn.rollback() {
        warn!(%op, error = %e, "rollback failed");
    }
    err
}

fn decode(op: Operation, key: &[u8], raw: &[u8]) -> StoreResult<Record> {
    Record::decode(raw).map_err(|e| {
        warn!(key = %short_hex(key), error = %e, "corrupt record");
        StoreError::CorruptRecord {
            op,
            key: CheckpointKey::from(key),
            reason: e.to_string(),
        }
    })
}
