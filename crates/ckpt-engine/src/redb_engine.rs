use std::fs;
use std::path::{Path, PathBuf};

use redb::{Database, ReadableTable, TableDefinition, WriteTransaction};
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::traits::{EngineTransaction, StorageEngine};

/// The single table holding every checkpoint record.
const CHECKPOINTS: TableDefinition<&[u8], &[u8]> = TableDefinition::new("checkpoints");

/// Durable storage engine backed by a redb database file.
///
/// redb admits one write transaction at a time and gives readers a snapshot
/// of the last commit, which is exactly the isolation [`StorageEngine`]
/// requires.
///
/// The database is released by [`StorageEngine::close`] or, failing that,
/// when the engine is dropped; either way `destroy_on_close` is honored.
pub struct RedbEngine {
    /// `None` once the engine has shut down.
    db: Option<Database>,
    path: PathBuf,
    config: EngineConfig,
}

impl RedbEngine {
    /// Open (or create, if configured) the database at `path`.
    pub fn open(path: &Path, config: EngineConfig) -> EngineResult<Self> {
        let db = if config.create_if_missing {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent)?;
                }
            }
            Database::create(path)?
        } else {
            if !path.exists() {
                return Err(EngineError::NotFound(path.to_path_buf()));
            }
            Database::open(path)?
        };

        // Create the table up front so readers never observe it missing.
        let txn = db.begin_write()?;
        txn.open_table(CHECKPOINTS)?;
        txn.commit()?;

        info!(path = %path.display(), durability = ?config.durability, "engine opened");

        Ok(Self {
            db: Some(db),
            path: path.to_path_buf(),
            config,
        })
    }

    /// Path to the database file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The configuration this engine was opened with.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn db(&self) -> EngineResult<&Database> {
        self.db.as_ref().ok_or(EngineError::Closed)
    }

    /// Release the database and, if configured, delete its file. Calling it
    /// again after the first shutdown does nothing.
    fn shutdown(&mut self) -> EngineResult<()> {
        let Some(db) = self.db.take() else {
            return Ok(());
        };
        drop(db);
        if self.config.destroy_on_close {
            fs::remove_file(&self.path)?;
            debug!(path = %self.path.display(), "database destroyed");
        }
        info!(path = %self.path.display(), "engine closed");
        Ok(())
    }
}

impl StorageEngine for RedbEngine {
    fn get(&self, key: &[u8]) -> EngineResult<Option<Vec<u8>>> {
        let txn = self.db()?.begin_read()?;
        let table = txn.open_table(CHECKPOINTS)?;
        let value = table.get(key)?.map(|guard| guard.value().to_vec());
        Ok(value)
    }

    fn begin(&self) -> EngineResult<Box<dyn EngineTransaction + '_>> {
        let mut txn = self.db()?.begin_write()?;
        txn.set_durability(self.config.durability.into());
        Ok(Box::new(RedbTransaction { txn }))
    }

    fn close(mut self) -> EngineResult<()> {
        self.shutdown()
    }
}

impl Drop for RedbEngine {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            warn!(path = %self.path.display(), error = %e, "engine shutdown on drop failed");
        }
    }
}

impl std::fmt::Debug for RedbEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbEngine")
            .field("path", &self.path)
            .field("config", &self.config)
            .finish()
    }
}

/// A redb write transaction. Dropping it without committing aborts it.
struct RedbTransaction {
    txn: WriteTransaction,
}

impl EngineTransaction for RedbTransaction {
    fn get(&mut self, key: &[u8]) -> EngineResult<Option<Vec<u8>>> {
        let table = self.txn.open_table(CHECKPOINTS)?;
        let value = table.get(key)?.map(|guard| guard.value().to_vec());
        Ok(value)
    }

    fn put(&mut self, key: &[u8], value: &[u8]) -> EngineResult<()> {
        let mut table = self.txn.open_table(CHECKPOINTS)?;
        table.insert(key, value)?;
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> EngineResult<()> {
        let mut table = self.txn.open_table(CHECKPOINTS)?;
        table.remove(key)?;
        Ok(())
    }

    fn commit(self: Box<Self>) -> EngineResult<()> {
        self.txn.commit()?;
        Ok(())
    }

    fn rollback(self: Box<Self>) -> EngineResult<()> {
        self.txn.abort()?;
        Ok(())
    }
}
