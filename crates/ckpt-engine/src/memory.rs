use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, RwLock};

use crate::error::EngineResult;
use crate::traits::{EngineTransaction, StorageEngine};

/// In-memory, HashMap-based storage engine.
///
/// Intended for tests and embedding. Committed entries live behind a
/// `RwLock`; a separate writer `Mutex` is held for the lifetime of each
/// transaction so writers never interleave. Staged writes are applied under
/// the write lock on commit, so readers see either all of them or none.
pub struct InMemoryEngine {
    entries: RwLock<HashMap<Vec<u8>, Vec<u8>>>,
    writer: Mutex<()>,
}

impl InMemoryEngine {
    /// Create a new empty engine.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            writer: Mutex::new(()),
        }
    }

    /// Number of committed entries.
    pub fn len(&self) -> usize {
        self.entries.read().expect("lock poisoned").len()
    }

    /// Returns `true` if nothing has been committed.
    pub fn is_empty(&self) -> bool {
        self.entries.read().expect("lock poisoned").is_empty()
    }

    /// Total bytes across all committed values.
    pub fn total_bytes(&self) -> u64 {
        self.entries
            .read()
            .expect("lock poisoned")
            .values()
            .map(|v| v.len() as u64)
            .sum()
    }
}

impl Default for InMemoryEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl StorageEngine for InMemoryEngine {
    fn get(&self, key: &[u8]) -> EngineResult<Option<Vec<u8>>> {
        let map = self.entries.read().expect("lock poisoned");
        Ok(map.get(key).cloned())
    }

    fn begin(&self) -> EngineResult<Box<dyn EngineTransaction + '_>> {
        let guard = self.writer.lock().expect("lock poisoned");
        Ok(Box::new(InMemoryTransaction {
            engine: self,
            staged: HashMap::new(),
            _writer: guard,
        }))
    }
}

impl std::fmt::Debug for InMemoryEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.len();
        f.debug_struct("InMemoryEngine")
            .field("entry_count", &count)
            .finish()
    }
}

/// Transaction over an [`InMemoryEngine`].
///
/// `None` in `staged` marks a pending delete.
struct InMemoryTransaction<'a> {
    engine: &'a InMemoryEngine,
    staged: HashMap<Vec<u8>, Option<Vec<u8>>>,
    _writer: MutexGuard<'a, ()>,
}

impl EngineTransaction for InMemoryTransaction<'_> {
    fn get(&mut self, key: &[u8]) -> EngineResult<Option<Vec<u8>>> {
        if let Some(pending) = self.staged.get(key) {
            return Ok(pending.clone());
        }
        self.engine.get(key)
    }

    fn put(&mut self, key: &[u8], value: &[u8]) -> EngineResult<()> {
        self.staged.insert(key.to_vec(), Some(value.to_vec()));
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> EngineResult<()> {
        self.staged.insert(key.to_vec(), None);
        Ok(())
    }

    fn commit(self: Box<Self>) -> EngineResult<()> {
        let Self {
            engine,
            staged,
            _writer: writer,
        } = *self;
        let mut map = engine.entries.write().expect("lock poisoned");
        for (key, pending) in staged {
            match pending {
                Some(value) => {
                    map.insert(key, value);
                }
                None => {
                    map.remove(&key);
                }
            }
        }
        drop(map);
        drop(writer);
        Ok(())
    }
}
