//! Async access to a [`CheckpointStore`] from tokio tasks.
//!
//! Store operations are short blocking calls, so each one runs on tokio's
//! blocking pool as a [`UnitOfWork`]. A unit can be cancelled only while it
//! is still pending. Once it has started it always runs to commit or
//! failure; dropping the caller's future at that point does not interrupt
//! it.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use ckpt_engine::{RedbEngine, StorageEngine};
use tracing::debug;

use crate::error::{Operation, StoreError, StoreResult};
use crate::record::Record;
use crate::store::CheckpointStore;

const PENDING: u8 = 0;
const STARTED: u8 = 1;
const FINISHED: u8 = 2;
const CANCELLED: u8 = 3;

/// Where a [`UnitOfWork`] is in its life.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorkState {
    /// Queued, not yet touching the engine.
    Pending,
    /// Running against the engine.
    Started,
    /// Ran to completion (successfully or not).
    Finished,
    /// Cancelled before it started; it will never run.
    Cancelled,
}

/// Shared state of one store operation, observable from both the caller and
/// the worker running it.
#[derive(Clone, Debug)]
pub struct UnitOfWork {
    state: Arc<AtomicU8>,
}

impl UnitOfWork {
    /// A new pending unit.
    pub fn new() -> Self {
        Self {
            state: Arc::new(AtomicU8::new(PENDING)),
        }
    }

    /// Current state.
    pub fn state(&self) -> WorkState {
        match self.state.load(Ordering::Acquire) {
            PENDING => WorkState::Pending,
            STARTED => WorkState::Started,
            FINISHED => WorkState::Finished,
            _ => WorkState::Cancelled,
        }
    }

    /// Request cancellation. Returns `true` if the unit was still pending and
    /// will now never run; `false` if it had already started or ended.
    pub fn cancel(&self) -> bool {
        self.transition(PENDING, CANCELLED)
    }

    /// Claim the unit for execution. Returns `false` if it was cancelled.
    fn start(&self) -> bool {
        self.transition(PENDING, STARTED)
    }

    fn finish(&self) {
        self.state.store(FINISHED, Ordering::Release);
    }

    fn transition(&self, from: u8, to: u8) -> bool {
        self.state
            .compare_exchange(from, to, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

impl Default for UnitOfWork {
    fn default() -> Self {
        Self::new()
    }
}

/// Cancels its unit when dropped, which only has an effect while the unit is
/// still pending.
struct CancelOnDrop(UnitOfWork);

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        if self.0.cancel() {
            debug!("store operation cancelled before start");
        }
    }
}

/// Marks its unit finished when dropped, so a unit whose operation panics
/// does not stay started.
struct FinishOnDrop(UnitOfWork);

impl Drop for FinishOnDrop {
    fn drop(&mut self) {
        self.0.finish();
    }
}

/// Cloneable async handle to a shared [`CheckpointStore`].
pub struct AsyncCheckpointStore<E: StorageEngine + 'static = RedbEngine> {
    inner: Arc<CheckpointStore<E>>,
}

impl<E: StorageEngine + 'static> Clone for AsyncCheckpointStore<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<E: StorageEngine + 'static> AsyncCheckpointStore<E> {
    /// Wrap a store for use from async code.
    pub fn new(store: CheckpointStore<E>) -> Self {
        Self {
            inner: Arc::new(store),
        }
    }

    /// Share an already reference-counted store.
    pub fn from_arc(store: Arc<CheckpointStore<E>>) -> Self {
        Self { inner: store }
    }

    /// The wrapped store.
    pub fn store(&self) -> &Arc<CheckpointStore<E>> {
        &self.inner
    }

    /// Async [`CheckpointStore::get`].
    pub async fn get(&self, key: impl Into<Vec<u8>>) -> StoreResult<Record> {
        self.get_with(UnitOfWork::new(), key).await
    }

    /// Async [`CheckpointStore::save`].
    pub async fn save(
        &self,
        key: impl Into<Vec<u8>>,
        value: impl Into<Vec<u8>>,
    ) -> StoreResult<i32> {
        self.save_with(UnitOfWork::new(), key, value).await
    }

    /// Async [`CheckpointStore::increment_reference`].
    pub async fn increment_reference(&self, key: impl Into<Vec<u8>>) -> StoreResult<i32> {
        self.increment_reference_with(UnitOfWork::new(), key).await
    }

    /// Async [`CheckpointStore::delete`].
    pub async fn delete(&self, key: impl Into<Vec<u8>>) -> StoreResult<i32> {
        self.delete_with(UnitOfWork::new(), key).await
    }

    /// [`get`](Self::get) as `unit`. Keep a clone of `unit` to cancel the
    /// call or observe its state.
    pub async fn get_with(
        &self,
        unit: UnitOfWork,
        key: impl Into<Vec<u8>>,
    ) -> StoreResult<Record> {
        let key = key.into();
        self.run(unit, Operation::Get, move |store| store.get(&key))
            .await
    }

    /// [`save`](Self::save) as `unit`.
    pub async fn save_with(
        &self,
        unit: UnitOfWork,
        key: impl Into<Vec<u8>>,
        value: impl Into<Vec<u8>>,
    ) -> StoreResult<i32> {
        let key = key.into();
        let value = value.into();
        self.run(unit, Operation::Save, move |store| store.save(&key, &value))
            .await
    }

    /// [`increment_reference`](Self::increment_reference) as `unit`.
    pub async fn increment_reference_with(
        &self,
        unit: UnitOfWork,
        key: impl Into<Vec<u8>>,
    ) -> StoreResult<i32> {
        let key = key.into();
        self.run(unit, Operation::IncrementReference, move |store| {
            store.increment_reference(&key)
        })
        .await
    }

    /// [`delete`](Self::delete) as `unit`.
    pub async fn delete_with(
        &self,
        unit: UnitOfWork,
        key: impl Into<Vec<u8>>,
    ) -> StoreResult<i32> {
        let key = key.into();
        self.run(unit, Operation::Delete, move |store| store.delete(&key))
            .await
    }

    /// Run `f` on the blocking pool as `unit`.
    ///
    /// If the returned future is dropped while `unit` is pending, the unit is
    /// cancelled and `f` never runs.
    async fn run<T, F>(&self, unit: UnitOfWork, op: Operation, f: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&CheckpointStore<E>) -> StoreResult<T> + Send + 'static,
    {
        let _guard = CancelOnDrop(unit.clone());
        let store = Arc::clone(&self.inner);
        let handle = tokio::task::spawn_blocking(move || {
            if !unit.start() {
                return Err(StoreError::Cancelled { op });
            }
            let _finish = FinishOnDrop(unit);
            f(&store)
        });

        match handle.await {
            Ok(result) => result,
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Err(_) => Err(StoreError::Cancelled { op }),
        }
    }
}
