//! Host runtime seams.
//!
//! The core never owns an executor. Background work (autoconnect attempts) is
//! handed to a [`Spawner`] supplied by the host.
//!
//! On WASM targets, futures and callbacks don't need to be `Send` since
//! JavaScript is single-threaded. On native targets they must be `Send` (and
//! shared objects `Sync`) to allow use with multi-threaded runtimes.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// `Send + Sync` on native targets, no bound on WASM.
#[cfg(not(target_arch = "wasm32"))]
pub trait MaybeSendSync: Send + Sync {}

#[cfg(not(target_arch = "wasm32"))]
impl<T: Send + Sync + ?Sized> MaybeSendSync for T {}

/// `Send + Sync` on native targets, no bound on WASM.
#[cfg(target_arch = "wasm32")]
pub trait MaybeSendSync {}

#[cfg(target_arch = "wasm32")]
impl<T: ?Sized> MaybeSendSync for T {}

/// A detached background task.
#[cfg(target_arch = "wasm32")]
pub type TaskFuture = Pin<Box<dyn Future<Output = ()> + 'static>>;

#[cfg(not(target_arch = "wasm32"))]
pub type TaskFuture = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Runs detached tasks on the host executor.
///
/// # Example Implementation (tokio)
///
/// ```rust,ignore
/// struct TokioSpawner;
///
/// impl Spawner for TokioSpawner {
///     fn spawn(&self, task: TaskFuture) {
///         tokio::spawn(task);
///     }
/// }
/// ```
pub trait Spawner: MaybeSendSync {
    fn spawn(&self, task: TaskFuture);
}

/// Lock a mutex, recovering the data if a previous holder panicked.
///
/// Every critical section in this crate leaves its data consistent before
/// calling out, so a poisoned lock carries no broken invariant.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
