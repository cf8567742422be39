use crate::runtime::{current_unwrap, TASK_ID};
use std::future::Future;

pub use join_handle::JoinHandle;
pub use spawn_blocking::spawn_blocking;
pub use yield_now::yield_now;

mod catch_unwind;
mod join_handle;
mod spawn_blocking;
mod yield_now;

/// Spawns a new asynchronous task, returning a
/// [`JoinHandle`](JoinHandle) for it.
///
/// Spawning a task enables the future to be executed concurrently with respect to other tasks.
/// The spawned task will execute on the current thread.
///
/// Dropping the returned handle cancels the task. Use [`detach`] or
/// [`JoinHandle::detach`] to let it run on its own.
///
/// # Panics
///
/// Panics if called from **outside** of a runtime.
#[track_caller]
pub fn spawn<F>(future: F) -> JoinHandle<<F as Future>::Output>
where
    F: Future + 'static,
    F::Output: 'static,
{
    current_unwrap("spawn").spawn(future)
}

/// Spawns a task that keeps running after its handle is gone.
///
/// # Panics
///
/// Panics if called from **outside** of a runtime.
#[track_caller]
pub fn detach<F>(future: F)
where
    F: Future + 'static,
    F::Output: 'static,
{
    current_unwrap("detach").spawn(future).detach();
}

/// Returns the task id for the currently running task. The task id
/// is guaranteed to be a unique identifier within its runtime. The future
/// passed to `block_on` always has id `0`.
///
/// # Example
///
/// ```rust
/// use asyncfile::task;
///
/// # asyncfile::block_on(async {
/// assert_eq!(task::id(), 0);
/// task::spawn(async {
///     assert_ne!(task::id(), 0);
/// }).await;
/// # });
/// ```
///
/// # Panics
/// Panics if called from the **outside** of a task.
#[track_caller]
#[must_use]
pub fn id() -> u64 {
    let Some(id) = TASK_ID.with(std::cell::Cell::get) else {
        panic!("called `task::id` from the outside of a task.")
    };
    id
}
