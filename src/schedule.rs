//! The capability a scheduler hands to the bridge so results can be delivered
//! back onto the scheduler's own thread.
use std::sync::Arc;

use crate::error::ScheduleError;

/// A unit of work marshaled onto a scheduler's thread.
pub type Callback = Box<dyn FnOnce() + Send + 'static>;

/// A shared, type-erased [`Schedule`] implementation.
pub type SchedulerHandle = Arc<dyn Schedule>;

/// Marshals callbacks onto the implementor's thread of execution.
///
/// Implementations must be callable from any thread, and must run every
/// accepted callback exactly once on the scheduler's own thread. If the
/// scheduler has gone away, [`ScheduleError::HandleExpired`] is returned and
/// the callback is dropped without running.
///
/// The bridge uses this to resolve a [`Pending`](crate::bridge::Pending) on the
/// thread that awaits it, so scheduler-owned state is never touched from the
/// worker thread.
pub trait Schedule: Send + Sync + 'static {
    /// Schedules `callback` to run on this scheduler's thread.
    ///
    /// # Errors
    /// Returns [`ScheduleError::HandleExpired`] if the scheduler no longer runs.
    fn schedule(&self, callback: Callback) -> Result<(), ScheduleError>;
}

impl<S: Schedule + ?Sized> Schedule for Arc<S> {
    fn schedule(&self, callback: Callback) -> Result<(), ScheduleError> {
        (**self).schedule(callback)
    }
}

/// Lets a tokio runtime receive results from the bridge. Callbacks are
/// spawned as tasks, so a `current_thread` runtime runs them on its own thread.
///
/// Tokio silently drops tasks spawned onto a runtime that has shut down, so
/// this implementation never reports [`ScheduleError::HandleExpired`].
#[cfg(feature = "tokio_compat")]
impl Schedule for tokio::runtime::Handle {
    fn schedule(&self, callback: Callback) -> Result<(), ScheduleError> {
        self.spawn(async move { callback() });
        Ok(())
    }
}
