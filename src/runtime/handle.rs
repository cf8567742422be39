use std::fmt::{self, Debug, Formatter};
use std::thread::{self, ThreadId};

use crossbeam_channel::Sender;

use super::current;
use crate::error::ScheduleError;
use crate::schedule::{Callback, Schedule};

/// Messages other threads send to a runtime.
pub(crate) enum Remote {
    Wake(u64),
    Call(Callback),
}

/// A thread safe handle to a [`Runtime`](super::Runtime).
///
/// The runtime itself is bound to the thread that created it. A `Handle` can
/// be sent anywhere and used to run callbacks on that thread, which is how
/// the bridge delivers results.
#[derive(Clone)]
pub struct Handle {
    pub(crate) sender: Sender<Remote>,
    pub(crate) thread: ThreadId,
}

impl Handle {
    /// Returns a handle to the runtime of the current context.
    ///
    /// # Panics
    /// Panics if called from the outside of a runtime context.
    #[track_caller]
    #[must_use]
    pub fn current() -> Handle {
        let Some(rt) = current() else {
            panic!("called `Handle::current` from the outside of a runtime context.")
        };
        rt.handle()
    }

    #[must_use]
    pub fn try_current() -> Option<Handle> {
        current().map(|rt| rt.handle())
    }

    /// Runs `f` on the runtime's thread during its next event poll. May be
    /// called from any thread.
    ///
    /// # Errors
    /// Returns [`ScheduleError::HandleExpired`] if the runtime was dropped.
    pub fn call_soon_threadsafe<F>(&self, f: F) -> Result<(), ScheduleError>
    where
        F: FnOnce() + Send + 'static,
    {
        self.send(Remote::Call(Box::new(f)))
    }

    /// Returns whether the current thread is the one driving this runtime.
    #[must_use]
    pub fn is_current_thread(&self) -> bool {
        thread::current().id() == self.thread
    }

    pub(crate) fn wake(&self, id: u64) {
        // a runtime that is gone has nothing left to wake
        self.send(Remote::Wake(id)).ok();
    }

    fn send(&self, remote: Remote) -> Result<(), ScheduleError> {
        self.sender
            .send(remote)
            .map_err(|_| ScheduleError::HandleExpired)
    }
}

impl Schedule for Handle {
    fn schedule(&self, callback: Callback) -> Result<(), ScheduleError> {
        self.send(Remote::Call(callback))
    }
}

impl Debug for Handle {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("thread", &self.thread)
            .finish_non_exhaustive()
    }
}
