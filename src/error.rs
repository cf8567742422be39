//! Error types surfaced by the bridge and the scheduler seam.

use std::any::Any;
use std::fmt::{self, Debug, Formatter};
use std::io;
use std::panic::resume_unwind;

use thiserror::Error;

/// The reasons a blocking call submitted to a [`Bridge`](crate::Bridge) can fail
/// to produce a value.
///
/// Errors returned *by* the callable are not represented here: a closure that
/// returns `io::Result<T>` resolves to `Ok(Err(e))`, exactly as calling it
/// synchronously would.
#[derive(Debug, Error)]
pub enum Error {
    /// The callable panicked while running on the worker thread.
    #[error("blocking call panicked: {0}")]
    Panicked(Panic),

    /// The submission was cancelled before the worker picked it up.
    #[error("blocking call was cancelled before it started")]
    Cancelled,

    /// The bridge was shut down before the call could be queued.
    #[error("bridge is shutting down")]
    ShutdownInProgress,
}

impl Error {
    /// Returns the panic message if this error came from a panicking callable
    /// and the payload was a string.
    #[must_use]
    pub fn panic_message(&self) -> Option<&str> {
        match self {
            Error::Panicked(panic) => panic.message(),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_panic(&self) -> bool {
        matches!(self, Error::Panicked(_))
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }

    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        matches!(self, Error::ShutdownInProgress)
    }

    /// Resumes the captured panic on the current thread. Other errors are
    /// returned unchanged.
    pub fn resume_panic(self) -> Self {
        match self {
            Error::Panicked(panic) => resume_unwind(panic.into_payload()),
            error => error,
        }
    }
}

impl From<Error> for io::Error {
    /// Panics are resumed on the caller rather than converted.
    fn from(error: Error) -> io::Error {
        let error = error.resume_panic();
        let kind = match error {
            Error::Cancelled => io::ErrorKind::Interrupted,
            _ => io::ErrorKind::BrokenPipe,
        };
        io::Error::new(kind, error.to_string())
    }
}

/// The payload of a panic captured on the worker thread.
pub struct Panic(Box<dyn Any + Send>);

impl Panic {
    pub(crate) fn new(payload: Box<dyn Any + Send>) -> Self {
        Panic(payload)
    }

    #[must_use]
    pub fn message(&self) -> Option<&str> {
        if let Some(msg) = self.0.downcast_ref::<&'static str>() {
            return Some(msg);
        }
        self.0.downcast_ref::<String>().map(String::as_str)
    }

    #[must_use]
    pub fn into_payload(self) -> Box<dyn Any + Send> {
        self.0
    }
}

impl Debug for Panic {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Panic").field(&self.message()).finish()
    }
}

impl fmt::Display for Panic {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.message().unwrap_or("Box<dyn Any>"))
    }
}

/// Errors raised when a result cannot be handed back to a scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ScheduleError {
    /// The scheduler behind the handle has shut down.
    #[error("scheduler handle expired")]
    HandleExpired,
}
