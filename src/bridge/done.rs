use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, TryRecvError};

use crate::error::Error;

/// Completion signal for a call submitted with [`Bridge::detach`](super::Bridge::detach).
///
/// Waiting is optional: dropping a `Done` does not affect the call. Waiting
/// blocks the current thread, so async code that needs to observe completion
/// should submit a call returning `()` through
/// [`Bridge::submit`](super::Bridge::submit) instead.
#[derive(Debug)]
pub struct Done {
    receiver: Receiver<Result<(), Error>>,
    outcome: Option<Result<(), Error>>,
}

impl Done {
    pub(crate) fn new(receiver: Receiver<Result<(), Error>>) -> Done {
        Done {
            receiver,
            outcome: None,
        }
    }

    /// Returns whether the call finished, without blocking.
    pub fn is_done(&mut self) -> bool {
        if self.outcome.is_some() {
            return true;
        }
        match self.receiver.try_recv() {
            Ok(outcome) => self.outcome = Some(outcome),
            Err(TryRecvError::Disconnected) => self.outcome = Some(Err(Error::ShutdownInProgress)),
            Err(TryRecvError::Empty) => return false,
        }
        true
    }

    /// Blocks until the call finished or `timeout` elapsed. Returns whether
    /// the call finished.
    pub fn wait_timeout(&mut self, timeout: Duration) -> bool {
        if self.outcome.is_some() {
            return true;
        }
        match self.receiver.recv_timeout(timeout) {
            Ok(outcome) => self.outcome = Some(outcome),
            Err(RecvTimeoutError::Disconnected) => {
                self.outcome = Some(Err(Error::ShutdownInProgress));
            }
            Err(RecvTimeoutError::Timeout) => return false,
        }
        true
    }

    /// Blocks until the call finished.
    ///
    /// # Errors
    /// Returns [`Error::Panicked`] if the callable panicked, or
    /// [`Error::ShutdownInProgress`] if the bridge was shut down before the
    /// call could be queued.
    pub fn wait(self) -> Result<(), Error> {
        if let Some(outcome) = self.outcome {
            return outcome;
        }
        self.receiver
            .recv()
            .unwrap_or(Err(Error::ShutdownInProgress))
    }
}
