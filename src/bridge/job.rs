use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use crossbeam_channel::Sender;
use tracing::warn;

use super::pending::Slot;
use crate::error::{Error, Panic};
use crate::schedule::Schedule;

const QUEUED: u8 = 0;
const RUNNING: u8 = 1;
const CANCELLED: u8 = 2;

/// Tracks whether a job may still be cancelled. The transition out of
/// `QUEUED` happens exactly once, either by the worker or by the caller.
#[derive(Debug)]
pub(crate) struct JobState(AtomicU8);

impl JobState {
    pub fn new() -> Arc<JobState> {
        Arc::new(JobState(AtomicU8::new(QUEUED)))
    }

    /// Called by the worker right after dequeuing.
    pub fn start(&self) -> bool {
        self.transition(RUNNING)
    }

    /// Called by the caller. Fails once the worker has started the job.
    pub fn cancel(&self) -> bool {
        self.transition(CANCELLED)
    }

    fn transition(&self, to: u8) -> bool {
        self.0
            .compare_exchange(QUEUED, to, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

/// Type erased blocking work. Running it executes the callable and hands
/// the outcome to whoever is waiting for it.
pub(crate) trait Work: Send {
    fn run(self: Box<Self>);
}

/// A queued unit of work. Consumed exactly once by the worker.
pub(crate) struct Job {
    id: u64,
    state: Arc<JobState>,
    work: Box<dyn Work>,
}

impl Job {
    pub fn new(id: u64, state: Arc<JobState>, work: Box<dyn Work>) -> Job {
        Job { id, state, work }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Runs the job unless it was cancelled while queued. Returns whether
    /// the job ran.
    pub fn run(self) -> bool {
        if !self.state.start() {
            return false;
        }
        self.work.run();
        true
    }
}

fn call<F, T>(f: F) -> Result<T, Error>
where
    F: FnOnce() -> T,
{
    catch_unwind(AssertUnwindSafe(f)).map_err(|payload| Error::Panicked(Panic::new(payload)))
}

/// A call whose outcome resolves a [`Slot`] on the submitting scheduler.
pub(crate) struct Submission<F, T, S> {
    pub f: F,
    pub slot: Arc<Slot<T>>,
    pub scheduler: S,
}

impl<F, T, S> Work for Submission<F, T, S>
where
    F: FnOnce() -> T + Send,
    T: Send + 'static,
    S: Schedule,
{
    fn run(self: Box<Self>) {
        let Submission { f, slot, scheduler } = *self;
        let outcome = call(f);
        let delivered = scheduler.schedule(Box::new(move || {
            slot.resolve(outcome);
        }));
        if let Err(error) = delivered {
            warn!(%error, "dropping the result of a blocking call");
        }
    }
}

/// A call nobody awaits. Completion is signaled through a one-shot channel.
pub(crate) struct Detached<F> {
    pub f: F,
    pub signal: Sender<Result<(), Error>>,
}

impl<F> Work for Detached<F>
where
    F: FnOnce() + Send,
{
    fn run(self: Box<Self>) {
        let Detached { f, signal } = *self;
        // the receiving `Done` may be gone already
        signal.send(call(f)).ok();
    }
}
