use std::future::Future;
use std::mem::replace;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll, Waker};

use super::job::{Job, JobState};
use super::queue::{Push, TaskQueue};
use crate::error::Error;

enum State<T> {
    Waiting(Option<Waker>),
    Ready(Result<T, Error>),
    Taken,
}

/// Single assignment cell shared between a [`Pending`] and its job.
pub(crate) struct Slot<T> {
    state: Mutex<State<T>>,
}

impl<T> Slot<T> {
    pub fn new() -> Arc<Slot<T>> {
        Arc::new(Slot {
            state: Mutex::new(State::Waiting(None)),
        })
    }

    /// Stores the outcome and wakes the waiting task. Only the first call
    /// has any effect; returns whether this call resolved the slot.
    pub fn resolve(&self, outcome: Result<T, Error>) -> bool {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let State::Waiting(waker) = &mut *state else {
            return false;
        };
        let waker = waker.take();
        *state = State::Ready(outcome);
        drop(state);
        if let Some(waker) = waker {
            waker.wake();
        }
        true
    }

    fn poll_take(&self, cx: &mut Context<'_>) -> Poll<Result<T, Error>> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if let State::Waiting(waker) = &mut *state {
            if !matches!(waker, Some(w) if w.will_wake(cx.waker())) {
                *waker = Some(cx.waker().clone());
            }
            return Poll::Pending;
        }
        match replace(&mut *state, State::Taken) {
            State::Ready(outcome) => Poll::Ready(outcome),
            _ => panic!("`Pending` polled after completion"),
        }
    }
}

/// The eventual outcome of a blocking call submitted through
/// [`Bridge::submit`](super::Bridge::submit).
///
/// Awaiting a `Pending` yields the callable's return value, or an [`Error`]
/// if the callable panicked, the call was cancelled, or the bridge was shut
/// down. The value is always handed over on the scheduler the call was
/// submitted with.
///
/// # Cancellation
///
/// Dropping a `Pending` cancels the call if the worker has not started it
/// yet. A call that already started runs to completion and its outcome is
/// discarded. See [`Pending::cancel`] for cancelling while keeping the handle.
#[must_use = "dropping a `Pending` cancels the blocking call"]
pub struct Pending<T> {
    slot: Arc<Slot<T>>,
    state: Arc<JobState>,
    queue: Arc<TaskQueue>,
    // kept here while a bounded queue is full
    held: Option<Job>,
}

impl<T> Unpin for Pending<T> {}

impl<T> Pending<T> {
    pub(crate) fn new(slot: Arc<Slot<T>>, state: Arc<JobState>, queue: Arc<TaskQueue>) -> Self {
        Pending {
            slot,
            state,
            queue,
            held: None,
        }
    }

    pub(crate) fn hold(&mut self, job: Job) {
        self.held = Some(job);
    }

    pub(crate) fn reject(&mut self) {
        self.state.cancel();
        self.slot.resolve(Err(Error::ShutdownInProgress));
    }

    /// Cancels the call if the worker has not dequeued it yet, in which case
    /// the `Pending` resolves with [`Error::Cancelled`]. Returns `false` if the
    /// call already started or finished.
    pub fn cancel(&mut self) -> bool {
        if !self.state.cancel() {
            return false;
        }
        self.held = None;
        self.slot.resolve(Err(Error::Cancelled))
    }

    /// Returns whether the job is still waiting for room in a full queue.
    #[must_use]
    pub fn is_held(&self) -> bool {
        self.held.is_some()
    }
}

impl<T> Future for Pending<T> {
    type Output = Result<T, Error>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if let Some(job) = self.held.take() {
            match self.queue.try_push(job, Some(cx.waker())) {
                Push::Queued => (),
                Push::Full(job) => {
                    self.held = Some(job);
                    return Poll::Pending;
                }
                Push::Closed => self.reject(),
            }
        }
        self.slot.poll_take(cx)
    }
}

impl<T> Drop for Pending<T> {
    fn drop(&mut self) {
        self.state.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::task::Wake;

    struct Count(AtomicUsize);

    impl Wake for Count {
        fn wake(self: Arc<Self>) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn slot_resolves_once_and_wakes() {
        let count = Arc::new(Count(AtomicUsize::new(0)));
        let waker = Waker::from(count.clone());
        let cx = &mut Context::from_waker(&waker);
        let slot = Slot::new();

        assert!(slot.poll_take(cx).is_pending());
        assert!(slot.resolve(Ok(42)));
        assert!(!slot.resolve(Ok(7)));
        assert_eq!(count.0.load(Ordering::SeqCst), 1);

        let Poll::Ready(Ok(value)) = slot.poll_take(cx) else {
            panic!("slot should be ready");
        };
        assert_eq!(value, 42);
    }
}
