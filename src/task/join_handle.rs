use std::cell::RefCell;
use std::future::Future;
use std::panic::resume_unwind;
use std::pin::Pin;
use std::rc::{Rc, Weak};
use std::task::{Context, Poll, Waker};
use std::thread;

use tracing::error;

use super::catch_unwind::CatchUnwind;
use crate::runtime::executor::Executor;

struct Join<T> {
    output: Option<thread::Result<T>>,
    waker: Option<Waker>,
    detached: bool,
}

/// A handle to the spawned task. By default the task will be cancelled
/// when the join handle gets dropped. In order to detach on drop the
/// [`.detach()`](JoinHandle::detach) method should be called.
///
/// # Panics
/// Awaiting a task will panic if the awaited task panicked.
pub struct JoinHandle<T> {
    id: u64,
    executor: Weak<Executor>,
    join: Rc<RefCell<Join<T>>>,
    detached: bool,
}

impl<T> Unpin for JoinHandle<T> {}

impl<T: 'static> JoinHandle<T> {
    pub(crate) fn spawn<F>(executor: &Rc<Executor>, future: F) -> JoinHandle<T>
    where
        F: Future<Output = T> + 'static,
    {
        let join = Rc::new(RefCell::new(Join {
            output: None,
            waker: None,
            detached: false,
        }));
        let task = {
            let join = join.clone();
            async move {
                let output = CatchUnwind::new(future).await;
                let mut join = join.borrow_mut();
                if join.detached {
                    if output.is_err() {
                        error!("a detached task panicked");
                    }
                    return;
                }
                join.output = Some(output);
                let waker = join.waker.take();
                drop(join);
                if let Some(waker) = waker {
                    waker.wake();
                }
            }
        };
        let id = executor.spawn(Box::pin(task));
        JoinHandle {
            id,
            executor: Rc::downgrade(executor),
            join,
            detached: false,
        }
    }
}

impl<T> JoinHandle<T> {
    /// Detaches the task from the join handle, meaning it will not
    /// get cancelled when the handle gets dropped. A panic in a detached
    /// task is logged instead of propagated.
    ///
    /// Detached tasks can be aborted with the [`JoinHandle::abort`] method.
    #[inline]
    pub fn detach(&mut self) {
        self.detached = true;
        self.join.borrow_mut().detached = true;
    }

    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Aborts the task and runs the spawned future's destructor.
    /// The task is removed from the runtime immediately, and its destructor
    /// runs before this method returns.
    pub fn abort(mut self) {
        self.detached = false;
    }

    /// Returns whether the task finished.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.join.borrow().output.is_some()
    }
}

impl<T> Drop for JoinHandle<T> {
    fn drop(&mut self) {
        if self.detached {
            return;
        }
        if let Some(executor) = self.executor.upgrade() {
            executor.abort(self.id);
        }
    }
}

impl<T> Future for JoinHandle<T> {
    type Output = T;
    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut join = self.join.borrow_mut();
        match join.output.take() {
            Some(Ok(output)) => Poll::Ready(output),
            Some(Err(payload)) => {
                drop(join);
                resume_unwind(payload)
            }
            None => {
                join.waker = Some(cx.waker().clone());
                Poll::Pending
            }
        }
    }
}
