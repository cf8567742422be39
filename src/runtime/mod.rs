//! A single threaded cooperative runtime.
//!
//! Tasks spawned on a [`Runtime`] are polled on the thread driving
//! [`Runtime::block_on`]. Other threads interact with it through a [`Handle`],
//! which wakes tasks and runs callbacks on the runtime's thread.
use crate::task::JoinHandle;
use executor::{Executor, MAIN_TASK};
use globals::TaskGuard;
use std::future::Future;
use std::pin::pin;
use std::rc::Rc;
use std::task::{Context, Poll};
use std::thread;
use waker::waker;

pub use config::Config;
pub use handle::Handle;
pub(crate) use globals::{RUNTIME, TASK_ID};

mod config;
pub(crate) mod executor;
mod globals;
mod handle;
mod waker;

/// Returns a handle to the currently running [`Runtime`], if any.
///
/// It is ok to call this function from a spawned task or from a [blocked on](block_on) future.
#[must_use]
pub fn current() -> Option<Runtime> {
    RUNTIME.with(|cell| cell.borrow().clone())
}

/// Run a future to completion on the current thread.
/// This function will block the caller until the given future has completed.
///
/// # Panics
/// Panics if called from the inside of another runtime.
/// Runtimes cannot be nested.
pub fn block_on<F: Future>(f: F) -> F::Output {
    Runtime::new().block_on(f)
}

#[track_caller]
#[inline]
pub(crate) fn current_unwrap(fun: &str) -> Runtime {
    let Some(rt) = current() else {
        panic!("called `{fun}` from the outside of a runtime context.")
    };
    rt
}

/// The local runtime.
#[derive(Clone)]
pub struct Runtime {
    pub(crate) config: Config,
    pub(crate) executor: Rc<Executor>,
    pub(crate) handle: Handle,
}

impl Runtime {
    /// Creates a new runtime with the default configuration values.
    /// For more information on the default configuration, check out the [`Config`]
    /// struct.
    #[must_use]
    pub fn new() -> Runtime {
        Runtime::with_config(Config::default())
    }

    #[must_use]
    pub fn with_config(config: Config) -> Runtime {
        let (sender, receiver) = crossbeam_channel::unbounded();
        let handle = Handle {
            sender,
            thread: thread::current().id(),
        };
        let executor = Rc::new(Executor::new(receiver));
        Runtime {
            config,
            executor,
            handle,
        }
    }

    /// Runs a future to completion on the runtime. This is the
    /// runtime's entry point.
    ///
    /// This runs the given future on the current thread, blocking until it is
    /// complete, and yielding its resolved result. Any tasks which the future
    /// spawns internally will be executed on the runtime, and any callbacks
    /// scheduled through a [`Handle`] run between task polls.
    ///
    /// Any spawned tasks will be suspended after `block_on` returns. Calling
    /// `block_on` again will resume previously spawned tasks.
    ///
    /// # Panics
    ///
    /// This function panics if the blocked on future panics, or if it is called
    /// from the inside of another runtime. Panics on children tasks are caught and
    /// propagated through their [`JoinHandle`].
    ///
    /// # Examples
    ///
    /// ```
    /// use asyncfile::runtime::Runtime;
    /// use asyncfile::task::yield_now;
    ///
    /// // Create the runtime
    /// let rt = Runtime::new();
    ///
    /// // Execute the future, blocking the current thread until completion
    /// rt.block_on(async {
    ///     yield_now().await;
    ///     println!("hello");
    /// });
    /// ```
    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        let msg = "called `block_on` from the inside of another runtime.";
        assert!(current().is_none(), "{}", msg);

        // we enter the runtime context so functions like `spawn` are
        // available.
        let _h = self.enter();
        let Runtime {
            executor,
            config,
            handle,
        } = self;

        let mut future = pin!(future);
        let main_waker = waker(MAIN_TASK, handle);
        let cx = &mut Context::from_waker(&main_waker);

        executor.main_woken.set(true);
        loop {
            if executor.main_woken.replace(false) {
                let _task = TaskGuard::enter(MAIN_TASK);
                if let Poll::Ready(out) = future.as_mut().poll(cx) {
                    return out;
                }
            }
            executor.poll(config.event_interval, handle);
            executor.drain(executor.is_idle());
        }
    }

    /// Enters the runtime context. While the guard is in scope
    /// calls to runtime dependent functions and futures such as
    /// spawn will resolve to the provided runtime.
    #[must_use]
    pub fn enter(&self) -> impl Drop {
        struct Enter(Option<Runtime>);
        impl Drop for Enter {
            fn drop(&mut self) {
                RUNTIME.with(|cell| cell.replace(self.0.take()));
            }
        }
        let new_rt = Some(self.clone());
        let rt = RUNTIME.with(|cell| cell.replace(new_rt));
        Enter(rt)
    }

    /// Spawns a new task onto the runtime returning a [`JoinHandle`] for that task.
    pub fn spawn<F>(&self, future: F) -> JoinHandle<F::Output>
    where
        F: Future + 'static,
        F::Output: 'static,
    {
        JoinHandle::spawn(&self.executor, future)
    }

    /// Returns a thread safe handle to this runtime.
    #[must_use]
    pub fn handle(&self) -> Handle {
        self.handle.clone()
    }

    /// Number of tasks spawned on this runtime that have not completed.
    #[must_use]
    pub fn tasks(&self) -> usize {
        self.executor.len()
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Runtime::new()
    }
}
