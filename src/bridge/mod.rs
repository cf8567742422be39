//! The bridge between async callers and blocking code.
//!
//! A [`Bridge`] owns a FIFO task queue and one dedicated worker thread. Async
//! code submits a blocking closure together with a handle to its own
//! scheduler; the worker runs the closure and hands the outcome back through
//! that handle, so the awaiting task is resumed on its own thread.
//!
//! ```
//! use asyncfile::bridge::Bridge;
//! use asyncfile::runtime::Runtime;
//!
//! # fn main() -> std::io::Result<()> {
//! let bridge = Bridge::new()?;
//! let rt = Runtime::new();
//! let value = rt.block_on(async {
//!     bridge.submit(|| 6 * 7, rt.handle()).await
//! });
//! assert_eq!(value.unwrap(), 42);
//! # Ok(())}
//! ```
use std::fmt::{self, Debug, Formatter};
use std::io;
use std::sync::{Arc, OnceLock};

use crossbeam_channel::bounded;
use tracing::debug;

use self::job::{Detached, JobState, Submission};
use self::pending::Slot;
use self::queue::{Push, TaskQueue};
use self::worker::WorkerThread;
use crate::schedule::Schedule;

pub use config::BridgeConfig;
pub use done::Done;
pub use pending::Pending;

mod config;
mod done;
mod job;
mod pending;
mod queue;
mod worker;

static GLOBAL: OnceLock<Bridge> = OnceLock::new();

/// Returns the process-wide bridge, spawning its worker on first use.
///
/// # Panics
/// Panics if the worker thread could not be spawned.
pub fn global() -> &'static Bridge {
    global_or_init(BridgeConfig::default)
}

#[track_caller]
pub(crate) fn global_or_init(config: impl FnOnce() -> BridgeConfig) -> &'static Bridge {
    GLOBAL.get_or_init(|| match Bridge::with_config(config()) {
        Ok(bridge) => bridge,
        Err(e) => panic!("failed to spawn the blocking worker thread: {e}"),
    })
}

/// Runs blocking calls on a dedicated worker thread on behalf of async callers.
///
/// Cloning a `Bridge` is cheap and yields a handle to the same queue and
/// worker. The worker exits once [`shutdown`](Bridge::shutdown) is called or
/// the last handle is dropped, after running every job already queued.
#[derive(Clone)]
pub struct Bridge {
    shared: Arc<Shared>,
}

struct Shared {
    queue: Arc<TaskQueue>,
    worker: WorkerThread,
}

impl Drop for Shared {
    fn drop(&mut self) {
        self.queue.close();
    }
}

impl Bridge {
    /// Creates a bridge with the default configuration.
    ///
    /// # Errors
    /// Errors if the worker thread could not be spawned.
    pub fn new() -> io::Result<Bridge> {
        Bridge::with_config(BridgeConfig::default())
    }

    /// Creates a bridge with the given configuration.
    ///
    /// # Errors
    /// Errors if the worker thread could not be spawned.
    pub fn with_config(config: BridgeConfig) -> io::Result<Bridge> {
        let queue = TaskQueue::new(config.queue_capacity);
        let worker = WorkerThread::spawn(queue.clone(), &config)?;
        debug!(
            thread = %config.thread_name,
            capacity = ?config.queue_capacity,
            "bridge started"
        );
        let shared = Arc::new(Shared { queue, worker });
        Ok(Bridge { shared })
    }

    /// Submits a blocking call. The returned [`Pending`] resolves on
    /// `scheduler` once the worker has run `f`.
    ///
    /// Calls are run in submission order. If `f` panics, the panic is caught
    /// on the worker and the `Pending` resolves with
    /// [`Error::Panicked`](crate::Error::Panicked). Errors returned by `f`
    /// are part of its value and pass through untouched.
    ///
    /// If the queue is bounded and full, the call is held by the `Pending`
    /// and queued once the worker makes room; the caller simply stays
    /// suspended for longer. After [`shutdown`](Bridge::shutdown) the
    /// `Pending` resolves immediately with
    /// [`Error::ShutdownInProgress`](crate::Error::ShutdownInProgress).
    pub fn submit<F, T, S>(&self, f: F, scheduler: S) -> Pending<T>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
        S: Schedule,
    {
        let queue = &self.shared.queue;
        let slot = Slot::new();
        let state = JobState::new();
        let work = Submission {
            f,
            slot: slot.clone(),
            scheduler,
        };
        let job = queue.job(state.clone(), Box::new(work));
        let mut pending = Pending::new(slot, state, queue.clone());
        match queue.try_push(job, None) {
            Push::Queued => (),
            Push::Full(job) => pending.hold(job),
            Push::Closed => pending.reject(),
        }
        pending
    }

    /// Runs a call whose result nobody needs. The returned [`Done`] can be
    /// used to wait for completion from any thread.
    ///
    /// Unlike [`submit`](Bridge::submit), this blocks the calling thread
    /// while a bounded queue is full.
    pub fn detach<F>(&self, f: F) -> Done
    where
        F: FnOnce() + Send + 'static,
    {
        let queue = &self.shared.queue;
        let (signal, receiver) = bounded(1);
        let job = queue.job(JobState::new(), Box::new(Detached { f, signal }));
        // a rejected job drops its signal, which `Done` reports as a shutdown
        queue.push_blocking(job).ok();
        Done::new(receiver)
    }

    /// Stops accepting calls and waits for the worker to finish the calls
    /// already queued. Calling it again has no effect.
    ///
    /// When called from inside a blocking call the worker is not joined,
    /// since it is the current thread.
    pub fn shutdown(&self) {
        if !self.shared.queue.is_closed() {
            debug!("bridge shutting down");
        }
        self.shared.queue.close();
        self.shared.worker.join();
    }

    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        self.shared.queue.is_closed()
    }

    /// Number of calls waiting in the queue, not counting the one running.
    #[must_use]
    pub fn queued(&self) -> usize {
        self.shared.queue.len()
    }

    /// Returns whether the current thread is this bridge's worker.
    #[must_use]
    pub fn is_worker_thread(&self) -> bool {
        self.shared.worker.is_current()
    }
}

impl Debug for Bridge {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bridge")
            .field("queued", &self.queued())
            .field("shutdown", &self.is_shutdown())
            .finish()
    }
}
