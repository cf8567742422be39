use std::io;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle, ThreadId};

use core_affinity::CoreId;
use tracing::{debug, error, trace, warn};

use super::config::BridgeConfig;
use super::queue::TaskQueue;

/// The dedicated thread that runs blocking jobs.
pub(crate) struct WorkerThread {
    id: ThreadId,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl WorkerThread {
    pub fn spawn(queue: Arc<TaskQueue>, config: &BridgeConfig) -> io::Result<WorkerThread> {
        let mut builder = thread::Builder::new().name(config.thread_name.clone());
        if let Some(size) = config.stack_size {
            builder = builder.stack_size(size);
        }
        let core = config.core;
        let handle = builder.spawn(move || {
            if let Some(id) = core {
                if !core_affinity::set_for_current(CoreId { id }) {
                    warn!(core = id, "could not pin the worker thread");
                }
            }
            run(&queue);
        })?;
        Ok(WorkerThread {
            id: handle.thread().id(),
            handle: Mutex::new(Some(handle)),
        })
    }

    pub fn is_current(&self) -> bool {
        thread::current().id() == self.id
    }

    /// Waits for the worker to exit. The queue must be closed beforehand,
    /// otherwise this never returns. A no-op when called from the worker itself.
    pub fn join(&self) {
        if self.is_current() {
            return;
        }
        let handle = self.handle.lock().unwrap_or_else(PoisonError::into_inner).take();
        let Some(handle) = handle else {
            return;
        };
        if handle.join().is_err() {
            error!("the blocking worker thread panicked");
        }
    }
}

fn run(queue: &TaskQueue) {
    debug!("blocking worker started");
    while let Some(job) = queue.pop() {
        let id = job.id();
        // callables are already unwound inside the job, this only guards
        // against a panicking scheduler implementation
        match catch_unwind(AssertUnwindSafe(|| job.run())) {
            Ok(true) => trace!(job = id, "job completed"),
            Ok(false) => trace!(job = id, "skipped cancelled job"),
            Err(_) => error!(job = id, "delivering a job outcome panicked"),
        }
    }
    debug!("blocking worker exiting");
}
