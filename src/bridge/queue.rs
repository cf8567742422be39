use std::mem::take;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::task::Waker;

use crossbeam_channel::{bounded, unbounded, Receiver, Sender, TrySendError};

use super::job::{Job, JobState, Work};

/// The outcome of a non-blocking push.
pub(crate) enum Push {
    Queued,
    Full(Job),
    Closed,
}

/// FIFO multi-producer queue drained by the worker thread.
///
/// Closing the queue drops the only long-lived sender, so the worker sees a
/// disconnected channel once every queued job has been handed out.
pub(crate) struct TaskQueue {
    sender: RwLock<Option<Sender<Job>>>,
    receiver: Receiver<Job>,
    // async producers waiting for room in a bounded queue
    producers: Mutex<Vec<Waker>>,
    next_id: AtomicU64,
}

impl TaskQueue {
    pub fn new(capacity: Option<usize>) -> Arc<TaskQueue> {
        let (sender, receiver) = match capacity {
            // a rendezvous channel never holds a job for `pop` to free up,
            // so held producers would never be woken
            Some(capacity) => bounded(capacity.max(1)),
            None => unbounded(),
        };
        Arc::new(TaskQueue {
            sender: RwLock::new(Some(sender)),
            receiver,
            producers: Mutex::default(),
            next_id: AtomicU64::new(0),
        })
    }

    pub fn job(&self, state: Arc<JobState>, work: Box<dyn Work>) -> Job {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        Job::new(id, state, work)
    }

    /// Pushes without blocking. When the queue is full and a waker is given,
    /// the waker is woken as soon as the worker takes a job off the queue.
    pub fn try_push(&self, job: Job, waker: Option<&Waker>) -> Push {
        let guard = self.sender.read().unwrap_or_else(ignore_poison);
        let Some(sender) = &*guard else {
            return Push::Closed;
        };
        let job = match sender.try_send(job) {
            Ok(()) => return Push::Queued,
            Err(TrySendError::Disconnected(_)) => return Push::Closed,
            Err(TrySendError::Full(job)) => job,
        };
        let Some(waker) = waker else {
            return Push::Full(job);
        };
        self.register(waker);
        // the worker may have freed a slot before the waker was registered
        match sender.try_send(job) {
            Ok(()) => Push::Queued,
            Err(TrySendError::Full(job)) => Push::Full(job),
            Err(TrySendError::Disconnected(_)) => Push::Closed,
        }
    }

    /// Pushes the job, blocking the current thread while the queue is full.
    pub fn push_blocking(&self, job: Job) -> Result<(), Job> {
        let sender = {
            let guard = self.sender.read().unwrap_or_else(ignore_poison);
            let Some(sender) = &*guard else {
                return Err(job);
            };
            sender.clone()
        };
        sender.send(job).map_err(|error| error.into_inner())
    }

    /// Blocks until a job is available. Returns `None` once the queue is
    /// closed and drained.
    pub fn pop(&self) -> Option<Job> {
        let job = self.receiver.recv().ok();
        self.wake_producers();
        job
    }

    pub fn close(&self) {
        let sender = self.sender.write().unwrap_or_else(ignore_poison).take();
        drop(sender);
        self.wake_producers();
    }

    pub fn is_closed(&self) -> bool {
        self.sender.read().unwrap_or_else(ignore_poison).is_none()
    }

    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    fn register(&self, waker: &Waker) {
        let mut producers = self.producers.lock().unwrap_or_else(ignore_poison);
        if !producers.iter().any(|w| w.will_wake(waker)) {
            producers.push(waker.clone());
        }
    }

    fn wake_producers(&self) {
        let producers = take(&mut *self.producers.lock().unwrap_or_else(ignore_poison));
        for waker in producers {
            waker.wake();
        }
    }
}

fn ignore_poison<T>(e: PoisonError<T>) -> T {
    e.into_inner()
}
