use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::pin::Pin;
use std::task::Context;

use crossbeam_channel::Receiver;

use super::globals::TaskGuard;
use super::handle::{Handle, Remote};
use super::waker::waker;

pub(crate) type LocalFuture = Pin<Box<dyn Future<Output = ()>>>;

/// Id reserved for the future passed to `block_on`.
pub(crate) const MAIN_TASK: u64 = 0;

pub(crate) struct Executor {
    // a task is `None` while it is being polled
    tasks: RefCell<HashMap<u64, Option<LocalFuture>>>,
    woken: RefCell<VecDeque<u64>>,
    // determines whether the block_on task has been woken.
    pub(crate) main_woken: Cell<bool>,
    receiver: Receiver<Remote>,
    task_id: Cell<u64>,
}

impl Executor {
    pub fn new(receiver: Receiver<Remote>) -> Executor {
        Executor {
            tasks: RefCell::default(),
            woken: RefCell::default(),
            main_woken: Cell::new(false),
            receiver,
            // we initialize it to one because 0 is reserved for the blocked_on task.
            task_id: Cell::new(MAIN_TASK + 1),
        }
    }

    pub fn spawn(&self, future: LocalFuture) -> u64 {
        let id = self.task_id.get();
        self.task_id.set(id + 1);
        self.tasks.borrow_mut().insert(id, Some(future));
        self.woken.borrow_mut().push_back(id);
        id
    }

    pub fn abort(&self, id: u64) {
        let task = self.tasks.borrow_mut().remove(&id);
        // the future's destructor may spawn or abort other tasks
        drop(task);
    }

    pub fn is_idle(&self) -> bool {
        self.woken.borrow().is_empty() && !self.main_woken.get()
    }

    pub fn len(&self) -> usize {
        self.tasks.borrow().len()
    }

    /// Polls at most `budget` woken tasks.
    pub fn poll(&self, budget: u32, handle: &Handle) {
        for _ in 0..budget {
            let Some(id) = self.woken.borrow_mut().pop_front() else {
                break;
            };
            let task = self.tasks.borrow_mut().get_mut(&id).and_then(Option::take);
            let Some(mut future) = task else {
                // finished, aborted, or woken twice
                continue;
            };
            let waker = waker(id, handle);
            let cx = &mut Context::from_waker(&waker);
            let guard = TaskGuard::enter(id);
            let ready = future.as_mut().poll(cx).is_ready();
            drop(guard);

            if ready {
                self.tasks.borrow_mut().remove(&id);
            } else if let Some(slot) = self.tasks.borrow_mut().get_mut(&id) {
                *slot = Some(future);
                continue;
            }
            // the task completed or aborted itself while being polled
            drop(future);
        }
    }

    /// Handles messages from other threads, waiting for the first one if
    /// `block` is set.
    pub fn drain(&self, block: bool) {
        if block {
            if let Ok(remote) = self.receiver.recv() {
                self.process(remote);
            }
        }
        while let Ok(remote) = self.receiver.try_recv() {
            self.process(remote);
        }
    }

    fn process(&self, remote: Remote) {
        match remote {
            Remote::Wake(MAIN_TASK) => self.main_woken.set(true),
            Remote::Wake(id) => self.woken.borrow_mut().push_back(id),
            Remote::Call(callback) => callback(),
        }
    }
}
